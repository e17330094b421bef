//! Batch-relative categorical capping: top-K `PU_DO` values plus `"Other"`.
//!
//! The vocabulary is rebuilt from whatever batch is being processed, never
//! persisted. A single-record request always keeps its own `PU_DO` (its
//! singleton batch's top value); bulk scoring and training do remap rare
//! keys to `"Other"`. Changing this changes model semantics, so tests pin
//! both sides.

use std::collections::{HashMap, HashSet};

use crate::ride::FeatureRow;

/// Cardinality bound for `PU_DO` within one batch.
pub const TOP_PUDO_LIMIT: usize = 1000;

/// Sentinel for values outside the batch's top-K set.
pub const OTHER_CATEGORY: &str = "Other";

/// The `limit` most frequent `PU_DO` values of the batch. Ties are broken
/// by first appearance, which keeps the set deterministic across runs.
pub fn top_categories(rows: &[FeatureRow], limit: usize) -> HashSet<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        counts
            .entry(row.pu_do.as_str())
            .and_modify(|(n, _)| *n += 1)
            .or_insert((1, i));
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(value, (n, first))| (value, n, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(value, _, _)| value.to_string())
        .collect()
}

/// Remaps every `PU_DO` outside the batch's top-`limit` set to
/// [`OTHER_CATEGORY`], in place.
pub fn cap_categories(rows: &mut [FeatureRow], limit: usize) {
    let top = top_categories(rows, limit);
    for row in rows.iter_mut() {
        if !top.contains(&row.pu_do) {
            row.pu_do = OTHER_CATEGORY.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pu_do: &str) -> FeatureRow {
        FeatureRow {
            pu_do: pu_do.to_string(),
            trip_miles: 1.0,
            is_weekend: false,
            fare_per_mile: 2.0,
            hour: 12,
            day_of_week: 3,
        }
    }

    #[test]
    fn singleton_batch_keeps_its_own_category() {
        let mut rows = vec![row("77_1")];
        cap_categories(&mut rows, TOP_PUDO_LIMIT);
        assert_eq!(rows[0].pu_do, "77_1");
    }

    #[test]
    fn rare_values_remap_to_other_in_bulk() {
        let mut rows = Vec::new();
        for _ in 0..5 {
            rows.push(row("8_32"));
        }
        for _ in 0..3 {
            rows.push(row("6_8"));
        }
        rows.push(row("76_76"));

        cap_categories(&mut rows, 2);
        assert!(rows[..5].iter().all(|r| r.pu_do == "8_32"));
        assert!(rows[5..8].iter().all(|r| r.pu_do == "6_8"));
        assert_eq!(rows[8].pu_do, OTHER_CATEGORY);
    }

    #[test]
    fn ties_break_by_first_appearance() {
        let mut rows = vec![row("a_b"), row("c_d"), row("a_b"), row("c_d")];
        cap_categories(&mut rows, 1);
        assert_eq!(rows[0].pu_do, "a_b");
        assert_eq!(rows[1].pu_do, OTHER_CATEGORY);
    }

    #[test]
    fn limit_wider_than_batch_is_a_noop() {
        let mut rows = vec![row("x_y"), row("y_z")];
        let before = rows.clone();
        cap_categories(&mut rows, TOP_PUDO_LIMIT);
        assert_eq!(rows, before);
    }
}

//! The feature engine: deterministic transformation from raw rides to
//! feature rows.
//!
//! Training, batch scoring, monitoring, and the online endpoint all call
//! into this module, so any change here changes model semantics everywhere
//! at once.

use chrono::{Datelike, NaiveDateTime, Timelike};
use thiserror::Error;

use crate::ride::{FeatureRow, RawRide};
use crate::vocab::{cap_categories, TOP_PUDO_LIMIT};

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("unparsable trip_start_timestamp: {0:?}")]
    Timestamp(String),
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, FeatureError> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    Err(FeatureError::Timestamp(raw.to_string()))
}

/// Engineers one ride into a feature row.
///
/// Returns `Ok(None)` when the ride fails a validity gate (`trip_miles <= 0`,
/// or any feature ends up missing/NaN/infinite). Dropped rows are never
/// repaired. An unparsable timestamp is an input error, not a feature-quality
/// issue, and propagates.
pub fn engineer(raw: &RawRide) -> Result<Option<FeatureRow>, FeatureError> {
    let ts = parse_timestamp(&raw.trip_start_timestamp)?;
    let hour = ts.hour();
    let day_of_week = ts.weekday().num_days_from_monday();
    let is_weekend = day_of_week >= 5;

    // PU_DO is built before the miles gate.
    let pu_do = format!(
        "{}_{}",
        raw.pickup_community_area.as_deref().unwrap_or("NA"),
        raw.dropoff_community_area.as_deref().unwrap_or("NA"),
    );

    // Hard validity gate: zero or negative distance makes fare_per_mile
    // undefined. NaN miles fails the comparison and is dropped here too.
    if !(raw.trip_miles > 0.0) || !raw.trip_miles.is_finite() {
        return Ok(None);
    }

    // Infinite fare yields an infinite ratio, which is treated as missing.
    // The denominator cannot be zero past the gate above.
    let fare_per_mile = match raw.fare {
        Some(fare) => {
            let fpm = fare / raw.trip_miles;
            fpm.is_finite().then_some(fpm)
        }
        None => None,
    };

    // Drop-on-missing: no partial rows.
    let Some(fare_per_mile) = fare_per_mile else {
        return Ok(None);
    };

    Ok(Some(FeatureRow {
        pu_do,
        trip_miles: raw.trip_miles,
        is_weekend,
        fare_per_mile,
        hour,
        day_of_week,
    }))
}

/// Engineers a batch, keeping the index of the source ride for each
/// surviving row so callers can join predictions back to ride attributes.
///
/// Rows failing validity gates are silently excluded; rides with unparsable
/// timestamps are logged and skipped (a batch tolerates a bad row, the
/// online path does not). Categorical capping runs over the surviving rows,
/// so the top-1000 `PU_DO` set is relative to this batch.
pub fn engineer_batch_indexed(rides: &[RawRide]) -> Vec<(usize, FeatureRow)> {
    let mut kept = Vec::new();
    let mut bad_timestamps = 0usize;
    for (i, ride) in rides.iter().enumerate() {
        match engineer(ride) {
            Ok(Some(row)) => kept.push((i, row)),
            Ok(None) => {}
            Err(err) => {
                bad_timestamps += 1;
                tracing::warn!("skipping ride {i}: {err}");
            }
        }
    }
    if bad_timestamps > 0 {
        tracing::warn!("{bad_timestamps} rides skipped on timestamp parse");
    }

    let mut rows: Vec<FeatureRow> = kept.iter().map(|(_, row)| row.clone()).collect();
    cap_categories(&mut rows, TOP_PUDO_LIMIT);
    kept.iter()
        .map(|(i, _)| *i)
        .zip(rows)
        .collect()
}

/// [`engineer_batch_indexed`] without the source indices.
pub fn engineer_batch(rides: &[RawRide]) -> Vec<FeatureRow> {
    engineer_batch_indexed(rides)
        .into_iter()
        .map(|(_, row)| row)
        .collect()
}

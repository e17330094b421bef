//! Dictionary vectorizer: named features to a fixed-width numeric vector.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ride::FeatureRow;

/// Fitted encoder from feature rows to dense vectors.
///
/// Categorical `PU_DO` values become indicator dimensions named
/// `PU_DO=<value>`; numeric features pass through under their own names.
/// Feature names are sorted lexicographically at fit time, so dimension
/// order is stable for a given training set. At transform time any
/// feature or category unseen during fit is silently ignored and its
/// dimension stays zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SavedVectorizer", into = "SavedVectorizer")]
pub struct Vectorizer {
    feature_names: Vec<String>,
    index: HashMap<String, usize>,
}

/// Persisted form: names only, the index is rebuilt on load.
#[derive(Clone, Serialize, Deserialize)]
struct SavedVectorizer {
    feature_names: Vec<String>,
}

impl From<SavedVectorizer> for Vectorizer {
    fn from(saved: SavedVectorizer) -> Self {
        Vectorizer::from_names(saved.feature_names)
    }
}

impl From<Vectorizer> for SavedVectorizer {
    fn from(v: Vectorizer) -> Self {
        SavedVectorizer {
            feature_names: v.feature_names,
        }
    }
}

impl Vectorizer {
    fn from_names(feature_names: Vec<String>) -> Self {
        let index = feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Vectorizer {
            feature_names,
            index,
        }
    }

    /// Learns the feature space from a set of rows.
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureRow>,
    {
        let mut names = BTreeSet::new();
        for row in rows {
            for (name, _) in row.encoding_pairs() {
                names.insert(name);
            }
        }
        Self::from_names(names.into_iter().collect())
    }

    /// Encodes one row. Deterministic for a fitted vectorizer; never fails.
    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        let mut vector = vec![0.0; self.feature_names.len()];
        for (name, value) in row.encoding_pairs() {
            if let Some(&i) = self.index.get(&name) {
                vector[i] = value;
            }
        }
        vector
    }

    /// Output dimensionality.
    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

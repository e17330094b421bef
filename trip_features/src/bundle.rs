//! Versioned model artifacts: one bundle holds the vectorizer and the model
//! that was trained on its output, under a single identifier. One id, one
//! load call; the pair cannot drift apart.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{round2, LinearModel, ModelKind, PredictError};
use crate::ride::FeatureRow;
use crate::vectorizer::Vectorizer;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read bundle at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bundle at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("bundle {model_id}: encoder width {width} != model weight count {weights}")]
    Mismatch {
        model_id: String,
        width: usize,
        weights: usize,
    },
}

/// A fitted vectorizer and its companion model, addressed by one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model_id: String,
    pub vectorizer: Vectorizer,
    pub model: LinearModel,
}

impl ModelBundle {
    /// Encode, score, round. The full serving-time contract for one row.
    pub fn predict_duration(&self, row: &FeatureRow) -> Result<f64, PredictError> {
        let x = self.vectorizer.transform(row);
        Ok(round2(self.model.predict(&x)?))
    }

    /// Rejects a bundle whose encoder and model disagree on width.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.vectorizer.width() != self.model.width() {
            return Err(ArtifactError::Mismatch {
                model_id: self.model_id.clone(),
                width: self.vectorizer.width(),
                weights: self.model.width(),
            });
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: ModelBundle =
            serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fits a vectorizer over engineered rows, trains the chosen regressor on
/// the encoded matrix, and wraps both under one identifier.
pub fn train_bundle(
    rows: &[FeatureRow],
    targets: &[f64],
    kind: ModelKind,
    model_id: impl Into<String>,
) -> ModelBundle {
    let vectorizer = Vectorizer::fit(rows);
    let xs: Vec<Vec<f64>> = rows.iter().map(|r| vectorizer.transform(r)).collect();
    let model = kind.fit(&xs, targets);
    let bundle = ModelBundle {
        model_id: model_id.into(),
        vectorizer,
        model,
    };
    tracing::info!(
        "trained {} bundle {} on {} rows (width {})",
        kind.name(),
        bundle.model_id,
        rows.len(),
        bundle.vectorizer.width()
    );
    bundle
}

/// Loads bundles by identifier; idempotent and cacheable.
pub trait ArtifactStore {
    fn load_bundle(&self, model_id: &str) -> Result<Arc<ModelBundle>, ArtifactError>;
}

/// Filesystem-backed store: `<root>/<model_id>.json`, cached by id.
///
/// Concurrent first loads may both read the file before one wins the
/// insert; loads are idempotent, so either result is valid.
pub struct FsArtifactStore {
    root: PathBuf,
    cache: Mutex<HashMap<String, Arc<ModelBundle>>>,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsArtifactStore {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn bundle_path(&self, model_id: &str) -> PathBuf {
        self.root.join(format!("{model_id}.json"))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load_bundle(&self, model_id: &str) -> Result<Arc<ModelBundle>, ArtifactError> {
        if let Some(bundle) = self.cache.lock().get(model_id) {
            return Ok(Arc::clone(bundle));
        }
        let bundle = Arc::new(ModelBundle::load(&self.bundle_path(model_id))?);
        self.cache
            .lock()
            .insert(model_id.to_string(), Arc::clone(&bundle));
        Ok(bundle)
    }
}

//! Feature engineering and inference core for taxi trip duration prediction.
//!
//! The same raw-ride-to-feature-vector transformation is executed by the
//! online serving endpoint, the batch scorer, and the training pipeline, so
//! it lives here once. Everything in this crate is synchronous and free of
//! I/O except the artifact (de)serialization in [`bundle`].

pub mod bundle;
pub mod engine;
pub mod model;
pub mod ride;
pub mod vectorizer;
pub mod vocab;

pub use bundle::{train_bundle, ArtifactError, ArtifactStore, FsArtifactStore, ModelBundle};
pub use engine::{engineer, engineer_batch, engineer_batch_indexed, FeatureError};
pub use model::{round2, LinearModel, ModelKind, PredictError};
pub use ride::{FeatureRow, RawRide};
pub use vectorizer::Vectorizer;
pub use vocab::{cap_categories, OTHER_CATEGORY, TOP_PUDO_LIMIT};

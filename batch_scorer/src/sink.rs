use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trip_features::RawRide;

/// One persisted prediction: the original ride attributes plus the score,
/// unique by a generated id.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoredRide {
    pub id: Uuid,
    #[serde(flatten)]
    pub ride: RawRide,
    pub predicted_duration: f64,
    pub created_at: DateTime<Utc>,
}

impl ScoredRide {
    pub fn new(ride: RawRide, predicted_duration: f64) -> Self {
        ScoredRide {
            id: Uuid::new_v4(),
            ride,
            predicted_duration,
            created_at: Utc::now(),
        }
    }
}

/// Appends scored rides somewhere durable. The relational store used in
/// production implements this same seam; the batch job only needs `append`.
pub trait PredictionSink {
    fn append(&mut self, record: &ScoredRide) -> anyhow::Result<()>;
}

/// Newline-delimited JSON file sink.
pub struct JsonlSink {
    out: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output at {}", path.display()))?;
        Ok(JsonlSink {
            out: BufWriter::new(file),
        })
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush().context("failed to flush output")
    }
}

impl PredictionSink for JsonlSink {
    fn append(&mut self, record: &ScoredRide) -> anyhow::Result<()> {
        let line = serde_json::to_string(record).context("failed to serialize scored ride")?;
        writeln!(self.out, "{line}").context("failed to write scored ride")
    }
}

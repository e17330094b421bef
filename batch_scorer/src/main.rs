mod config;
mod sink;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;

use config::ScorerConfig;
use sink::{JsonlSink, PredictionSink, ScoredRide};
use trip_features::{engineer_batch_indexed, ArtifactStore, FsArtifactStore, RawRide};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scorer.json"));
    let cfg = ScorerConfig::load(&cfg_path)?;

    let store = FsArtifactStore::new(&cfg.artifact_root);
    let bundle = store.load_bundle(&cfg.model_id)?;
    tracing::info!(
        "loaded bundle {} (encoder width {})",
        bundle.model_id,
        bundle.vectorizer.width()
    );

    let input = File::open(&cfg.input_path)
        .with_context(|| format!("failed to open input at {}", cfg.input_path.display()))?;
    let mut rides: Vec<RawRide> = Vec::new();
    let mut unreadable = 0usize;
    for (lineno, line) in BufReader::new(input).lines().enumerate() {
        let line = line.context("failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(ride) => rides.push(ride),
            Err(err) => {
                unreadable += 1;
                tracing::warn!("line {}: unreadable record: {err}", lineno + 1);
            }
        }
    }

    // Batch-relative capping happens inside: the top-1000 PU_DO set is
    // computed from this input, matching how the model was trained.
    let rows = engineer_batch_indexed(&rides);

    let mut sink = JsonlSink::create(&cfg.output_path)?;
    for (i, row) in &rows {
        let duration = bundle
            .predict_duration(row)
            .with_context(|| format!("scoring failed for ride {i}"))?;
        sink.append(&ScoredRide::new(rides[*i].clone(), duration))?;
    }
    sink.flush()?;

    tracing::info!(
        "scored {} of {} rides ({} unreadable, {} dropped by feature gates)",
        rows.len(),
        rides.len() + unreadable,
        unreadable,
        rides.len() - rows.len()
    );
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ScorerConfig {
    /// Directory holding `<model_id>.json` bundles.
    pub artifact_root: PathBuf,
    pub model_id: String,
    /// Newline-delimited RawRide JSON records.
    pub input_path: PathBuf,
    /// Newline-delimited scored-ride output, one record per surviving row.
    pub output_path: PathBuf,
}

impl ScorerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scorer.json");
        std::fs::write(
            &path,
            r#"{"artifact_root": "/var/bundles", "model_id": "taxi-v3",
                "input_path": "rides.jsonl", "output_path": "scored.jsonl"}"#,
        )
        .unwrap();

        let cfg = ScorerConfig::load(&path).unwrap();
        assert_eq!(cfg.model_id, "taxi-v3");
        assert_eq!(cfg.artifact_root, PathBuf::from("/var/bundles"));
    }

    #[test]
    fn missing_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scorer.json");
        std::fs::write(&path, r#"{"model_id": "taxi-v3"}"#).unwrap();
        assert!(ScorerConfig::load(&path).is_err());
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use crate::config::SweepConfig;

pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// Written next to the results so a run can be reproduced from its artifacts
/// alone.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    pub generated_at: String,
    pub config: SweepConfig,
    pub combinations: usize,
    pub trials: usize,
    pub absent_trials: usize,
}

/// Allocates a fresh run directory under `output_root`, suffixed on
/// collision so back-to-back runs within one second keep distinct outputs.
pub fn create_timestamped_run_dir(output_root: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(output_root)
        .with_context(|| format!("failed to create output root {}", output_root.display()))?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut run_dir = output_root.join(&timestamp);
    let mut counter = 1_u32;

    while run_dir.exists() {
        run_dir = output_root.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

pub fn write_manifest(run_dir: &Path, manifest: &Manifest) -> anyhow::Result<PathBuf> {
    let path = run_dir.join("manifest.json");
    let payload = serde_json::to_string_pretty(manifest).context("failed to serialize manifest")?;
    fs::write(&path, payload)
        .with_context(|| format!("failed to write manifest {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dirs_do_not_collide() {
        let root = std::env::temp_dir().join(format!("obss-sweep-out-{}", std::process::id()));
        let first = create_timestamped_run_dir(&root).unwrap();
        let second = create_timestamped_run_dir(&root).unwrap();
        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
    }

    #[test]
    fn manifest_is_valid_json() {
        let root = std::env::temp_dir().join(format!("obss-sweep-man-{}", std::process::id()));
        let run_dir = create_timestamped_run_dir(&root).unwrap();
        let manifest = Manifest {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            config: SweepConfig::default(),
            combinations: 4,
            trials: 20,
            absent_trials: 1,
        };
        let path = write_manifest(&run_dir, &manifest).unwrap();
        let raw = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schema_version"], OUTPUT_SCHEMA_VERSION);
        assert_eq!(value["combinations"], 4);
    }
}

//! Engine configuration stored as TOML (for example `stepper.toml`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Engine configuration (TOML).
///
/// Missing fields default to values suitable for a single orchestrator-driven
/// invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest JSON encoding of a step error before the codec falls back to
    /// the raw error string.
    pub max_error_bytes: usize,

    /// Render the error cause chain into the serialized `stack` field.
    pub include_error_stack: bool,

    /// Reject histories with more records than this before replay starts.
    pub max_history_records: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_error_bytes: 16 * 1024,
            include_error_stack: true,
            max_history_records: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_error_bytes == 0 {
            return Err(anyhow!("max_error_bytes must be > 0"));
        }
        if self.max_history_records == 0 {
            return Err(anyhow!("max_history_records must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let cfg = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<EngineConfig>(&contents)
            .with_context(|| format!("parse config {}", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config not found; using defaults");
            EngineConfig::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read config {}", path.display()));
        }
    };
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Write `cfg` as TOML, replacing `path` in a single rename.
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let body = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    let staged = PathBuf::from(staged);
    fs::write(&staged, body).with_context(|| format!("stage config {}", staged.display()))?;
    fs::rename(&staged, path).with_context(|| format!("install config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stepper.toml");
        let cfg = EngineConfig {
            max_error_bytes: 512,
            include_error_stack: false,
            max_history_records: 50,
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stepper.toml");
        fs::write(&path, "max_error_bytes = 128\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_error_bytes, 128);
        assert_eq!(cfg.max_history_records, 10_000);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stepper.toml");
        fs::write(&path, "max_history_records = 0\n").expect("write");

        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("max_history_records"));
    }

    #[test]
    fn write_creates_missing_directories_and_leaves_no_staging_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("conf").join("stepper.toml");

        write_config(&path, &EngineConfig::default()).expect("write");
        assert!(path.exists());
        assert!(!temp.path().join("conf").join("stepper.toml.tmp").exists());
    }

    #[test]
    fn write_refuses_invalid_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stepper.toml");
        let cfg = EngineConfig {
            max_error_bytes: 0,
            ..EngineConfig::default()
        };
        assert!(write_config(&path, &cfg).is_err());
        assert!(!path.exists());
    }
}

//! Quality gate configuration
//!
//! The phase comes from `.quality-config.yaml`; whether the project has a
//! frontend or a backend is inferred from which conventional paths exist.
//! Only existence is checked, never content.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default location of the quality config, relative to the project root
pub const DEFAULT_CONFIG_FILE: &str = ".quality-config.yaml";

/// Any of these existing means the project has a frontend
pub const FRONTEND_PATHS: &[&str] = &["frontend", "src"];

/// Any of these existing means the project has a backend
pub const BACKEND_PATHS: &[&str] = &["backend", "requirements.txt", "pyproject.toml"];

/// Settings that decide which template blocks survive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityConfig {
    /// Quality gate phase, normally 0-3
    pub current_phase: i64,

    pub has_frontend: bool,

    pub has_backend: bool,
}

/// Without a config file: phase 0, backend-only project.
impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            current_phase: 0,
            has_frontend: false,
            has_backend: true,
        }
    }
}

/// On-disk layout of `.quality-config.yaml` (only the fields used here)
#[derive(Debug, Deserialize)]
struct QualityConfigFile {
    /// Absent means default gates; an explicit null means none.
    #[serde(default = "default_gates")]
    quality_gates: Option<QualityGates>,
}

fn default_gates() -> Option<QualityGates> {
    Some(QualityGates::default())
}

#[derive(Debug, Default, Deserialize)]
struct QualityGates {
    #[serde(default)]
    current_phase: i64,
}

/// Errors reading the quality config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path} has no quality_gates settings")]
    NoQualityGates { path: PathBuf },
}

/// Read `quality_gates.current_phase` from YAML text (0 when absent).
///
/// `Ok(None)` when the document is empty or `quality_gates` is null.
pub fn parse_phase(content: &str) -> Result<Option<i64>, serde_yaml::Error> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;
    if document.is_null() {
        return Ok(None);
    }
    let file: QualityConfigFile = serde_yaml::from_value(document)?;
    Ok(file.quality_gates.map(|gates| gates.current_phase))
}

impl QualityConfig {
    /// Resolve the config for the project at `root`.
    ///
    /// Falls back to [`QualityConfig::default`] when `config_path` is missing
    /// or unreadable.
    pub fn load(root: &Path, config_path: &Path) -> Self {
        match Self::try_load(root, config_path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::debug!(path = %config_path.display(), "no quality config, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring quality config, using defaults");
                Self::default()
            }
        }
    }

    /// Like [`QualityConfig::load`], but reports why a present config file
    /// could not be used. `Ok(None)` means there is no config file.
    pub fn try_load(root: &Path, config_path: &Path) -> Result<Option<Self>, ConfigError> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;
        let phase = parse_phase(&content).map_err(|source| ConfigError::InvalidYaml {
            path: config_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| ConfigError::NoQualityGates {
            path: config_path.to_path_buf(),
        })?;

        Ok(Some(Self::probe(root, phase)))
    }

    /// Build a config for `phase`, probing `root` for frontend/backend paths.
    pub fn probe(root: &Path, current_phase: i64) -> Self {
        let any_exists = |paths: &[&str]| paths.iter().any(|p| root.join(p).exists());
        Self {
            current_phase,
            has_frontend: any_exists(FRONTEND_PATHS),
            has_backend: any_exists(BACKEND_PATHS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_phase() {
        assert_eq!(parse_phase("quality_gates:\n  current_phase: 2\n").unwrap(), Some(2));
        assert_eq!(parse_phase("quality_gates:\n  enabled: true\n").unwrap(), Some(0));
        assert_eq!(parse_phase("project: demo\n").unwrap(), Some(0));
        assert!(parse_phase("quality_gates: [unclosed").is_err());
        assert!(parse_phase("- a\n- b\n").is_err());
    }

    #[test]
    fn test_parse_phase_empty_or_null_gates() {
        assert_eq!(parse_phase("").unwrap(), None);
        assert_eq!(parse_phase("# nothing yet\n").unwrap(), None);
        assert_eq!(parse_phase("quality_gates:\n").unwrap(), None);
        assert_eq!(parse_phase("quality_gates: null\n").unwrap(), None);
    }

    #[test]
    fn test_missing_config_uses_defaults_without_probing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("frontend")).unwrap();

        let config = QualityConfig::load(dir.path(), &dir.path().join(DEFAULT_CONFIG_FILE));
        assert_eq!(config, QualityConfig::default());
        assert!(!config.has_frontend);
        assert!(config.has_backend);
    }

    #[test]
    fn test_config_file_triggers_probes() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, "quality_gates:\n  current_phase: 1\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let config = QualityConfig::load(dir.path(), &config_path);
        assert_eq!(config.current_phase, 1);
        assert!(config.has_frontend);
        assert!(!config.has_backend);
    }

    #[test]
    fn test_backend_detected_from_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests\n").unwrap();
        assert!(QualityConfig::probe(dir.path(), 0).has_backend);

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        assert!(QualityConfig::probe(dir.path(), 0).has_backend);
    }

    #[test]
    fn test_empty_config_uses_defaults_without_probing() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::create_dir(dir.path().join("src")).unwrap();

        for content in ["", "quality_gates:\n"] {
            fs::write(&config_path, content).unwrap();
            assert!(matches!(
                QualityConfig::try_load(dir.path(), &config_path),
                Err(ConfigError::NoQualityGates { .. })
            ));
            assert_eq!(
                QualityConfig::load(dir.path(), &config_path),
                QualityConfig::default()
            );
        }
    }

    #[test]
    fn test_invalid_yaml_falls_back() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, "quality_gates: [unclosed").unwrap();

        assert!(QualityConfig::try_load(dir.path(), &config_path).is_err());
        assert_eq!(
            QualityConfig::load(dir.path(), &config_path),
            QualityConfig::default()
        );
    }
}

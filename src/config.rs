//! TOML configuration for the benchmark.
//!
//! There are no command-line flags. Defaults reproduce the reference run
//! (200M elements, 8 workers); a file named by `VECADD_BENCH_CONFIG` may
//! override them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::accel::parallel::DEFAULT_WORKERS;
use crate::accel::BenchError;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "VECADD_BENCH_CONFIG";

pub const DEFAULT_VECTOR_LEN: usize = 200_000_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub bench: BenchSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the active configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// The env var was set but the file failed to load.
    Fallback { path: PathBuf, error: String },
}

impl BenchConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// The file from `VECADD_BENCH_CONFIG` if set and loadable, otherwise
    /// compiled-in defaults. Runs before logging is up, so the outcome is
    /// returned for the caller to log.
    pub fn resolve() -> (Self, ConfigSource) {
        let Some(env_path) = std::env::var_os(CONFIG_ENV) else {
            return (Self::default(), ConfigSource::Defaults);
        };

        let path = PathBuf::from(env_path);
        match Self::load(&path) {
            Ok(cfg) => (cfg, ConfigSource::File(path)),
            Err(e) => (
                Self::default(),
                ConfigSource::Fallback {
                    path,
                    error: format!("{e:#}"),
                },
            ),
        }
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.bench.workers == 0 {
            return Err(BenchError::Config("bench.workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bench
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    /// Elements per vector, identical for every strategy.
    pub vector_len: usize,
    /// Threads in the CPU-parallel pool.
    pub workers: usize,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            vector_len: DEFAULT_VECTOR_LEN,
            workers: DEFAULT_WORKERS,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_reference_run() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.bench.vector_len, 200_000_000);
        assert_eq!(cfg.bench.workers, 8);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: BenchConfig = toml::from_str(
            r#"
[bench]
vector_len = 1024
"#,
        )
        .unwrap();

        assert_eq!(cfg.bench.vector_len, 1024);
        assert_eq!(cfg.bench.workers, 8);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: BenchConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.bench.vector_len, DEFAULT_VECTOR_LEN);
        assert_eq!(cfg.bench.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_json_log_format() {
        let cfg: BenchConfig = toml::from_str(
            r#"
[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_zero_workers_invalid() {
        let cfg: BenchConfig = toml::from_str("[bench]\nworkers = 0\n").unwrap();
        assert!(matches!(cfg.validate(), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vecadd-bench.toml");
        std::fs::write(&path, "[bench]\nvector_len = 2\nworkers = 3\n").unwrap();

        let cfg = BenchConfig::load(&path).unwrap();
        assert_eq!(cfg.bench.vector_len, 2);
        assert_eq!(cfg.bench.workers, 3);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = BenchConfig::load(Path::new("/nonexistent/path/vecadd-bench.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[bench]\nvector_len = \"lots\"\n").unwrap();

        let err = BenchConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }
}

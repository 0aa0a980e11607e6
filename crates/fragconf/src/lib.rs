//! Minimal configuration loading for the fragments service.
//!
//! This crate keeps its dependency list short so that both the core
//! library's callers and the HTTP server can import it cheaply.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fragconf::FragmentsConfig;
//!
//! let config = FragmentsConfig::load().expect("Failed to load config");
//!
//! println!("Data dir: {}", config.paths.data_dir.display());
//! println!("HTTP port: {}", config.bind.http_port);
//! println!("Backend: {}", config.storage.backend);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/fragments/config.toml` (system)
//! 2. `~/.config/fragments/config.toml` (user)
//! 3. `./fragments.toml` (local override, or the path given on the CLI)
//! 4. Environment variables (`FRAGMENTS_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! data_dir = "~/.local/share/fragments"
//!
//! [bind]
//! address = "0.0.0.0"
//! http_port = 8080
//!
//! [telemetry]
//! log_level = "info"
//!
//! [storage]
//! backend = "file"
//! max_body_bytes = 5242880
//! ```

pub mod infra;
pub mod loader;

pub use infra::{BindConfig, PathsConfig, StorageBackend, StorageConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete fragments service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FragmentsConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl FragmentsConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/fragments/config.toml`
    /// 3. `~/.config/fragments/config.toml`
    /// 4. `./fragments.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./fragments.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(config_path: Option<&Path>) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        Self::load_files(files)
    }

    fn load_files(files: Vec<PathBuf>) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let origin = sources
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let mut config = loader::into_config(merged, &origin)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Fragments Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!("data_dir = \"{}\"\n", self.paths.data_dir.display()));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("address = \"{}\"\n", self.bind.address));
        output.push_str(&format!("http_port = {}\n", self.bind.http_port));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[storage]\n");
        output.push_str(&format!("backend = \"{}\"\n", self.storage.backend));
        output.push_str(&format!("read_only = {}\n", self.storage.read_only));
        output.push_str(&format!("max_body_bytes = {}\n", self.storage.max_body_bytes));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = FragmentsConfig::default();
        assert_eq!(config.bind.http_port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_to_toml() {
        let config = FragmentsConfig::default();
        let toml = config.to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[bind]"));
        assert!(toml.contains("[storage]"));
        assert!(toml.contains("backend = \"memory\""));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = FragmentsConfig::default();
        config.paths.data_dir = PathBuf::from("/srv/fragments");
        config.storage.backend = StorageBackend::File;

        let parsed = loader::parse_toml(&config.to_toml(), Path::new("round.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_later_files_win_per_key() {
        let dir = TempDir::new().unwrap();
        let system = dir.path().join("system.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(&system, "[bind]\naddress = \"10.0.0.1\"\nhttp_port = 1111\n").unwrap();
        std::fs::write(&local, "[bind]\nhttp_port = 2222\n").unwrap();

        let (config, sources) =
            FragmentsConfig::load_files(vec![system.clone(), local.clone()]).unwrap();
        assert_eq!(config.bind.address, "10.0.0.1");
        assert_eq!(sources.files, vec![system, local]);
        // FRAGMENTS_HTTP_PORT may be set in the environment running the tests
        if !sources.env_overrides.iter().any(|k| k == "FRAGMENTS_HTTP_PORT") {
            assert_eq!(config.bind.http_port, 2222);
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = FragmentsConfig::load_files(vec![PathBuf::from("/nonexistent/fragments.toml")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_load_defaults() {
        // Load should work even with no config files
        let config = FragmentsConfig::load().unwrap();
        assert!(!config.telemetry.log_level.is_empty());
    }
}

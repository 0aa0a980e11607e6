//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, FragmentsConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/fragments/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("fragments/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("fragments.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file into a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file on top of compiled defaults.
pub fn load_from_file(path: &Path) -> Result<FragmentsConfig, ConfigError> {
    let table = load_table(path)?;
    into_config(table, path)
}

/// Parse config from a TOML string.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<FragmentsConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    into_config(table, path)
}

/// Deserialize a merged table. Missing sections and keys take their defaults.
pub(crate) fn into_config(table: toml::Table, path: &Path) -> Result<FragmentsConfig, ConfigError> {
    let mut config: FragmentsConfig =
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
    config.paths.data_dir = expand_path(&config.paths.data_dir.to_string_lossy());
    Ok(config)
}

/// Merge two tables, with `overlay` taking precedence.
///
/// Nested tables merge key by key, so an overlay that only sets
/// `[bind] http_port` keeps the base's `[bind] address`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut FragmentsConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Overlay values from an arbitrary lookup; `apply_env_overrides` passes
/// the process environment.
pub(crate) fn apply_overrides_from<F>(config: &mut FragmentsConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("FRAGMENTS_DATA_DIR") {
        config.paths.data_dir = expand_path(&v);
        sources.env_overrides.push("FRAGMENTS_DATA_DIR".to_string());
    }

    if let Some(v) = lookup("FRAGMENTS_HTTP_PORT") {
        if let Ok(port) = v.parse() {
            config.bind.http_port = port;
            sources.env_overrides.push("FRAGMENTS_HTTP_PORT".to_string());
        }
    }
    if let Some(v) = lookup("FRAGMENTS_BIND_ADDR") {
        config.bind.address = v;
        sources.env_overrides.push("FRAGMENTS_BIND_ADDR".to_string());
    }

    if let Some(v) = lookup("FRAGMENTS_STORAGE") {
        if let Ok(backend) = v.parse() {
            config.storage.backend = backend;
            sources.env_overrides.push("FRAGMENTS_STORAGE".to_string());
        }
    }
    if let Some(v) = lookup("FRAGMENTS_READ_ONLY") {
        config.storage.read_only = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        sources.env_overrides.push("FRAGMENTS_READ_ONLY".to_string());
    }
    if let Some(v) = lookup("FRAGMENTS_MAX_BODY_BYTES") {
        if let Ok(limit) = v.parse() {
            config.storage.max_body_bytes = limit;
            sources.env_overrides.push("FRAGMENTS_MAX_BODY_BYTES".to_string());
        }
    }

    if let Some(v) = lookup("FRAGMENTS_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("FRAGMENTS_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over everything
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(stripped),
            None => PathBuf::from(path),
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        match stripped.split_once('/') {
            Some((var_name, rest)) => env::var(var_name)
                .map(|value| PathBuf::from(value).join(rest))
                .unwrap_or_else(|_| PathBuf::from(path)),
            None => env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path)),
        }
    } else {
        PathBuf::from(path)
    }
}

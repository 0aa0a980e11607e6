//! Configuration sections - fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Filesystem paths for fragment storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for the file-backed stores.
    /// Metadata lands in `{data_dir}/metadata`, blobs in `{data_dir}/data`.
    /// Default: ~/.local/share/fragments
    #[serde(default = "PathsConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl PathsConfig {
    fn default_data_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/fragments"))
            .unwrap_or_else(|| PathBuf::from(".local/share/fragments"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

/// Network bind address for the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Interface to listen on.
    /// Default: 0.0.0.0
    #[serde(default = "BindConfig::default_address")]
    pub address: String,

    /// HTTP port.
    /// Default: 8080
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_address() -> String {
        "0.0.0.0".to_string()
    }

    fn default_http_port() -> u16 {
        8080
    }

    /// `address:port`, ready for a socket bind.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an
    /// `EnvFilter` expression such as `fragments=debug,info`).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Which key-value backend holds fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-lifetime only.
    #[default]
    Memory,
    /// Files under `paths.data_dir`.
    File,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(format!("unknown storage backend {other:?}, expected memory or file")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::File => "file",
        })
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Default: memory
    #[serde(default)]
    pub backend: StorageBackend,

    /// Reject writes (file backend only).
    #[serde(default)]
    pub read_only: bool,

    /// Largest request body accepted for a fragment, in bytes.
    /// Default: 5 MiB
    #[serde(default = "StorageConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl StorageConfig {
    fn default_max_body_bytes() -> usize {
        5 * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            read_only: false,
            max_body_bytes: Self::default_max_body_bytes(),
        }
    }
}

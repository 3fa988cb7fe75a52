use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "FALCON_CONFIG";
/// Overrides `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";
/// Overrides `server.root_dir`.
pub const ROOT_ENV: &str = "FALCON_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub exec: ExecConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory every request path is resolved against.
    pub root_dir: PathBuf,
    pub backlog: u32,
    /// Upper bound on serving one connection. `None` waits forever.
    pub io_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            root_dir: PathBuf::from("."),
            backlog: 4,
            io_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of the buffer the request head must fit in.
    pub header_buffer_bytes: usize,
    pub max_target_len: usize,
    /// Longest normalized filesystem path, root marker included.
    pub max_path_len: usize,
    /// Chunk size for streamed file bodies in both directions.
    pub chunk_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            header_buffer_bytes: 16 * 1024,
            max_target_len: 511,
            max_path_len: 511,
            chunk_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub shell: PathBuf,
    pub max_command_bytes: usize,
    pub max_output_bytes: usize,
    /// Kill commands running longer than this. `None` never kills.
    pub timeout_secs: Option<u64>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            max_command_bytes: 4096,
            max_output_bytes: 64 * 1024,
            timeout_secs: None,
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {:?}", self.level)))
    }
}

impl Config {
    /// Loads the file named by `FALCON_CONFIG` (or the defaults), applies
    /// environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            self.server.listen_addr = addr;
        }
        if let Some(root) = std::env::var_os(ROOT_ENV) {
            self.server.root_dir = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        self.logging.max_level()?;

        if self.server.backlog == 0 {
            return Err(ConfigError::Invalid("server.backlog must be positive".into()));
        }

        let sizes = [
            ("limits.header_buffer_bytes", self.limits.header_buffer_bytes),
            ("limits.max_target_len", self.limits.max_target_len),
            ("limits.max_path_len", self.limits.max_path_len),
            ("limits.chunk_size", self.limits.chunk_size),
            ("exec.max_command_bytes", self.exec.max_command_bytes),
            ("exec.max_output_bytes", self.exec.max_output_bytes),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be positive")));
        }

        // The bare root marker needs room.
        if self.limits.max_path_len < 2 {
            return Err(ConfigError::Invalid("limits.max_path_len must be at least 2".into()));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "server.listen_addr {:?} is not a socket address",
                self.server.listen_addr
            ))
        })
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.server.io_timeout_secs.map(Duration::from_secs)
    }
}

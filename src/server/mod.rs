//! Process-level serving: the accept loop and what every connection shares.

pub mod listener;
pub mod shutdown;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, LimitsConfig};
use crate::exec::CommandBridge;

pub use shutdown::Shutdown;

/// Read-only state handed to each connection.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub root: PathBuf,
    pub limits: LimitsConfig,
    pub exec: CommandBridge,
    pub io_timeout: Option<Duration>,
    pub shutdown: Shutdown,
}

impl ServiceContext {
    pub fn from_config(cfg: &Config, shutdown: Shutdown) -> Self {
        Self {
            root: cfg.server.root_dir.clone(),
            limits: cfg.limits.clone(),
            exec: CommandBridge::new(&cfg.exec).with_chunk_size(cfg.limits.chunk_size),
            io_timeout: cfg.io_timeout(),
            shutdown,
        }
    }
}

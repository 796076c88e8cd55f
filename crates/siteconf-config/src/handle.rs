//! Shared handle that swaps whole resolved configs.

use crate::{ConfigError, FragmentSource, ResolvedConfig};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the current `ResolvedConfig` for readers that outlive one resolve.
///
/// Readers get an `Arc` snapshot and keep it as long as they like. Reloads
/// run a complete resolve before swapping, so a reader sees either the old
/// config or the new one.
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<ResolvedConfig>>,
}

impl ConfigHandle {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the current config.
    pub fn current(&self) -> Arc<ResolvedConfig> {
        self.current.read().clone()
    }

    /// Resolve `sources` from scratch and swap on success.
    ///
    /// On failure the previous config stays in place and the error is returned.
    pub fn reload(&self, sources: &[FragmentSource]) -> Result<Arc<ResolvedConfig>, ConfigError> {
        match ResolvedConfig::resolve(sources) {
            Ok(config) => Ok(self.replace(config)),
            Err(err) => {
                warn!("config reload failed; keeping previous config: {err}");
                Err(err)
            }
        }
    }

    /// Install an already-resolved config and return it.
    pub fn replace(&self, config: ResolvedConfig) -> Arc<ResolvedConfig> {
        let next = Arc::new(config);
        *self.current.write() = next.clone();
        info!("config swapped (sources={})", next.sources().len());
        next
    }
}

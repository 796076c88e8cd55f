//! Public SDK surface for siteconf.
//!
//! This crate re-exports the resolver and provides a small initialization
//! helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use siteconf_config as config;
pub use siteconf_config::{
    AppHostConfig, ConfigError, ConfigHandle, FragmentSource, ResolveOptions, ResolvedConfig,
    StyleHostConfig, resolve,
};

use log::info;
use std::path::Path;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Discover and resolve the config for a project directory.
///
/// The result is wrapped in a [`ConfigHandle`] so hosts can share snapshots
/// and pick up reloads.
pub fn load_project(cwd: impl AsRef<Path>) -> Result<ConfigHandle, ConfigError> {
    load_project_with(&ResolveOptions::new(cwd))
}

/// [`load_project`] with explicit discovery options.
pub fn load_project_with(options: &ResolveOptions) -> Result<ConfigHandle, ConfigError> {
    let config = ResolvedConfig::discover(options)?;
    if let Some(app) = config.app_host() {
        info!(
            "project config ready (modules={}, ssr={})",
            app.modules.len(),
            app.ssr
        );
    }
    Ok(ConfigHandle::new(config))
}

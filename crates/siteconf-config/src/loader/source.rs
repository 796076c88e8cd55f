//! Fragment sources and bounded reads.

use super::{DEFAULT_CONFIG_FILE, USER_CONFIG_DIR, USER_CONFIG_FILE};
use crate::{ConfigError, ConfigFragment};
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Defaults compiled into the crate.
const BUILTIN_DEFAULTS: &str = include_str!("../../defaults/site.json5");

/// Role a source plays in the resolve order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Mandatory base fragment.
    Default,
    /// Optional override for a named environment.
    Environment { name: String },
    /// Optional user-supplied override.
    User,
}

/// Where a source's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// The defaults compiled into this crate.
    Builtin,
    /// Text supplied in memory.
    Inline { label: String, contents: String },
    File(PathBuf),
}

/// Designator for one configuration fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSource {
    pub kind: SourceKind,
    pub location: SourceLocation,
}

impl FragmentSource {
    /// The builtin defaults, as the mandatory base.
    pub fn builtin_defaults() -> Self {
        Self {
            kind: SourceKind::Default,
            location: SourceLocation::Builtin,
        }
    }

    /// A project entry file, as the mandatory base.
    pub fn defaults_file(path: impl AsRef<Path>) -> Self {
        Self {
            kind: SourceKind::Default,
            location: SourceLocation::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn environment(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            kind: SourceKind::Environment { name: name.into() },
            location: SourceLocation::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn user_file(path: impl AsRef<Path>) -> Self {
        Self {
            kind: SourceKind::User,
            location: SourceLocation::File(path.as_ref().to_path_buf()),
        }
    }

    /// In-memory JSON5 text for any kind of source.
    pub fn inline(kind: SourceKind, label: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            kind,
            location: SourceLocation::Inline {
                label: label.into(),
                contents: contents.into(),
            },
        }
    }

    /// Optional sources are skipped when unavailable.
    pub fn is_optional(&self) -> bool {
        !matches!(self.kind, SourceKind::Default)
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            SourceLocation::File(path) => Some(path),
            _ => None,
        }
    }

    /// Label used in logs and error messages.
    pub fn label(&self) -> String {
        let kind = match &self.kind {
            SourceKind::Default => "default".to_string(),
            SourceKind::Environment { name } => format!("environment:{name}"),
            SourceKind::User => "user".to_string(),
        };
        let location = match &self.location {
            SourceLocation::Builtin => "builtin".to_string(),
            SourceLocation::Inline { label, .. } => format!("inline:{label}"),
            SourceLocation::File(path) => path.display().to_string(),
        };
        format!("{kind}({location})")
    }
}

/// Read and parse one source into a fragment.
///
/// Missing or unreadable sources fail with `SourceUnavailable`, which the
/// resolver may recover from for optional sources. Parse failures, text that
/// is not UTF-8, and timeouts are always fatal.
pub fn load(source: &FragmentSource, timeout: Duration) -> Result<ConfigFragment, ConfigError> {
    let origin = source.label();
    debug!("loading config fragment (source={origin})");
    let contents = match &source.location {
        SourceLocation::Builtin => BUILTIN_DEFAULTS.to_string(),
        SourceLocation::Inline { contents, .. } => contents.clone(),
        SourceLocation::File(path) => {
            if !path.exists() {
                return Err(ConfigError::SourceUnavailable {
                    origin,
                    reason: "file not found".to_string(),
                });
            }
            read_with_timeout(path, timeout, &origin)?
        }
    };
    parse_fragment(&contents, &origin)
}

/// Parse JSON5 text into a fragment.
pub(super) fn parse_fragment(contents: &str, origin: &str) -> Result<ConfigFragment, ConfigError> {
    let value: Value = json5::from_str(contents).map_err(|error| ConfigError::ParseFailed {
        origin: origin.to_string(),
        error,
    })?;
    ConfigFragment::from_value(value, origin)
}

/// Read a file on a helper thread, giving up after `timeout`.
///
/// A blocking read cannot be cancelled, so after a timeout the helper thread
/// stays parked in the OS call until it returns; its result is then dropped
/// because the receiver is gone.
fn read_with_timeout(path: &Path, timeout: Duration, origin: &str) -> Result<String, ConfigError> {
    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();
    thread::Builder::new()
        .name("siteconf-read".to_string())
        .spawn(move || {
            let _ = tx.send(fs::read_to_string(owned));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(contents)) => Ok(contents),
        Ok(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
            Err(ConfigError::InvalidEncoding {
                origin: origin.to_string(),
                error: err,
            })
        }
        Ok(Err(err)) => Err(ConfigError::SourceUnavailable {
            origin: origin.to_string(),
            reason: err.to_string(),
        }),
        Err(RecvTimeoutError::Timeout) => Err(ConfigError::SourceTimeout {
            origin: origin.to_string(),
            timeout,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ConfigError::SourceUnavailable {
            origin: origin.to_string(),
            reason: "reader exited without a result".to_string(),
        }),
    }
}

/// Project entry file inside `dir`.
pub(super) fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_FILE)
}

/// Environment override next to the entry file, e.g. `site.config.production.json5`.
pub(super) fn environment_config_path(dir: &Path, name: &str) -> PathBuf {
    let stem = DEFAULT_CONFIG_FILE
        .strip_suffix(".json5")
        .unwrap_or(DEFAULT_CONFIG_FILE);
    dir.join(format!("{stem}.{name}.json5"))
}

/// Default user override path under the home directory.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(USER_CONFIG_DIR).join(USER_CONFIG_FILE))
}

//! Layered configuration resolver.
//!
//! Loads ordered fragment sources (defaults, environment override, user
//! overrides), merges them, validates the result against the option schema,
//! and freezes it into a `ResolvedConfig`.

mod merger;
mod source;
mod utils;
mod validator;


pub use merger::merge;
pub use source::{FragmentSource, SourceKind, SourceLocation, load};
pub use validator::validate;
use validator::expand_option_paths;

use crate::{ConfigError, LoadedSource, OptionSchema, ResolvedConfig};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project entry file name.
const DEFAULT_CONFIG_FILE: &str = "site.config.json5";
/// Per-user config directory under the home directory.
const USER_CONFIG_DIR: &str = ".siteconf";
/// Per-user override file name.
const USER_CONFIG_FILE: &str = "site.json5";
/// Environment variable naming the active environment override.
pub const ENVIRONMENT_VAR: &str = "SITECONF_ENV";
/// Upper bound on a single fragment read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Options controlling source discovery and reads.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory where discovery starts; ancestors are searched for the entry file.
    pub cwd: PathBuf,
    /// Environment whose override file is layered over the defaults.
    pub environment: Option<String>,
    /// Fall back to `SITECONF_ENV` during discovery when `environment` is unset.
    pub read_environment_var: bool,
    /// Per-user override (defaults to `~/.siteconf/site.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Extra user overrides applied last, in order.
    pub user_paths: Vec<PathBuf>,
    pub read_timeout: Duration,
}

impl ResolveOptions {
    /// Options with default locations for the provided cwd.
    ///
    /// Nothing is read from the process environment here; `SITECONF_ENV` is
    /// consulted by [`ResolveOptions::sources`] unless disabled.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            environment: None,
            read_environment_var: true,
            user_config_path: source::default_user_config_path(),
            user_paths: Vec::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    /// Only use sources named explicitly on these options.
    pub fn isolated(mut self) -> Self {
        self.environment = None;
        self.read_environment_var = false;
        self.user_config_path = None;
        self
    }

    /// Add a user override applied after every other source.
    pub fn with_user_path(mut self, path: impl AsRef<Path>) -> Self {
        self.user_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Conventional source list, lowest precedence first.
    ///
    /// The entry file found nearest to `cwd` is the default source; without
    /// one the builtin defaults are used. Environment and user overrides sit
    /// next to it and are optional.
    pub fn sources(&self) -> Result<Vec<FragmentSource>, ConfigError> {
        let cwd = utils::normalize_path(&self.cwd)?;
        let project_root = utils::find_project_root(&cwd, &[DEFAULT_CONFIG_FILE]);

        let mut sources = Vec::new();
        match project_root.as_deref() {
            Some(root) => {
                debug!("resolved project root: {}", root.display());
                sources.push(FragmentSource::defaults_file(source::default_config_path(
                    root,
                )));
            }
            None => {
                debug!("no {DEFAULT_CONFIG_FILE} found; using builtin defaults");
                sources.push(FragmentSource::builtin_defaults());
            }
        }

        if let Some(name) = self.environment_name()? {
            let dir = project_root.as_deref().unwrap_or(&cwd);
            let path = source::environment_config_path(dir, &name);
            sources.push(FragmentSource::environment(name, path));
        }
        if let Some(path) = &self.user_config_path {
            sources.push(FragmentSource::user_file(path));
        }
        sources.extend(self.user_paths.iter().map(FragmentSource::user_file));
        Ok(sources)
    }

    /// Explicit environment first, then `SITECONF_ENV` when allowed.
    fn environment_name(&self) -> Result<Option<String>, ConfigError> {
        let name = match &self.environment {
            Some(name) => Some(name.clone()),
            None if self.read_environment_var => env::var(ENVIRONMENT_VAR)
                .ok()
                .filter(|name| !name.trim().is_empty()),
            None => None,
        };
        match name {
            Some(name) if !is_valid_environment_name(&name) => Err(ConfigError::Invalid(format!(
                "environment name {name:?} must be a single file name segment"
            ))),
            other => Ok(other),
        }
    }
}

/// Environment names end up in a file name next to the entry file.
fn is_valid_environment_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

impl ResolvedConfig {
    /// Resolve an explicit source list against the builtin schema.
    pub fn resolve(sources: &[FragmentSource]) -> Result<Self, ConfigError> {
        resolve_with(sources, OptionSchema::builtin(), DEFAULT_READ_TIMEOUT)
    }

    /// Discover the conventional sources for `options` and resolve them.
    pub fn discover(options: &ResolveOptions) -> Result<Self, ConfigError> {
        info!("discovering config (cwd={})", options.cwd.display());
        let sources = options.sources()?;
        resolve_with(&sources, OptionSchema::builtin(), options.read_timeout)
    }

    /// Resolve a single JSON5 document used as the default source.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        Self::resolve(&[FragmentSource::inline(
            SourceKind::Default,
            "str",
            contents,
        )])
    }
}

/// Resolve `sources` in order: load, merge, validate, freeze.
///
/// The first source must be the mandatory default. Unavailable optional
/// sources are skipped and recorded; every other failure aborts.
pub fn resolve(sources: &[FragmentSource]) -> Result<ResolvedConfig, ConfigError> {
    ResolvedConfig::resolve(sources)
}

/// [`resolve`] with an explicit schema and read timeout.
pub fn resolve_with(
    sources: &[FragmentSource],
    schema: &OptionSchema,
    timeout: Duration,
) -> Result<ResolvedConfig, ConfigError> {
    match sources.first() {
        Some(first) if first.kind == SourceKind::Default => {}
        Some(first) => {
            return Err(ConfigError::Invalid(format!(
                "first config source must be the default fragment, found {}",
                first.label()
            )));
        }
        None => {
            return Err(ConfigError::Invalid(
                "no config sources provided".to_string(),
            ));
        }
    }

    let mut provenance = Vec::with_capacity(sources.len());
    let mut fragments = Vec::with_capacity(sources.len());
    let mut seen_paths = HashSet::new();

    for source in sources {
        let label = source.label();
        if let Some(path) = source.path() {
            if !seen_paths.insert(utils::unique_path(path)) {
                debug!("skipping duplicate source (source={label})");
                provenance.push(loaded_source(source, label, Some("duplicate path")));
                continue;
            }
        }
        match load(source, timeout) {
            Ok(fragment) => {
                debug!("loaded source (source={label})");
                provenance.push(loaded_source(source, label, None));
                fragments.push(expand_option_paths(fragment, schema));
            }
            Err(ConfigError::SourceUnavailable { origin, reason }) if source.is_optional() => {
                warn!("skipping optional source (source={origin}, reason={reason})");
                provenance.push(loaded_source(source, label, Some(&reason)));
            }
            Err(err) => return Err(err),
        }
    }

    let merged = merge(fragments);
    let resolved = validate(&merged, schema)?.with_sources(provenance);
    info!(
        "config resolved (sources={}, loaded={})",
        resolved.sources().len(),
        resolved
            .sources()
            .iter()
            .filter(|source| source.was_loaded())
            .count()
    );
    Ok(resolved)
}

fn loaded_source(source: &FragmentSource, label: String, skipped: Option<&str>) -> LoadedSource {
    LoadedSource {
        kind: source.kind.clone(),
        label,
        path: source.path().map(Path::to_path_buf),
        skipped_reason: skipped.map(str::to_string),
    }
}

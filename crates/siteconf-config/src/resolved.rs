//! The frozen, validated configuration handed to hosts.

use crate::fragment::lookup;
use crate::{
    AppHostConfig, ConfigError, ConfigFragment, OptionSchema, SourceKind, StyleHostConfig,
};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Provenance for one source considered during resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub kind: SourceKind,
    /// Display label, e.g. `environment:production(/srv/site.config.production.json5)`.
    pub label: String,
    pub path: Option<PathBuf>,
    /// Why the source was skipped; `None` when it was merged.
    pub skipped_reason: Option<String>,
}

impl LoadedSource {
    pub fn was_loaded(&self) -> bool {
        self.skipped_reason.is_none()
    }
}

/// Merged, schema-validated configuration. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    values: Map<String, Value>,
    /// Typed views; only decoded for configs validated against the builtin schema.
    hosts: Option<HostViews>,
    sources: Vec<LoadedSource>,
}

#[derive(Debug, Clone, PartialEq)]
struct HostViews {
    app: AppHostConfig,
    style: StyleHostConfig,
}

impl ResolvedConfig {
    /// Freeze validated values.
    ///
    /// Host views are decoded up front when `schema` is the builtin table.
    /// Configs validated against a caller-built schema carry raw values only.
    pub(crate) fn freeze(
        values: Map<String, Value>,
        schema: &OptionSchema,
    ) -> Result<Self, ConfigError> {
        let hosts = if schema.is_builtin() {
            Some(HostViews {
                app: AppHostConfig::from_values(&values)?,
                style: StyleHostConfig::from_values(&values)?,
            })
        } else {
            None
        };
        Ok(Self {
            values,
            hosts,
            sources: Vec::new(),
        })
    }

    pub(crate) fn with_sources(mut self, sources: Vec<LoadedSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Value at a dot-delimited option path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.values, path)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Application host view; `None` for configs built from a custom schema.
    pub fn app_host(&self) -> Option<&AppHostConfig> {
        self.hosts.as_ref().map(|hosts| &hosts.app)
    }

    /// Style host view; `None` for configs built from a custom schema.
    pub fn style_host(&self) -> Option<&StyleHostConfig> {
        self.hosts.as_ref().map(|hosts| &hosts.style)
    }

    /// Every source considered, in resolve order.
    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    /// Always fails: a resolved config cannot change in place.
    ///
    /// Copy the values out with [`ResolvedConfig::to_fragment`] and resolve
    /// again to produce a new config.
    pub fn set(&self, path: &str, _value: impl Into<Value>) -> Result<(), ConfigError> {
        Err(ConfigError::ImmutableConfig {
            path: path.to_string(),
        })
    }

    pub fn to_fragment(&self) -> ConfigFragment {
        ConfigFragment::from_map(self.values.clone())
    }

    /// Sorted-key JSON text; identical inputs give identical bytes.
    pub fn to_canonical_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&canonicalize(&self.values))?)
    }
}

fn canonicalize(values: &Map<String, Value>) -> Value {
    let mut entries: Vec<(&String, &Value)> = values.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut sorted = Map::new();
    for (key, value) in entries {
        let value = match value {
            Value::Object(inner) => canonicalize(inner),
            other => other.clone(),
        };
        sorted.insert(key.clone(), value);
    }
    Value::Object(sorted)
}

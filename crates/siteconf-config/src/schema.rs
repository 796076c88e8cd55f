//! Option schema for application and style hosts.
//!
//! The builtin table is built once per process and never mutated. Section
//! paths (`theme`, `theme.extend`, ...) are derived from descriptor paths.

use crate::{ConfigError, ConfigFragment};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

/// Shape an option's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    String,
    /// Ordered sequence of strings.
    StringList,
    /// Name to string, e.g. shadow tokens.
    StringMap,
    /// Name to ordered list of font families.
    FontStackMap,
    /// Route pattern to route rule.
    RouteRuleMap,
}

impl OptionType {
    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            OptionType::Bool => "bool",
            OptionType::String => "string",
            OptionType::StringList => "list of strings",
            OptionType::StringMap => "table of strings",
            OptionType::FontStackMap => "table of font stacks",
            OptionType::RouteRuleMap => "table of route rules",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// External host that consumes an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Application,
    Style,
}

/// Schema metadata for one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    pub path: String,
    pub expected_type: OptionType,
    pub allowed_values: Option<Vec<String>>,
    /// Inserted when no fragment sets the option. `None` marks the option optional.
    pub default_value: Option<Value>,
    pub host: HostKind,
}

impl OptionDescriptor {
    pub fn new(path: impl Into<String>, expected_type: OptionType, host: HostKind) -> Self {
        Self {
            path: path.into(),
            expected_type,
            allowed_values: None,
            default_value: None,
            host,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Required options always appear in a resolved config.
    pub fn is_required(&self) -> bool {
        self.default_value.is_some()
    }
}

/// Registry of every recognized option path.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSchema {
    descriptors: BTreeMap<String, OptionDescriptor>,
    sections: BTreeSet<String>,
    /// Set only on the process-wide table; host views decode against it.
    builtin: bool,
}

impl OptionSchema {
    /// Build a schema from descriptors; later duplicates replace earlier ones.
    pub fn new(descriptors: impl IntoIterator<Item = OptionDescriptor>) -> Self {
        let descriptors: BTreeMap<String, OptionDescriptor> = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.path.clone(), descriptor))
            .collect();
        let mut sections = BTreeSet::new();
        for path in descriptors.keys() {
            let mut prefix = path.as_str();
            while let Some((parent, _)) = prefix.rsplit_once('.') {
                sections.insert(parent.to_string());
                prefix = parent;
            }
        }
        Self {
            descriptors,
            sections,
            builtin: false,
        }
    }

    /// The builtin schema shared by the whole process.
    pub fn builtin() -> &'static OptionSchema {
        static BUILTIN: OnceLock<OptionSchema> = OnceLock::new();
        BUILTIN.get_or_init(|| OptionSchema {
            builtin: true,
            ..OptionSchema::new(builtin_descriptors())
        })
    }

    /// Whether this is the builtin table the typed host views are written for.
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Look up the descriptor for an option path.
    pub fn describe(&self, path: &str) -> Result<&OptionDescriptor, ConfigError> {
        self.descriptors
            .get(path)
            .ok_or_else(|| ConfigError::SchemaLookup {
                path: path.to_string(),
            })
    }

    /// Whether `path` is a table that only groups other options.
    pub fn is_section(&self, path: &str) -> bool {
        self.sections.contains(path)
    }

    /// All descriptors in path order.
    pub fn descriptors(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.descriptors.values()
    }

    pub fn required(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.descriptors().filter(|descriptor| descriptor.is_required())
    }

    /// Descriptors consumed by one host.
    pub fn for_host(&self, host: HostKind) -> impl Iterator<Item = &OptionDescriptor> {
        self.descriptors()
            .filter(move |descriptor| descriptor.host == host)
    }

    /// Fragment holding every required option at its default.
    pub fn defaults(&self) -> ConfigFragment {
        let mut fragment = ConfigFragment::new();
        for descriptor in self.required() {
            if let Some(value) = &descriptor.default_value {
                fragment.insert(&descriptor.path, value.clone());
            }
        }
        fragment
    }
}

fn builtin_descriptors() -> Vec<OptionDescriptor> {
    use HostKind::{Application, Style};
    vec![
        OptionDescriptor::new("ssr", OptionType::Bool, Application).with_default(true),
        OptionDescriptor::new("modules", OptionType::StringList, Application)
            .with_default(json!([])),
        OptionDescriptor::new("css", OptionType::StringList, Application).with_default(json!([])),
        OptionDescriptor::new("routeRules", OptionType::RouteRuleMap, Application)
            .with_default(json!({})),
        OptionDescriptor::new("tailwindcss.viewer", OptionType::Bool, Application)
            .with_default(true),
        OptionDescriptor::new("tailwindcss.cssPath", OptionType::String, Application),
        OptionDescriptor::new("typescript.typeCheck", OptionType::Bool, Application)
            .with_default(false),
        OptionDescriptor::new("typescript.strict", OptionType::Bool, Application)
            .with_default(true),
        // Icon sets feed the icon-resolution collaborator of the style host.
        OptionDescriptor::new("ui.icons", OptionType::StringList, Style)
            .with_default(json!(["heroicons"])),
        OptionDescriptor::new("darkMode", OptionType::String, Style)
            .with_default("media")
            .with_allowed(["media", "class", "selector"]),
        OptionDescriptor::new("content", OptionType::StringList, Style),
        OptionDescriptor::new("theme.extend.fontFamily", OptionType::FontStackMap, Style)
            .with_default(json!({})),
        OptionDescriptor::new("theme.extend.boxShadow", OptionType::StringMap, Style)
            .with_default(json!({})),
        OptionDescriptor::new("theme.extend.colors", OptionType::StringMap, Style),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn describes_known_options() {
        let schema = OptionSchema::builtin();
        let descriptor = schema.describe("typescript.typeCheck").expect("descriptor");
        assert_eq!(descriptor.expected_type, OptionType::Bool);
        assert_eq!(descriptor.default_value, Some(Value::Bool(false)));
        assert_eq!(descriptor.host, HostKind::Application);
    }

    #[test]
    fn unknown_path_is_a_lookup_error() {
        let err = OptionSchema::builtin()
            .describe("notARealOption")
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaLookup { path } if path == "notARealOption"));
    }

    #[test]
    fn sections_are_derived_from_paths() {
        let schema = OptionSchema::builtin();
        assert!(schema.is_section("theme"));
        assert!(schema.is_section("theme.extend"));
        assert!(schema.is_section("typescript"));
        assert!(!schema.is_section("ssr"));
        assert!(!schema.is_section("theme.extend.boxShadow"));
    }

    #[test]
    fn defaults_cover_only_required_options() {
        let defaults = OptionSchema::builtin().defaults();
        assert_eq!(defaults.get("darkMode"), Some(&json!("media")));
        assert_eq!(defaults.get("ui.icons"), Some(&json!(["heroicons"])));
        assert!(!defaults.contains("content"));
        assert!(!defaults.contains("tailwindcss.cssPath"));
    }

    #[test]
    fn only_the_process_table_is_builtin() {
        assert!(OptionSchema::builtin().is_builtin());
        let copy = OptionSchema::new(OptionSchema::builtin().descriptors().cloned());
        assert!(!copy.is_builtin());
    }

    #[test]
    fn hosts_partition_the_builtin_table() {
        let schema = OptionSchema::builtin();
        let app = schema.for_host(HostKind::Application).count();
        let style = schema.for_host(HostKind::Style).count();
        assert_eq!(app + style, schema.descriptors().count());
        assert!(
            schema
                .for_host(HostKind::Style)
                .any(|descriptor| descriptor.path == "ui.icons")
        );
    }
}

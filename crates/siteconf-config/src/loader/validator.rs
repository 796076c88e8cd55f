//! Schema validation for merged fragments.
//!
//! Walks the whole fragment and collects every problem before failing, so one
//! run reports everything that needs fixing.

use super::merger::merge_values;
use crate::fragment::value_kind;
use crate::model::compile_route_pattern;
use crate::{
    ConfigError, ConfigFragment, OptionDescriptor, OptionSchema, OptionType, ResolvedConfig,
    ValidationError, ValidationReport,
};
use log::debug;
use serde_json::{Map, Value};

/// Fields recognized inside one route rule.
const ROUTE_RULE_FIELDS: &[&str] = &["prerender", "ssr", "redirect", "headers"];

/// Validate a merged fragment, fill defaults, and freeze it.
pub fn validate(
    fragment: &ConfigFragment,
    schema: &OptionSchema,
) -> Result<ResolvedConfig, ConfigError> {
    let fragment = expand_option_paths(fragment.clone(), schema);
    let mut validator = Validator {
        schema,
        errors: Vec::new(),
    };
    validator.check_table(fragment.as_map(), "");
    if !validator.errors.is_empty() {
        return Err(ConfigError::Validation(ValidationReport::new(
            validator.errors,
        )));
    }

    let mut complete = fragment;
    for descriptor in schema.required() {
        if complete.contains(&descriptor.path) {
            continue;
        }
        if let Some(default) = &descriptor.default_value {
            debug!("applying default for `{}`", descriptor.path);
            complete.insert(&descriptor.path, default.clone());
        }
    }
    ResolvedConfig::freeze(complete.into_map(), schema)
}

/// Rewrite dotted option keys (`"typescript.typeCheck": true`) as nested tables.
///
/// Splitting stops at the first segment that is not a section, so entries of
/// free-form tables such as route patterns keep their dots. Whatever remains
/// is kept as one key and reported by the validator if unknown.
pub(super) fn expand_option_paths(
    fragment: ConfigFragment,
    schema: &OptionSchema,
) -> ConfigFragment {
    ConfigFragment::from_map(expand_table(fragment.into_map(), "", schema))
}

fn expand_table(
    map: Map<String, Value>,
    prefix: &str,
    schema: &OptionSchema,
) -> Map<String, Value> {
    let mut expanded = Map::new();
    for (key, value) in map {
        let mut path = prefix.to_string();
        let mut segments = Vec::new();
        let mut rest = key.as_str();
        while let Some((head, tail)) = rest.split_once('.') {
            let candidate = join_path(&path, head);
            if !schema.is_section(&candidate) {
                break;
            }
            segments.push(head.to_string());
            path = candidate;
            rest = tail;
        }
        segments.push(rest.to_string());
        path = join_path(&path, rest);

        let value = match value {
            Value::Object(inner) if schema.is_section(&path) => {
                Value::Object(expand_table(inner, &path, schema))
            }
            other => other,
        };
        insert_nested(&mut expanded, &segments, value);
    }
    expanded
}

/// Place `value` under `segments`, deep-merging with what is already there.
fn insert_nested(map: &mut Map<String, Value>, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(inner) = slot else {
            return;
        };
        current = inner;
    }
    match current.get_mut(leaf) {
        Some(existing) => merge_values(existing, value),
        None => {
            current.insert(leaf.clone(), value);
        }
    }
}

struct Validator<'a> {
    schema: &'a OptionSchema,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn check_table(&mut self, map: &Map<String, Value>, prefix: &str) {
        let schema = self.schema;
        for (key, value) in map {
            let path = join_path(prefix, key);
            match schema.describe(&path) {
                Ok(descriptor) => self.check_option(descriptor, value),
                Err(_) if schema.is_section(&path) => match value {
                    Value::Object(inner) => self.check_table(inner, &path),
                    other => self.mismatch(&path, "table", other),
                },
                Err(_) => self.errors.push(ValidationError::UnknownOption { key: path }),
            }
        }
    }

    fn check_option(&mut self, descriptor: &OptionDescriptor, value: &Value) {
        let path = descriptor.path.as_str();
        match descriptor.expected_type {
            OptionType::Bool => {
                if !value.is_boolean() {
                    self.mismatch(path, OptionType::Bool.describe(), value);
                }
            }
            OptionType::String => match value.as_str() {
                Some(text) => self.check_allowed(descriptor, path, text),
                None => self.mismatch(path, OptionType::String.describe(), value),
            },
            OptionType::StringList => {
                let Some(items) = self.expect_string_list(path, value) else {
                    return;
                };
                for (idx, item) in items.iter().enumerate() {
                    self.check_allowed(descriptor, &format!("{path}[{idx}]"), item);
                }
            }
            OptionType::StringMap => {
                let Some(map) = self.expect_table(path, value, OptionType::StringMap) else {
                    return;
                };
                for (name, entry) in map {
                    if !entry.is_string() {
                        self.mismatch(&entry_path(path, name), "string", entry);
                    }
                }
            }
            OptionType::FontStackMap => {
                let Some(map) = self.expect_table(path, value, OptionType::FontStackMap) else {
                    return;
                };
                for (name, entry) in map {
                    self.expect_string_list(&entry_path(path, name), entry);
                }
            }
            OptionType::RouteRuleMap => {
                let Some(map) = self.expect_table(path, value, OptionType::RouteRuleMap) else {
                    return;
                };
                for (pattern, rule) in map {
                    self.check_route_rule(path, pattern, rule);
                }
            }
        }
    }

    fn check_route_rule(&mut self, path: &str, pattern: &str, rule: &Value) {
        let rule_path = entry_path(path, pattern);
        if let Err(reason) = compile_route_pattern(pattern) {
            self.errors.push(ValidationError::InvalidPattern {
                key: rule_path.clone(),
                pattern: pattern.to_string(),
                reason,
            });
        }
        let Some(fields) = self.expect_table(&rule_path, rule, "route rule") else {
            return;
        };
        for (field, value) in fields {
            let field_path = join_path(&rule_path, field);
            match field.as_str() {
                "prerender" | "ssr" if !value.is_boolean() => {
                    self.mismatch(&field_path, "bool", value);
                }
                "redirect" if !value.is_string() => {
                    self.mismatch(&field_path, "string", value);
                }
                "headers" => {
                    let Some(headers) = self.expect_table(&field_path, value, "table of strings")
                    else {
                        continue;
                    };
                    for (name, header) in headers {
                        if !header.is_string() {
                            self.mismatch(&entry_path(&field_path, name), "string", header);
                        }
                    }
                }
                known if ROUTE_RULE_FIELDS.contains(&known) => {}
                _ => self
                    .errors
                    .push(ValidationError::UnknownOption { key: field_path }),
            }
        }
    }

    fn check_allowed(&mut self, descriptor: &OptionDescriptor, path: &str, value: &str) {
        let Some(allowed) = &descriptor.allowed_values else {
            return;
        };
        if !allowed.iter().any(|candidate| candidate == value) {
            self.errors.push(ValidationError::InvalidValue {
                key: path.to_string(),
                value: value.to_string(),
                allowed: allowed.clone(),
            });
        }
    }

    /// Expect a table or record a mismatch.
    fn expect_table<'v>(
        &mut self,
        path: &str,
        value: &'v Value,
        expected: impl ToString,
    ) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.mismatch(path, expected, other);
                None
            }
        }
    }

    /// Expect an array of strings, recording one mismatch per bad entry.
    fn expect_string_list(&mut self, path: &str, value: &Value) -> Option<Vec<String>> {
        let Value::Array(items) = value else {
            self.mismatch(path, OptionType::StringList.describe(), value);
            return None;
        };
        let mut strings = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(text) => strings.push(text.to_string()),
                None => self.mismatch(&format!("{path}[{idx}]"), "string", item),
            }
        }
        Some(strings)
    }

    fn mismatch(&mut self, path: &str, expected: impl ToString, actual: &Value) {
        self.errors.push(ValidationError::TypeMismatch {
            key: path.to_string(),
            expected: expected.to_string(),
            actual: value_kind(actual).to_string(),
        });
    }
}

/// Join nested paths for error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Path for a free-form entry inside a table option, e.g. `routeRules["/"]`.
fn entry_path(prefix: &str, name: &str) -> String {
    format!("{prefix}[{name:?}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fragment(value: Value) -> ConfigFragment {
        ConfigFragment::from_value(value, "test").expect("fragment")
    }

    fn errors_for(value: Value) -> Vec<ValidationError> {
        let err = validate(&fragment(value), OptionSchema::builtin()).unwrap_err();
        err.validation_errors().to_vec()
    }

    #[test]
    fn rejects_unknown_option() {
        assert_eq!(
            errors_for(json!({ "notARealOption": true })),
            vec![ValidationError::UnknownOption {
                key: "notARealOption".to_string()
            }]
        );
    }

    #[test]
    fn rejects_string_where_bool_expected() {
        assert_eq!(
            errors_for(json!({ "ssr": "yes" })),
            vec![ValidationError::TypeMismatch {
                key: "ssr".to_string(),
                expected: "bool".to_string(),
                actual: "string".to_string(),
            }]
        );
    }

    #[test]
    fn rejects_value_outside_allowed_set() {
        let errors = errors_for(json!({ "darkMode": "dark" }));
        assert_eq!(
            errors,
            vec![ValidationError::InvalidValue {
                key: "darkMode".to_string(),
                value: "dark".to_string(),
                allowed: vec![
                    "media".to_string(),
                    "class".to_string(),
                    "selector".to_string()
                ],
            }]
        );
    }

    #[test]
    fn rejects_unknown_nested_option() {
        let errors = errors_for(json!({ "typescript": { "typeCheck": true, "shim": false } }));
        assert_eq!(
            errors,
            vec![ValidationError::UnknownOption {
                key: "typescript.shim".to_string()
            }]
        );
    }

    #[test]
    fn section_must_be_a_table() {
        let errors = errors_for(json!({ "theme": ["dark"] }));
        assert_eq!(errors[0].key(), "theme");
        assert!(matches!(errors[0], ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn route_rules_check_pattern_and_fields() {
        let errors = errors_for(json!({
            "routeRules": {
                "blog": { "prerender": true },
                "/docs/**": { "prerender": "always", "cache": true }
            }
        }));
        let keys: Vec<&str> = errors.iter().map(ValidationError::key).collect();
        assert_eq!(
            keys,
            vec![
                "routeRules[\"/docs/**\"].cache",
                "routeRules[\"/docs/**\"].prerender",
                "routeRules[\"blog\"]",
            ]
        );
        assert!(matches!(
            errors[2],
            ValidationError::InvalidPattern { ref pattern, .. } if pattern == "blog"
        ));
    }

    #[test]
    fn string_lists_report_bad_entries() {
        let errors = errors_for(json!({ "modules": ["@nuxt/ui", 3], "css": "main.css" }));
        let keys: Vec<&str> = errors.iter().map(ValidationError::key).collect();
        assert_eq!(keys, vec!["css", "modules[1]"]);
    }

    #[test]
    fn collects_every_problem_in_one_pass() {
        let err = validate(
            &fragment(json!({
                "ssr": "yes",
                "notARealOption": true,
                "darkMode": "dark",
                "theme": { "extend": { "boxShadow": { "board": 4 } } }
            })),
            OptionSchema::builtin(),
        )
        .unwrap_err();
        assert_eq!(err.validation_errors().len(), 4);
        let message = err.to_string();
        assert!(message.starts_with("invalid config (4 problems):"));
        assert!(message.contains("unknown option `notARealOption`"));
        assert!(message.contains("`theme.extend.boxShadow[\"board\"]` expected string"));
    }

    #[test]
    fn fills_required_defaults_only() {
        let resolved = validate(
            &fragment(json!({ "typescript": { "typeCheck": true } })),
            OptionSchema::builtin(),
        )
        .expect("resolved");
        assert_eq!(resolved.get("typescript.typeCheck"), Some(&json!(true)));
        assert_eq!(resolved.get("typescript.strict"), Some(&json!(true)));
        assert_eq!(resolved.get("ssr"), Some(&json!(true)));
        assert_eq!(resolved.get("content"), None);
        assert_eq!(resolved.get("theme.extend.colors"), None);
    }

    #[test]
    fn dotted_option_keys_become_nested() {
        let resolved = validate(
            &fragment(json!({
                "typescript.typeCheck": true,
                "theme.extend.colors": { "ink": "#111" }
            })),
            OptionSchema::builtin(),
        )
        .expect("resolved");
        assert_eq!(resolved.get("typescript.typeCheck"), Some(&json!(true)));
        assert_eq!(resolved.get("theme.extend.colors"), Some(&json!({ "ink": "#111" })));
        assert!(!resolved.values().contains_key("typescript.typeCheck"));
        assert_eq!(resolved.app_host().map(|app| app.type_check()), Some(true));
    }

    #[test]
    fn dotted_keys_stop_at_free_form_tables() {
        let expanded = expand_option_paths(
            fragment(json!({
                "routeRules": { "/feed.xml": { "prerender": true } },
                "theme.extend.boxShadow.card": "0 1px black"
            })),
            OptionSchema::builtin(),
        );
        assert_eq!(
            expanded.as_map().get("routeRules"),
            Some(&json!({ "/feed.xml": { "prerender": true } }))
        );

        let errors = errors_for(json!({ "theme.extend.boxShadow.card": "0 1px black" }));
        assert_eq!(
            errors,
            vec![ValidationError::UnknownOption {
                key: "theme.extend.boxShadow.card".to_string()
            }]
        );
    }

    #[test]
    fn dotted_and_nested_forms_merge_in_one_fragment() {
        let expanded = expand_option_paths(
            fragment(json!({
                "typescript": { "strict": false },
                "typescript.typeCheck": true
            })),
            OptionSchema::builtin(),
        );
        assert_eq!(
            expanded.get("typescript"),
            Some(&json!({ "strict": false, "typeCheck": true }))
        );
    }

    #[test]
    fn custom_schema_resolves_without_host_views() {
        let schema = OptionSchema::new([
            OptionDescriptor::new("ssr", OptionType::Bool, crate::HostKind::Application)
                .with_default(false),
            OptionDescriptor::new(
                "build.target",
                OptionType::String,
                crate::HostKind::Application,
            )
            .with_default("web"),
        ]);
        let resolved = validate(&fragment(json!({ "ssr": true })), &schema).expect("resolved");
        assert_eq!(resolved.get("ssr"), Some(&json!(true)));
        assert_eq!(resolved.get("build.target"), Some(&json!("web")));
        assert!(resolved.app_host().is_none());
        assert!(resolved.style_host().is_none());
    }

    #[test]
    fn custom_schema_is_respected() {
        let schema = OptionSchema::new([
            OptionDescriptor::new("ssr", OptionType::Bool, crate::HostKind::Application)
                .with_default(false),
        ]);
        let err = validate(&fragment(json!({ "modules": [] })), &schema).unwrap_err();
        assert_eq!(err.validation_errors()[0].key(), "modules");
    }
}

//! Typed views of a resolved config for the application and style hosts.

use crate::ConfigError;
use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Font stack entry that expands to the default fallback chain.
pub const FONT_FALLBACK_SPREAD: &str = "...default";

const DEFAULT_SANS_STACK: &[&str] = &[
    "ui-sans-serif",
    "system-ui",
    "sans-serif",
    "\"Apple Color Emoji\"",
    "\"Segoe UI Emoji\"",
    "\"Segoe UI Symbol\"",
    "\"Noto Color Emoji\"",
];
const DEFAULT_SERIF_STACK: &[&str] = &[
    "ui-serif",
    "Georgia",
    "Cambria",
    "\"Times New Roman\"",
    "Times",
    "serif",
];
const DEFAULT_MONO_STACK: &[&str] = &[
    "ui-monospace",
    "SFMono-Regular",
    "Menlo",
    "Monaco",
    "Consolas",
    "\"Liberation Mono\"",
    "\"Courier New\"",
    "monospace",
];

/// Default fallback chain for a font family name, if it has one.
pub fn default_font_stack(family: &str) -> Option<&'static [&'static str]> {
    match family {
        "sans" => Some(DEFAULT_SANS_STACK),
        "serif" => Some(DEFAULT_SERIF_STACK),
        "mono" => Some(DEFAULT_MONO_STACK),
        _ => None,
    }
}

/// Options read by the application host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHostConfig {
    pub ssr: bool,
    pub modules: Vec<String>,
    pub css: Vec<String>,
    pub route_rules: BTreeMap<String, RouteRule>,
    pub tailwindcss: TailwindModuleOptions,
    pub typescript: TypeScriptOptions,
}

impl AppHostConfig {
    pub(crate) fn from_values(values: &Map<String, Value>) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(Value::Object(values.clone()))?)
    }

    pub fn type_check(&self) -> bool {
        self.typescript.type_check
    }

    pub fn is_module_enabled(&self, module: &str) -> bool {
        self.modules.iter().any(|entry| entry == module)
    }

    /// Combined rule for a concrete route.
    ///
    /// Every matching pattern contributes, applied from least to most
    /// specific so that narrower patterns win per field.
    pub fn rule_for(&self, route: &str) -> Option<RouteRule> {
        let mut matching: Vec<(&String, &RouteRule)> = self
            .route_rules
            .iter()
            .filter(|(pattern, _)| route_matches(pattern, route))
            .collect();
        if matching.is_empty() {
            return None;
        }
        matching.sort_by_key(|(pattern, _)| pattern_specificity(pattern));

        let mut combined = RouteRule::default();
        for (_, rule) in matching {
            combined.apply(rule);
        }
        Some(combined)
    }
}

/// Per-route rendering rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerender: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RouteRule {
    pub fn should_prerender(&self) -> bool {
        self.prerender.unwrap_or(false)
    }

    fn apply(&mut self, other: &RouteRule) {
        if other.prerender.is_some() {
            self.prerender = other.prerender;
        }
        if other.ssr.is_some() {
            self.ssr = other.ssr;
        }
        if other.redirect.is_some() {
            self.redirect.clone_from(&other.redirect);
        }
        self.headers
            .extend(other.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// Compile a route pattern; `*` stays within one path segment.
pub(crate) fn compile_route_pattern(pattern: &str) -> Result<globset::GlobMatcher, String> {
    if !pattern.starts_with('/') {
        return Err("route patterns must start with `/`".to_string());
    }
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| err.to_string())
}

fn route_matches(pattern: &str, route: &str) -> bool {
    compile_route_pattern(pattern)
        .map(|matcher| matcher.is_match(route))
        .unwrap_or(false)
}

/// Exact patterns outrank wildcards; longer literal text outranks shorter.
fn pattern_specificity(pattern: &str) -> (bool, usize) {
    let wildcard = pattern.contains(['*', '?', '[', '{']);
    let literal = pattern.chars().filter(|c| *c != '*').count();
    (!wildcard, literal)
}

/// Options for the utility-CSS module of the application host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailwindModuleOptions {
    pub viewer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeScriptOptions {
    pub type_check: bool,
    pub strict: bool,
}

/// Options read by the style host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleHostConfig {
    pub dark_mode: DarkMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<String>>,
    pub theme: ThemeOptions,
    pub ui: UiOptions,
}

impl StyleHostConfig {
    pub(crate) fn from_values(values: &Map<String, Value>) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(Value::Object(values.clone()))?)
    }

    /// Icon-set identifiers, in lookup order.
    pub fn icons(&self) -> &[String] {
        &self.ui.icons
    }

    pub fn shadow(&self, name: &str) -> Option<&str> {
        self.theme.extend.box_shadow.get(name).map(String::as_str)
    }

    /// Font stack for `family` with the fallback spread expanded.
    ///
    /// Families without a configured stack fall back to the default chain
    /// when one exists. A spread inside a family with no default chain
    /// expands to nothing.
    pub fn font_stack(&self, family: &str) -> Option<Vec<String>> {
        let defaults = default_font_stack(family);
        let Some(configured) = self.theme.extend.font_family.get(family) else {
            return defaults.map(|stack| stack.iter().map(|s| s.to_string()).collect());
        };
        let mut stack = Vec::with_capacity(configured.len());
        for entry in configured {
            if entry == FONT_FALLBACK_SPREAD {
                stack.extend(defaults.unwrap_or_default().iter().map(|s| s.to_string()));
            } else {
                stack.push(entry.clone());
            }
        }
        Some(stack)
    }
}

/// How dark-mode variants are activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    #[default]
    Media,
    Class,
    Selector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeOptions {
    pub extend: ThemeExtend,
}

/// Theme additions layered over the style host's default theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeExtend {
    pub font_family: BTreeMap<String, Vec<String>>,
    pub box_shadow: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiOptions {
    pub icons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style_with_fonts(fonts: &[(&str, &[&str])]) -> StyleHostConfig {
        StyleHostConfig {
            dark_mode: DarkMode::Media,
            content: None,
            theme: ThemeOptions {
                extend: ThemeExtend {
                    font_family: fonts
                        .iter()
                        .map(|(name, stack)| {
                            (
                                name.to_string(),
                                stack.iter().map(|s| s.to_string()).collect(),
                            )
                        })
                        .collect(),
                    box_shadow: BTreeMap::new(),
                    colors: None,
                },
            },
            ui: UiOptions {
                icons: vec!["heroicons".to_string()],
            },
        }
    }

    fn app_with_rules(rules: &[(&str, RouteRule)]) -> AppHostConfig {
        AppHostConfig {
            ssr: true,
            modules: Vec::new(),
            css: Vec::new(),
            route_rules: rules
                .iter()
                .map(|(pattern, rule)| (pattern.to_string(), rule.clone()))
                .collect(),
            tailwindcss: TailwindModuleOptions {
                viewer: true,
                css_path: None,
            },
            typescript: TypeScriptOptions {
                type_check: false,
                strict: true,
            },
        }
    }

    #[test]
    fn spread_expands_to_default_sans_chain() {
        let style = style_with_fonts(&[("sans", &["Inter", FONT_FALLBACK_SPREAD])]);
        let stack = style.font_stack("sans").expect("stack");
        let fallback: Vec<String> = DEFAULT_SANS_STACK.iter().map(|s| s.to_string()).collect();
        assert_eq!(stack[0], "Inter");
        assert_eq!(&stack[1..], fallback.as_slice());
    }

    #[test]
    fn unconfigured_family_uses_defaults_or_nothing() {
        let style = style_with_fonts(&[]);
        assert_eq!(
            style.font_stack("mono").map(|stack| stack.len()),
            Some(DEFAULT_MONO_STACK.len())
        );
        assert_eq!(style.font_stack("display"), None);
    }

    #[test]
    fn spread_without_default_chain_is_dropped() {
        let style = style_with_fonts(&[("display", &["Lobster", FONT_FALLBACK_SPREAD])]);
        assert_eq!(style.font_stack("display"), Some(vec!["Lobster".to_string()]));
    }

    #[test]
    fn rule_for_layers_wildcard_then_exact() {
        let app = app_with_rules(&[
            (
                "/blog/**",
                RouteRule {
                    prerender: Some(true),
                    ssr: Some(false),
                    ..RouteRule::default()
                },
            ),
            (
                "/blog/post",
                RouteRule {
                    ssr: Some(true),
                    ..RouteRule::default()
                },
            ),
        ]);

        let rule = app.rule_for("/blog/post").expect("rule");
        assert_eq!(rule.prerender, Some(true));
        assert_eq!(rule.ssr, Some(true));

        let rule = app.rule_for("/blog/other").expect("rule");
        assert_eq!(rule.ssr, Some(false));
        assert_eq!(app.rule_for("/about"), None);
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        let app = app_with_rules(&[(
            "/docs/*",
            RouteRule {
                prerender: Some(true),
                ..RouteRule::default()
            },
        )]);
        assert!(app.rule_for("/docs/intro").is_some());
        assert!(app.rule_for("/docs/intro/setup").is_none());
    }

    #[test]
    fn compile_rejects_relative_patterns() {
        assert!(compile_route_pattern("blog").is_err());
        assert!(compile_route_pattern("/blog/[").is_err());
        assert!(compile_route_pattern("/").is_ok());
    }
}

//! Partial, unvalidated configuration values.

use crate::ConfigError;
use serde_json::{Map, Value};

/// One partial configuration source, stored as a nested mapping.
///
/// Option paths are dot-delimited (`typescript.typeCheck`); each segment
/// addresses one level of nesting. Keys that themselves contain dots, such as
/// route patterns, are only reachable by inserting their parent mapping whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFragment {
    values: Map<String, Value>,
}

impl ConfigFragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Build a fragment from a parsed value; the root must be a mapping.
    pub fn from_value(value: Value, origin: &str) -> Result<Self, ConfigError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ConfigError::Invalid(format!(
                "{origin}: fragment root must be a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// Set `path`, creating intermediate mappings as needed.
    ///
    /// A non-mapping value sitting on an intermediate segment is replaced.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) {
        let (parents, leaf) = match path.rsplit_once('.') {
            Some((parents, leaf)) => (parents.split('.').collect::<Vec<_>>(), leaf),
            None => (Vec::new(), path),
        };
        let mut current = &mut self.values;
        for segment in parents {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            current = map;
        }
        current.insert(leaf.to_string(), value.into());
    }

    /// Builder form of [`ConfigFragment::insert`].
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Look up a dot-delimited option path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.values, path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Walk a nested mapping along a dot-delimited path.
pub(crate) fn lookup<'a>(values: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = values.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Short name of a value's runtime shape, used in diagnostics.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

//! Error types for config loading and validation.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors returned while loading, validating, or using a resolved config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed outside of a source read.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a fragment's JSON5 text failed.
    #[error("failed to parse config {origin}: {error}")]
    ParseFailed {
        origin: String,
        #[source]
        error: json5::Error,
    },
    /// A source exists but its contents are not UTF-8 text.
    #[error("config source {origin} is not valid UTF-8: {error}")]
    InvalidEncoding {
        origin: String,
        #[source]
        error: std::io::Error,
    },
    /// Converting validated values into host views failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A declared source could not be read.
    #[error("config source {origin} is unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },
    /// Reading a declared source did not finish in time.
    #[error("config source {origin} timed out after {timeout:?}")]
    SourceTimeout { origin: String, timeout: Duration },
    /// The schema was queried for a path it does not describe.
    #[error("no schema entry for option `{path}`")]
    SchemaLookup { path: String },
    /// One or more options failed validation.
    #[error("{0}")]
    Validation(ValidationReport),
    /// A write was attempted against a frozen config.
    #[error("config is frozen; cannot set `{path}` (re-run resolve instead)")]
    ImmutableConfig { path: String },
    /// Generic misuse of the resolver.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Validation problems carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ConfigError::Validation(report) => report.errors(),
            _ => &[],
        }
    }
}

/// A single problem found while checking a merged fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The option is not part of the schema.
    #[error("unknown option `{key}`")]
    UnknownOption { key: String },
    /// The value has the wrong shape.
    #[error("`{key}` expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },
    /// The value is outside the option's allowed set.
    #[error("`{key}` has value {value:?}, expected one of: {}", .allowed.join(", "))]
    InvalidValue {
        key: String,
        value: String,
        allowed: Vec<String>,
    },
    /// A route pattern is malformed.
    #[error("`{key}` has invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        key: String,
        pattern: String,
        reason: String,
    },
}

impl ValidationError {
    /// Option path the problem refers to.
    pub fn key(&self) -> &str {
        match self {
            ValidationError::UnknownOption { key }
            | ValidationError::TypeMismatch { key, .. }
            | ValidationError::InvalidValue { key, .. }
            | ValidationError::InvalidPattern { key, .. } => key,
        }
    }
}

/// Every validation problem found in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let noun = if count == 1 { "problem" } else { "problems" };
        write!(f, "invalid config ({count} {noun}):")?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

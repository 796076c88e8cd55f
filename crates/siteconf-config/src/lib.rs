//! Layered site configuration for application and style hosts.
//!
//! This crate owns the option schema, fragment loading, merge precedence and
//! validation, and produces the frozen `ResolvedConfig` that hosts receive.

mod error;
mod fragment;
mod handle;
mod loader;
mod model;
mod resolved;
mod schema;

/// Public error types returned by loading and validation APIs.
pub use error::{ConfigError, ValidationError, ValidationReport};
pub use fragment::ConfigFragment;
/// Hot-reload handle.
pub use handle::ConfigHandle;
/// Resolver entry points and source designators.
pub use loader::{
    DEFAULT_READ_TIMEOUT, ENVIRONMENT_VAR, FragmentSource, ResolveOptions, SourceKind,
    SourceLocation, load, merge, resolve, resolve_with, validate,
};
/// Typed host views.
pub use model::*;
pub use resolved::{LoadedSource, ResolvedConfig};
/// Option schema registry.
pub use schema::{HostKind, OptionDescriptor, OptionSchema, OptionType};

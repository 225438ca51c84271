//! Error types for settings resolution and the backing stores.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while building a resolved settings instance.
///
/// Every variant is raised synchronously from construction; nothing is
/// logged-and-swallowed.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Two fields normalize to the same name.
    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    /// A link points at a field the schema does not declare.
    #[error("field '{field}' refers to unknown field '{refer_to}'")]
    UnknownReference { field: String, refer_to: String },

    /// The link graph loops back on itself.
    #[error("linked fields form a cycle: {}", path.join(" -> "))]
    LinkCycle { path: Vec<String> },

    /// A required field got no value from any source, default or link.
    #[error("field '{field}' is required (set {env_var} or provide it in a config file)")]
    MissingField { field: String, env_var: String },

    /// A value could not be coerced to the declared kind.
    #[error("invalid value for '{field}' from {origin}: {reason}")]
    InvalidValue {
        field: String,
        origin: String,
        reason: String,
    },

    /// A configuration file contains a line that cannot be parsed.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The resolved values do not fit the requested typed struct.
    #[error("failed to build typed settings: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Failure reported by a key-value or relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no client available for url scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("invalid store url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("store connection is closed")]
    Closed,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

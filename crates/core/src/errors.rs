//! Error types for the fieldmap core library.
//!
//! Mapping and configuration each have their own error type derived with
//! `thiserror`, and a top-level [`CoreError`] enum unifies them for callers
//! that want a single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Mapping errors
// ---------------------------------------------------------------------------

/// Errors raised while compiling a rule table or running a mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A formatted field held a value that could not be parsed or rendered.
    #[error("cannot convert field '{field}' value '{value}': expected {expected}")]
    Format {
        field: String,
        value: String,
        expected: String,
    },

    /// A computed field needs a nested source object that is absent.
    #[error("field '{field}' requires '{reference}', which is absent")]
    MissingReference {
        field: String,
        reference: String,
    },

    /// The rule table is malformed (duplicate target, bad pattern, ...).
    #[error("invalid mapping rule for '{field}': {detail}")]
    InvalidRule {
        field: String,
        detail: String,
    },

    /// Conversion between a typed object and its value tree failed.
    #[error("value conversion failed for {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MappingError {
    pub(crate) fn format(field: &str, value: impl ToString, expected: impl Into<String>) -> Self {
        Self::Format {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    pub(crate) fn invalid_rule(field: &str, detail: impl Into<String>) -> Self {
        Self::InvalidRule {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading and validating rule-table configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("mapping configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("mapping configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid mapping configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("mapping configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

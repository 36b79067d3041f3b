//! TOML-declared rule tables.
//!
//! Rules that need no code (everything except computed and collection
//! rules) can be declared in a file:
//!
//! ```toml
//! name = "movie"
//!
//! [[fields]]
//! kind = "rename"
//! target = "maker"
//! source = "director"
//!
//! [[fields]]
//! kind = "date_format"
//! target = "release_date"
//! pattern = "%d.%m.%Y"
//! ```
//!
//! `source` defaults to `target` for the formatted and default kinds. Load
//! with [`MappingConfig::load_from_file`] and compile through
//! [`MapperBuilder::from_config`](crate::mapper::MapperBuilder::from_config).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A rule table loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Mapper name, used in logs and errors.
    pub name: String,

    /// Field declarations, in application order.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One declared target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    Copy {
        target: String,
    },
    Rename {
        target: String,
        source: String,
    },
    Nested {
        target: String,
        path: String,
    },
    DateFormat {
        target: String,
        #[serde(default)]
        source: Option<String>,
        pattern: String,
    },
    NumberFormat {
        target: String,
        #[serde(default)]
        source: Option<String>,
        pattern: String,
    },
    Ignore {
        target: String,
    },
    Default {
        target: String,
        #[serde(default)]
        source: Option<String>,
        value: Value,
    },
}

impl FieldSpec {
    pub fn target(&self) -> &str {
        match self {
            Self::Copy { target }
            | Self::Rename { target, .. }
            | Self::Nested { target, .. }
            | Self::DateFormat { target, .. }
            | Self::NumberFormat { target, .. }
            | Self::Ignore { target }
            | Self::Default { target, .. } => target,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validating
// ---------------------------------------------------------------------------

impl MappingConfig {
    /// Load a [`MappingConfig`] from a TOML file. Does not validate.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading mapping configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a [`MappingConfig`] from TOML text. Does not validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MappingConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!(name = %config.name, fields = config.fields.len(), "mapping configuration parsed");
        Ok(config)
    }

    /// Check the structural constraints a rule table must meet. Patterns and
    /// paths are checked when the table is compiled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "name".into(),
                detail: "mapping name must not be empty".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, spec) in self.fields.iter().enumerate() {
            let target = spec.target();
            if target.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("fields[{i}].target"),
                    detail: "target must not be empty".into(),
                });
            }
            if !seen.insert(target) {
                return Err(ConfigError::InvalidValue {
                    field: format!("fields[{i}].target"),
                    detail: format!("target '{target}' is declared more than once"),
                });
            }
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

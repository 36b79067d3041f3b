//! fieldmap core library.
//!
//! This crate provides a declarative field-mapping layer between a domain
//! model and its transfer representation: rule tables declared in code or
//! TOML, date and number formats, nested-path extraction, defaults, and
//! collection element mapping, interpreted by one generic engine in both
//! directions.

pub mod config;
pub mod errors;
pub mod format;
pub mod mapper;
pub mod path;
pub mod rules;

// Re-exports for convenience.
pub use config::{FieldSpec, MappingConfig};
pub use errors::{ConfigError, CoreError, MappingError};
pub use mapper::{Mapper, MapperBuilder, ValueMapper};
pub use rules::{CollectionKind, MissingPolicy, RuleKind};

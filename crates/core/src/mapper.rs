//! The generic mapping engine.
//!
//! [`Mapper`] interprets a compiled rule table between a source type `S` and
//! a target type `T`. Both directions go through the `serde_json::Value`
//! form of the objects, so any pair of serde-compatible types can be mapped
//! without per-pair mapper code. [`MapperBuilder`] declares and compiles the
//! rule table.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{FieldSpec, MappingConfig};
use crate::errors::MappingError;
use crate::format::{DatePattern, NumberPattern};
use crate::path::FieldPath;
use crate::rules::{CollectionKind, ComputeFn, FieldMapping, MissingPolicy, Rule, RuleKind};

// ---------------------------------------------------------------------------
// Value-level mapping
// ---------------------------------------------------------------------------

/// Mapping between value trees, the seam collection rules delegate through.
///
/// Every [`Mapper`] whose types round-trip through serde implements this, so
/// one mapper can be plugged into another as an element mapper.
pub trait ValueMapper: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    fn forward_value(&self, source: &Value) -> Result<Value, MappingError>;

    fn inverse_value(&self, target: &Value) -> Result<Value, MappingError>;
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

/// A compiled, immutable rule table mapping `S` to `T` and back.
///
/// Cloning is cheap (the rules sit behind an `Arc`) and a mapper can be
/// shared between threads: each call only reads its input and the rules.
pub struct Mapper<S, T> {
    name: Arc<str>,
    fields: Arc<[FieldMapping<S>]>,
    _types: PhantomData<fn(&S) -> T>,
}

impl<S, T> Clone for Mapper<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            fields: Arc::clone(&self.fields),
            _types: PhantomData,
        }
    }
}

impl<S, T> std::fmt::Debug for Mapper<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<S, T> Mapper<S, T> {
    /// Start declaring a rule table.
    pub fn builder(name: &str) -> MapperBuilder<S, T> {
        MapperBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rule table, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldMapping<S>> {
        self.fields.iter()
    }

    /// The rule producing `target`, if declared.
    pub fn field(&self, target: &str) -> Option<&FieldMapping<S>> {
        self.fields.iter().find(|f| f.target() == target)
    }
}

impl<S, T> Mapper<S, T>
where
    S: Serialize + DeserializeOwned,
    T: Serialize + DeserializeOwned,
{
    /// Build a new target object from `source`.
    ///
    /// Undeclared target fields are left to their serde defaults. On error
    /// no target object is produced.
    pub fn map_forward(&self, source: &S) -> Result<T, MappingError> {
        debug!(mapper = %self.name, "mapping forward");
        let tree = serde_json::to_value(source)
            .map_err(|e| MappingError::serialization(format!("source of '{}'", self.name), e))?;

        let mut out = Map::new();
        for mapping in self.fields.iter() {
            if let Some(value) = mapping.forward(source, &tree)? {
                out.insert(mapping.target().to_string(), value);
            }
        }

        serde_json::from_value(Value::Object(out))
            .map_err(|e| MappingError::serialization(format!("target of '{}'", self.name), e))
    }

    /// Build a new source object from `target`.
    ///
    /// Computed and ignored fields are not invertible and stay absent, as
    /// do fields whose target value is null. Defaults are not re-applied.
    pub fn map_inverse(&self, target: &T) -> Result<S, MappingError> {
        debug!(mapper = %self.name, "mapping inverse");
        let tree = serde_json::to_value(target)
            .map_err(|e| MappingError::serialization(format!("target of '{}'", self.name), e))?;

        let mut out = Map::new();
        let mut parsed = Vec::new();
        for mapping in self.fields.iter() {
            if let Some(raw) = mapping.inverse(&tree, &mut out)? {
                parsed.push((mapping, raw));
            }
        }

        let restored = Value::Object(out);
        S::deserialize(&restored).map_err(|e| {
            self.unfit_parsed_field(&restored, &parsed).unwrap_or_else(|| {
                MappingError::serialization(format!("source of '{}'", self.name), e)
            })
        })
    }

    /// Find the parsed date or number the source type rejects, e.g. a year
    /// that overflows an `i32`. Each parsed value is tried on its own against
    /// an otherwise empty source tree.
    fn unfit_parsed_field(
        &self,
        restored: &Value,
        parsed: &[(&FieldMapping<S>, String)],
    ) -> Option<MappingError> {
        // Attribution needs a source type that accepts an empty tree.
        S::deserialize(&Value::Object(Map::new())).ok()?;

        parsed.iter().find_map(|(mapping, raw)| {
            let source = mapping.rule().inverse_source()?;
            let mut alone = Map::new();
            source.insert(&mut alone, source.lookup(restored)?.clone());
            S::deserialize(&Value::Object(alone)).err()?;

            let expected = match mapping.kind() {
                RuleKind::DateFormat => "a date in range of the source field",
                _ => "a number in range of the source field",
            };
            debug!(
                mapper = %self.name,
                field = mapping.target(),
                "parsed value does not fit source"
            );
            Some(MappingError::format(mapping.target(), raw, expected))
        })
    }
}

impl<S, T> ValueMapper for Mapper<S, T>
where
    S: Serialize + DeserializeOwned,
    T: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn forward_value(&self, source: &Value) -> Result<Value, MappingError> {
        let source: S = serde_json::from_value(source.clone())
            .map_err(|e| MappingError::serialization(format!("element of '{}'", self.name), e))?;
        let target = self.map_forward(&source)?;
        serde_json::to_value(target)
            .map_err(|e| MappingError::serialization(format!("target of '{}'", self.name), e))
    }

    fn inverse_value(&self, target: &Value) -> Result<Value, MappingError> {
        let target: T = serde_json::from_value(target.clone())
            .map_err(|e| MappingError::serialization(format!("element of '{}'", self.name), e))?;
        let source = self.map_inverse(&target)?;
        serde_json::to_value(source)
            .map_err(|e| MappingError::serialization(format!("source of '{}'", self.name), e))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Declares a rule table one target field at a time.
///
/// Each declaration is validated as it is added; the first invalid one is
/// reported by [`build`](Self::build).
pub struct MapperBuilder<S, T> {
    name: String,
    fields: Vec<FieldMapping<S>>,
    error: Option<MappingError>,
    _types: PhantomData<fn(&S) -> T>,
}

impl<S, T> MapperBuilder<S, T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            error: None,
            _types: PhantomData,
        }
    }

    /// Start from a rule table loaded from configuration. Computed and
    /// collection rules can be chained on afterwards.
    pub fn from_config(config: &MappingConfig) -> Self {
        config
            .fields
            .iter()
            .fold(Self::new(&config.name), |builder, spec| builder.spec(spec))
    }

    /// Copy the same-named source field.
    pub fn copy(self, field: &str) -> Self {
        let rule = parse_path(field, field).map(|source| Rule::Copy { source });
        self.push(field, rule)
    }

    /// Copy a differently named source field.
    pub fn rename(self, target: &str, source: &str) -> Self {
        let rule = parse_path(target, source).map(|source| Rule::Rename { source });
        self.push(target, rule)
    }

    /// Flatten a scalar off a nested source object, e.g. `soundtrack.composer`.
    pub fn nested(self, target: &str, path: &str) -> Self {
        let rule = parse_path(target, path).map(|path| Rule::Nested { path });
        self.push(target, rule)
    }

    /// Render a source date with a strftime pattern.
    pub fn date_format(self, target: &str, source: &str, pattern: &str) -> Self {
        let rule = parse_path(target, source).and_then(|source| {
            let pattern =
                DatePattern::compile(pattern).map_err(|d| MappingError::invalid_rule(target, d))?;
            Ok(Rule::DateFormat { source, pattern })
        });
        self.push(target, rule)
    }

    /// Render a source number with a DecimalFormat-style pattern.
    pub fn number_format(self, target: &str, source: &str, pattern: &str) -> Self {
        let rule = parse_path(target, source).and_then(|source| {
            let pattern =
                NumberPattern::compile(pattern).map_err(|d| MappingError::invalid_rule(target, d))?;
            Ok(Rule::NumberFormat { source, pattern })
        });
        self.push(target, rule)
    }

    /// Derive a field from the typed source.
    ///
    /// `requires` names the source path the computation depends on; when it
    /// is null or absent the closure is not called and `on_missing` decides
    /// between a null field and a [`MappingError::MissingReference`].
    pub fn computed<F, V>(
        self,
        target: &str,
        requires: &str,
        on_missing: MissingPolicy,
        compute: F,
    ) -> Self
    where
        F: Fn(&S) -> Option<V> + Send + Sync + 'static,
        V: Into<Value>,
    {
        let compute: ComputeFn<S> = Arc::new(move |source: &S| compute(source).map(Into::into));
        let rule = parse_path(target, requires).map(|requires| Rule::Computed {
            requires,
            on_missing,
            compute,
        });
        self.push(target, rule)
    }

    /// Never populate `target`.
    pub fn ignore(self, target: &str) -> Self {
        self.push(target, Ok(Rule::Ignore))
    }

    /// Copy `source`, substituting `value` when it is null or absent.
    pub fn default_value(self, target: &str, source: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        let rule = parse_path(target, source).map(|source| Rule::Default { source, value });
        self.push(target, rule)
    }

    /// Map every element of a source collection through `element`.
    pub fn collection<M>(self, target: &str, source: &str, element: M, kind: CollectionKind) -> Self
    where
        M: ValueMapper + 'static,
    {
        let element: Arc<dyn ValueMapper> = Arc::new(element);
        let rule = parse_path(target, source).map(|source| Rule::Collection {
            source,
            element,
            kind,
        });
        self.push(target, rule)
    }

    /// Apply a declaration loaded from configuration.
    pub fn spec(self, spec: &FieldSpec) -> Self {
        match spec {
            FieldSpec::Copy { target } => self.copy(target),
            FieldSpec::Rename { target, source } => self.rename(target, source),
            FieldSpec::Nested { target, path } => self.nested(target, path),
            FieldSpec::DateFormat {
                target,
                source,
                pattern,
            } => self.date_format(target, source.as_deref().unwrap_or(target), pattern),
            FieldSpec::NumberFormat {
                target,
                source,
                pattern,
            } => self.number_format(target, source.as_deref().unwrap_or(target), pattern),
            FieldSpec::Ignore { target } => self.ignore(target),
            FieldSpec::Default {
                target,
                source,
                value,
            } => self.default_value(target, source.as_deref().unwrap_or(target), value.clone()),
        }
    }

    fn push(mut self, target: &str, rule: Result<Rule<S>, MappingError>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let checked = validate_target(target, &self.fields).and(rule);
        match checked {
            Ok(rule) => self.fields.push(FieldMapping {
                target: target.to_string(),
                rule,
            }),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Compile the rule table.
    pub fn build(self) -> Result<Mapper<S, T>, MappingError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.name.is_empty() {
            return Err(MappingError::invalid_rule("<mapper>", "mapper name must not be empty"));
        }

        let mut written = HashSet::new();
        for mapping in &self.fields {
            if let Some(source) = mapping.rule().inverse_source() {
                if !written.insert(source.as_str()) {
                    warn!(
                        mapper = %self.name,
                        field = mapping.target(),
                        source = %source,
                        "source field written by more than one inverse rule; last rule wins"
                    );
                }
            }
        }

        debug!(mapper = %self.name, fields = self.fields.len(), "compiled mapping rules");
        Ok(Mapper {
            name: Arc::from(self.name),
            fields: Arc::from(self.fields),
            _types: PhantomData,
        })
    }
}

fn parse_path(target: &str, raw: &str) -> Result<FieldPath, MappingError> {
    FieldPath::parse(raw).ok_or_else(|| {
        MappingError::invalid_rule(target, format!("'{raw}' is not a valid field path"))
    })
}

fn validate_target<S>(target: &str, existing: &[FieldMapping<S>]) -> Result<(), MappingError> {
    if target.is_empty() {
        return Err(MappingError::invalid_rule(target, "target field must not be empty"));
    }
    if target.contains('.') {
        return Err(MappingError::invalid_rule(
            target,
            "target fields are flat and cannot contain '.'",
        ));
    }
    if existing.iter().any(|f| f.target() == target) {
        return Err(MappingError::invalid_rule(target, "target field declared more than once"));
    }
    Ok(())
}

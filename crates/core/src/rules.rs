//! Field mapping rules and their per-field application.
//!
//! A [`FieldMapping`] pairs one target field with the [`Rule`] that produces
//! it. Rules read from the serialised source tree in the forward direction
//! and write into a fresh source tree in the inverse direction.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::errors::MappingError;
use crate::format::{display_value, DatePattern, NumberPattern};
use crate::mapper::ValueMapper;
use crate::path::FieldPath;

/// Closure producing a computed field from the typed source object.
pub type ComputeFn<S> = Arc<dyn Fn(&S) -> Option<Value> + Send + Sync>;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What a computed rule does when the source reference it needs is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Leave the target field null.
    Null,
    /// Fail the whole mapping with [`MappingError::MissingReference`].
    Fail,
}

/// Shape of the target collection of a collection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Keep every mapped element.
    List,
    /// Drop mapped elements equal to one already collected.
    Set,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// How one target field is produced.
pub enum Rule<S> {
    /// Same-named source field, copied verbatim.
    Copy { source: FieldPath },
    /// Differently named source field, copied verbatim.
    Rename { source: FieldPath },
    /// Scalar read off a nested source object.
    Nested { path: FieldPath },
    /// Date rendered with a pattern.
    DateFormat {
        source: FieldPath,
        pattern: DatePattern,
    },
    /// Number rendered with a pattern.
    NumberFormat {
        source: FieldPath,
        pattern: NumberPattern,
    },
    /// Value derived from the typed source object. Not invertible.
    Computed {
        requires: FieldPath,
        on_missing: MissingPolicy,
        compute: ComputeFn<S>,
    },
    /// Never populated. Not invertible.
    Ignore,
    /// Source field, or `value` when the source is null or absent.
    Default { source: FieldPath, value: Value },
    /// Every element mapped through a sub-mapper.
    Collection {
        source: FieldPath,
        element: Arc<dyn ValueMapper>,
        kind: CollectionKind,
    },
}

/// Discriminant of a [`Rule`], used for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Copy,
    Rename,
    Nested,
    DateFormat,
    NumberFormat,
    Computed,
    Ignore,
    Default,
    Collection,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Rename => write!(f, "rename"),
            Self::Nested => write!(f, "nested"),
            Self::DateFormat => write!(f, "date_format"),
            Self::NumberFormat => write!(f, "number_format"),
            Self::Computed => write!(f, "computed"),
            Self::Ignore => write!(f, "ignore"),
            Self::Default => write!(f, "default"),
            Self::Collection => write!(f, "collection"),
        }
    }
}

impl<S> Rule<S> {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Copy { .. } => RuleKind::Copy,
            Self::Rename { .. } => RuleKind::Rename,
            Self::Nested { .. } => RuleKind::Nested,
            Self::DateFormat { .. } => RuleKind::DateFormat,
            Self::NumberFormat { .. } => RuleKind::NumberFormat,
            Self::Computed { .. } => RuleKind::Computed,
            Self::Ignore => RuleKind::Ignore,
            Self::Default { .. } => RuleKind::Default,
            Self::Collection { .. } => RuleKind::Collection,
        }
    }

    /// The source path written back by inverse mapping, if any.
    pub fn inverse_source(&self) -> Option<&FieldPath> {
        match self {
            Self::Copy { source }
            | Self::Rename { source }
            | Self::DateFormat { source, .. }
            | Self::NumberFormat { source, .. }
            | Self::Default { source, .. }
            | Self::Collection { source, .. } => Some(source),
            Self::Nested { path } => Some(path),
            Self::Computed { .. } | Self::Ignore => None,
        }
    }

    pub fn is_invertible(&self) -> bool {
        self.inverse_source().is_some()
    }
}

impl<S> Clone for Rule<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Copy { source } => Self::Copy {
                source: source.clone(),
            },
            Self::Rename { source } => Self::Rename {
                source: source.clone(),
            },
            Self::Nested { path } => Self::Nested { path: path.clone() },
            Self::DateFormat { source, pattern } => Self::DateFormat {
                source: source.clone(),
                pattern: pattern.clone(),
            },
            Self::NumberFormat { source, pattern } => Self::NumberFormat {
                source: source.clone(),
                pattern: pattern.clone(),
            },
            Self::Computed {
                requires,
                on_missing,
                compute,
            } => Self::Computed {
                requires: requires.clone(),
                on_missing: *on_missing,
                compute: Arc::clone(compute),
            },
            Self::Ignore => Self::Ignore,
            Self::Default { source, value } => Self::Default {
                source: source.clone(),
                value: value.clone(),
            },
            Self::Collection {
                source,
                element,
                kind,
            } => Self::Collection {
                source: source.clone(),
                element: Arc::clone(element),
                kind: *kind,
            },
        }
    }
}

impl<S> std::fmt::Debug for Rule<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy { source } => f.debug_struct("Copy").field("source", source).finish(),
            Self::Rename { source } => f.debug_struct("Rename").field("source", source).finish(),
            Self::Nested { path } => f.debug_struct("Nested").field("path", path).finish(),
            Self::DateFormat { source, pattern } => f
                .debug_struct("DateFormat")
                .field("source", source)
                .field("pattern", &pattern.as_str())
                .finish(),
            Self::NumberFormat { source, pattern } => f
                .debug_struct("NumberFormat")
                .field("source", source)
                .field("pattern", &pattern.as_str())
                .finish(),
            Self::Computed {
                requires,
                on_missing,
                ..
            } => f
                .debug_struct("Computed")
                .field("requires", requires)
                .field("on_missing", on_missing)
                .finish_non_exhaustive(),
            Self::Ignore => f.write_str("Ignore"),
            Self::Default { source, value } => f
                .debug_struct("Default")
                .field("source", source)
                .field("value", value)
                .finish(),
            Self::Collection {
                source,
                element,
                kind,
            } => f
                .debug_struct("Collection")
                .field("source", source)
                .field("element", &element.name())
                .field("kind", kind)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// One entry of a rule table: a target field and the rule producing it.
pub struct FieldMapping<S> {
    pub(crate) target: String,
    pub(crate) rule: Rule<S>,
}

impl<S> Clone for FieldMapping<S> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            rule: self.rule.clone(),
        }
    }
}

impl<S> std::fmt::Debug for FieldMapping<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapping")
            .field("target", &self.target)
            .field("rule", &self.rule)
            .finish()
    }
}

impl<S> FieldMapping<S> {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn rule(&self) -> &Rule<S> {
        &self.rule
    }

    pub fn kind(&self) -> RuleKind {
        self.rule.kind()
    }

    /// Produce the target value from the typed source and its value tree.
    /// `Ok(None)` leaves the target field null.
    pub(crate) fn forward(
        &self,
        object: &S,
        tree: &Value,
    ) -> Result<Option<Value>, MappingError> {
        let field = self.target.as_str();
        let value = match &self.rule {
            Rule::Copy { source } | Rule::Rename { source } | Rule::Nested { path: source } => {
                source.lookup(tree).cloned()
            }
            Rule::DateFormat { source, pattern } => match source.lookup(tree) {
                Some(raw) => Some(pattern.format(field, raw)?),
                None => None,
            },
            Rule::NumberFormat { source, pattern } => match source.lookup(tree) {
                Some(raw) => Some(pattern.format(field, raw)?),
                None => None,
            },
            Rule::Computed {
                requires,
                on_missing,
                compute,
            } => {
                if requires.lookup(tree).is_none() {
                    match on_missing {
                        MissingPolicy::Null => {
                            trace!(field, reference = %requires, "reference absent, leaving null");
                            None
                        }
                        MissingPolicy::Fail => {
                            return Err(MappingError::MissingReference {
                                field: field.to_string(),
                                reference: requires.to_string(),
                            });
                        }
                    }
                } else {
                    compute(object).filter(|v| !v.is_null())
                }
            }
            Rule::Ignore => None,
            Rule::Default { source, value } => {
                Some(source.lookup(tree).cloned().unwrap_or_else(|| value.clone()))
            }
            Rule::Collection {
                source,
                element,
                kind,
            } => match source.lookup(tree) {
                None => None,
                Some(Value::Array(items)) => {
                    let mut mapped: Vec<Value> = Vec::with_capacity(items.len());
                    for item in items {
                        let value = element.forward_value(item)?;
                        if *kind == CollectionKind::Set && mapped.contains(&value) {
                            continue;
                        }
                        mapped.push(value);
                    }
                    Some(Value::Array(mapped))
                }
                Some(other) => {
                    return Err(MappingError::format(field, display_value(other), "a collection"));
                }
            },
        };

        trace!(field, kind = %self.kind(), populated = value.is_some(), "forward rule applied");
        Ok(value)
    }

    /// Write the inverse of this rule into `out`. Null or absent target
    /// values, computed fields and ignored fields leave `out` untouched.
    ///
    /// Returns the raw text of a parsed date or number, so a value that
    /// parses but does not fit the source type can be reported against it.
    pub(crate) fn inverse(
        &self,
        tree: &Value,
        out: &mut Map<String, Value>,
    ) -> Result<Option<String>, MappingError> {
        let field = self.target.as_str();
        let value = match tree.get(field) {
            Some(value) if !value.is_null() => value,
            _ => return Ok(None),
        };

        let mut parsed_from = None;
        match &self.rule {
            Rule::Copy { source }
            | Rule::Rename { source }
            | Rule::Nested { path: source }
            | Rule::Default { source, .. } => source.insert(out, value.clone()),
            Rule::DateFormat { source, pattern } => {
                let raw = value.as_str().ok_or_else(|| {
                    MappingError::format(field, display_value(value), "a formatted date string")
                })?;
                source.insert(out, pattern.parse(field, raw)?);
                parsed_from = Some(raw.to_string());
            }
            Rule::NumberFormat { source, pattern } => {
                let raw = value.as_str().ok_or_else(|| {
                    MappingError::format(field, display_value(value), "a formatted number string")
                })?;
                source.insert(out, pattern.parse(field, raw)?);
                parsed_from = Some(raw.to_string());
            }
            Rule::Collection {
                source, element, ..
            } => {
                let items = value.as_array().ok_or_else(|| {
                    MappingError::format(field, display_value(value), "a collection")
                })?;
                let restored = items
                    .iter()
                    .map(|item| element.inverse_value(item))
                    .collect::<Result<Vec<_>, _>>()?;
                source.insert(out, Value::Array(restored));
            }
            Rule::Computed { .. } | Rule::Ignore => {
                trace!(field, kind = %self.kind(), "not invertible, skipped");
                return Ok(None);
            }
        }

        trace!(field, kind = %self.kind(), "inverse rule applied");
        Ok(parsed_from)
    }
}

//! Evaluation context and the target field accessor.
//!
//! Targets are arbitrary domain records (an assessment, an entity, a user
//! row). The engine never depends on those types: a `Target` is a read-only
//! JSON document with a total dotted-path accessor. Any path that does not
//! resolve yields `FieldValue::Absent`, never a panic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WardenError, WardenResult};

/// The outcome of resolving a dotted path on a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// A segment was missing, indexed a scalar, or the value was JSON `null`.
    Absent,
    Present(&'a Value),
}

impl<'a> FieldValue<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn value(&self) -> Option<&'a Value> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Present(v) => Some(*v),
        }
    }

    /// The value as a string, if it is a JSON string.
    pub fn as_str(&self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }
}

/// A read-only target object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(Value);

impl Target {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a target from any serializable domain record.
    ///
    /// Returns `WardenError::InvalidTarget` if serialization fails (for
    /// example, a map with non-string keys).
    pub fn from_serialize<T: Serialize>(record: &T) -> WardenResult<Self> {
        serde_json::to_value(record)
            .map(Self)
            .map_err(|e| WardenError::InvalidTarget {
                reason: e.to_string(),
            })
    }

    /// Resolve a dot-notation path (e.g. `"entity.region"`).
    ///
    /// Object segments are looked up by key; a numeric segment indexes into
    /// an array. An empty path resolves to the whole document.
    pub fn field(&self, path: &str) -> FieldValue<'_> {
        resolve_path(&self.0, path)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Target {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Resolve a dotted path against any JSON value.
pub fn resolve_path<'v>(value: &'v Value, path: &str) -> FieldValue<'v> {
    let mut current = value;
    if !path.is_empty() {
        for segment in path.split('.') {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return FieldValue::Absent,
            }
        }
    }
    if current.is_null() {
        FieldValue::Absent
    } else {
        FieldValue::Present(current)
    }
}

/// Ambient data for one evaluation.
///
/// The acting user is passed alongside (or bound into an access guard), so
/// the context only carries what varies per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionContext {
    /// The record being read or mutated, if any.
    #[serde(default)]
    pub target: Option<Target>,
    /// Free-form request data, readable by `${context.*}` condition values.
    #[serde(default)]
    pub additional: Value,
}

impl PermissionContext {
    /// A context with no target and no additional data.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_target(target: impl Into<Target>) -> Self {
        Self {
            target: Some(target.into()),
            additional: Value::Null,
        }
    }

    pub fn with_additional(mut self, additional: Value) -> Self {
        self.additional = additional;
        self
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }
}

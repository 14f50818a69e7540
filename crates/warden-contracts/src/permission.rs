//! Permission and condition types.
//!
//! A `PermissionRecord` is what the persistence layer (or a TOML policy
//! document) supplies. The catalog validates records and turns them into
//! immutable `Permission` values; only validated permissions ever reach the
//! evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::PermissionId;

/// The breadth of a permission.
///
/// Example in TOML:
/// ```toml
/// scope = "global"
/// scope = "company"
/// scope = "own"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Applies to every target.
    #[default]
    Global,
    /// Applies only to targets belonging to the acting user's company.
    Company,
    /// Applies only to targets owned by the acting user.
    Own,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::Global => "global",
            Scope::Company => "company",
            Scope::Own => "own",
        };
        f.write_str(s)
    }
}

/// Comparison operator of a field-level condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Gt,
    Lt,
}

impl Operator {
    /// Parse the wire name of an operator. Returns `None` for anything the
    /// engine does not support.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Operator::Eq),
            "ne" => Some(Operator::Ne),
            "in" => Some(Operator::In),
            "not_in" => Some(Operator::NotIn),
            "gt" => Some(Operator::Gt),
            "lt" => Some(Operator::Lt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated field-level predicate.
///
/// `field` is a dotted path into the target object (e.g. `"status"` or
/// `"entity.region"`). `value` may be a literal or a placeholder string such
/// as `"${user.id}"` resolved at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// An immutable, validated catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique catalog id, e.g. `assessments:update` or `assessments:update:own`.
    pub id: PermissionId,
    pub resource: String,
    pub action: String,
    pub scope: Scope,
    /// Flat AND of predicates, evaluated in order.
    pub conditions: Vec<Condition>,
    pub description: Option<String>,
}

impl Permission {
    /// Return true if this permission grants `action` on `resource`.
    ///
    /// Matching is exact and case-sensitive; there are no wildcards.
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

/// A raw condition as it arrives from storage, before operator validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub field: String,
    /// Operator wire name. Unsupported names are rejected by the catalog.
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

/// A raw permission definition as it arrives from storage.
///
/// `resource` and `action` may be omitted, in which case they are taken from
/// the first two segments of `id`.
///
/// Example in TOML:
/// ```toml
/// [[permissions]]
/// id = "assessments:update:own"
/// scope = "own"
/// conditions = [{ field = "status", operator = "eq", value = "draft" }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PermissionRecord {
    /// A global, unconditional record whose resource/action come from `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource: None,
            action: None,
            scope: Scope::Global,
            conditions: Vec::new(),
            description: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_condition(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        self.conditions.push(ConditionRecord {
            field: field.into(),
            operator: operator.into(),
            value,
        });
        self
    }
}

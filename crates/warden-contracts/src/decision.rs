//! Evaluation outcomes.
//!
//! A denial is a `PermissionResult` with `allowed = false`, never an error.
//! The reason, candidate list and failed checks are diagnostics for logs and
//! internal tooling; end users only ever see `public_message()`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ids::PermissionId,
    permission::{Operator, Scope},
};

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A candidate passed its scope and every condition.
    Granted,
    /// The effective set holds nothing for the requested resource/action.
    NoMatchingPermission,
    /// Candidates existed but none passed scope and conditions.
    ScopeOrConditionFailed,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionReason::Granted => "Granted",
            DecisionReason::NoMatchingPermission => "NoMatchingPermission",
            DecisionReason::ScopeOrConditionFailed => "ScopeOrConditionFailed",
        };
        f.write_str(s)
    }
}

/// What exactly failed for a candidate permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    Scope {
        scope: Scope,
        detail: String,
    },
    Condition {
        field: String,
        operator: Operator,
        /// The condition value after placeholder substitution, if it resolved.
        expected: Option<Value>,
        /// The target's value at `field`; `None` when absent.
        actual: Option<Value>,
        detail: String,
    },
}

/// One failed scope or condition check on a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCheck {
    pub permission_id: PermissionId,
    pub failure: CheckFailure,
}

/// The result of one access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionResult {
    pub allowed: bool,
    pub reason: DecisionReason,
    /// Internal, human-readable explanation. Not for end users.
    pub message: String,
    /// Every candidate that matched on resource/action, in evaluation order.
    pub matching_permissions: Vec<PermissionId>,
    /// The candidate that granted access, when allowed.
    pub granted_by: Option<PermissionId>,
    /// Failures of the best-matching candidate, when denied.
    pub failed_checks: Vec<FailedCheck>,
}

impl PermissionResult {
    /// The only denial text that may reach an end user in production.
    pub const PUBLIC_DENIAL: &'static str = "not authorized";

    pub fn granted(by: PermissionId, matching_permissions: Vec<PermissionId>) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted,
            message: format!("granted by permission '{by}'"),
            matching_permissions,
            granted_by: Some(by),
            failed_checks: Vec::new(),
        }
    }

    pub fn no_matching_permission(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::NoMatchingPermission,
            message: message.into(),
            matching_permissions: Vec::new(),
            granted_by: None,
            failed_checks: Vec::new(),
        }
    }

    pub fn scope_or_condition_failed(
        message: impl Into<String>,
        matching_permissions: Vec<PermissionId>,
        failed_checks: Vec<FailedCheck>,
    ) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::ScopeOrConditionFailed,
            message: message.into(),
            matching_permissions,
            granted_by: None,
            failed_checks,
        }
    }

    /// Generic text safe to show an end user.
    pub fn public_message(&self) -> &'static str {
        if self.allowed {
            "authorized"
        } else {
            Self::PUBLIC_DENIAL
        }
    }
}

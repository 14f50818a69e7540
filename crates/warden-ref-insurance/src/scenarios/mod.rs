//! Insurance dashboard demo scenarios.
//!
//! Each scenario is a self-contained module that loads the built-in policy
//! into a real `AuthorizationEngine`, runs checks for mock users against mock
//! records, and prints the decisions.

pub mod assessment_workflow;
pub mod company_scope;
pub mod custom_roles;
pub mod missing_permission;
pub mod system_roles;

use warden_contracts::decision::PermissionResult;

/// One-line rendering of a decision for scenario output.
pub(crate) fn describe(result: &PermissionResult) -> String {
    match &result.granted_by {
        Some(by) => format!("ALLOW (granted by {by})"),
        None => format!("DENY  ({}: {})", result.reason, result.message),
    }
}

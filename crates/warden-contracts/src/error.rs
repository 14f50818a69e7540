//! Error taxonomy for the Warden engine.
//!
//! Load-time problems (`CatalogError`, `RoleGraphError`) are recoverable at
//! the snapshot level: a bad snapshot is rejected and the previous one keeps
//! serving. Access denials are not errors; see `PermissionResult`.

use thiserror::Error;

use crate::ids::{PermissionId, RoleId};

fn join_path(path: &[RoleId]) -> String {
    path.iter()
        .map(RoleId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_roles(roles: &[RoleId]) -> String {
    roles
        .iter()
        .map(RoleId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A permission definition was rejected by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate permission id '{id}'")]
    DuplicateId { id: String },

    #[error("malformed permission id '{id}': {reason}")]
    MalformedId { id: String, reason: String },

    #[error("permission '{id}' declares '{resource}:{action}', which does not match its id")]
    IdMismatch {
        id: String,
        resource: String,
        action: String,
    },

    #[error("permission '{id}' uses unsupported condition operator '{operator}'")]
    UnsupportedOperator { id: String, operator: String },

    #[error("permission '{id}' has a condition with an empty field path")]
    EmptyConditionField { id: String },

    #[error("permission '{id}': condition on '{field}' has an invalid value: {reason}")]
    InvalidConditionValue {
        id: String,
        field: String,
        reason: String,
    },

    #[error("permission '{id}' repeats the scope and conditions of '{existing}'")]
    DuplicateAlternative { id: String, existing: String },
}

/// The role graph rejected a definition or a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleGraphError {
    /// A role was reached again while still on the resolution path.
    #[error("role inheritance cycle detected: {}", join_path(path))]
    CycleDetected { path: Vec<RoleId> },

    #[error("unknown role '{role}'")]
    UnknownRole { role: RoleId },

    #[error("role '{role}' inherits from unknown role '{parent}'")]
    UnknownParent { role: RoleId, parent: RoleId },

    #[error("role '{role}' grants unknown permission '{permission}'")]
    UnknownPermission { role: RoleId, permission: PermissionId },

    #[error("role '{role}' is defined more than once")]
    DuplicateRole { role: RoleId },

    #[error("role '{role}' is a system role and cannot be modified")]
    SystemRoleImmutable { role: RoleId },

    #[error("role '{role}' is inherited by {} and cannot be deleted", join_roles(dependents))]
    RoleInUse {
        role: RoleId,
        dependents: Vec<RoleId>,
    },
}

/// The unified error type returned across Warden crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WardenError {
    #[error("catalog validation error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("role graph error: {0}")]
    RoleGraph(#[from] RoleGraphError),

    /// A policy document or engine setting is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A domain record could not be turned into a target document.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },
}

/// Convenience alias used throughout the Warden crates.
pub type WardenResult<T> = Result<T, WardenError>;

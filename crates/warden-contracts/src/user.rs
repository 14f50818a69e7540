//! The authorization view of a user.
//!
//! Only assignments live here. The effective permission set is derived state
//! owned by the aggregator and is never stored on, or persisted with, the
//! user record.

use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, PermissionId, RoleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuth {
    pub id: UserId,
    pub company_id: CompanyId,
    /// Assigned roles, in assignment order. Duplicates are ignored.
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    /// Permissions granted outside any role.
    #[serde(default)]
    pub direct_permissions: Vec<PermissionId>,
}

impl UserAuth {
    pub fn new(id: impl Into<UserId>, company_id: impl Into<CompanyId>) -> Self {
        Self {
            id: id.into(),
            company_id: company_id.into(),
            role_ids: Vec::new(),
            direct_permissions: Vec::new(),
        }
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.role_ids = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_direct_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionId>,
    {
        self.direct_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Return true if `role_id` is among the user's assigned roles.
    pub fn has_role_id(&self, role_id: &RoleId) -> bool {
        self.role_ids.contains(role_id)
    }
}

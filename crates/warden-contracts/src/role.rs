//! Role definitions.
//!
//! A role is a named bundle of permission ids plus an ordered list of roles
//! it inherits from. Roles arrive from storage already shaped like this; the
//! role graph checks that every reference resolves and that inheritance is
//! acyclic.

use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, PermissionId, RoleId};

fn default_active() -> bool {
    true
}

/// A role as loaded from storage.
///
/// Example in TOML:
/// ```toml
/// [[roles]]
/// id = "risk_analyst"
/// name = "risk_analyst"
/// display_name = "Risk Analyst"
/// permissions = ["assessments:create", "assessments:read"]
/// inherits_from = ["viewer"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Machine name used by coarse `has_role` checks.
    pub name: String,
    pub display_name: String,
    /// Permission ids granted directly, in declaration order.
    #[serde(default)]
    pub permissions: Vec<PermissionId>,
    /// Parent roles, in declaration order.
    #[serde(default)]
    pub inherits_from: Vec<RoleId>,
    /// Built-in roles shipped with the platform. Never mutated at runtime.
    #[serde(default)]
    pub is_system_role: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Set for a company's custom roles; `None` for platform-wide roles.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Role {
    /// An active, custom role with no permissions. `name` doubles as the
    /// display name until one is set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: RoleId::new(id),
            display_name: name.clone(),
            name,
            permissions: Vec::new(),
            inherits_from: Vec::new(),
            is_system_role: false,
            is_active: true,
            company_id: None,
            description: None,
        }
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionId>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn inheriting<I, R>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.inherits_from = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system_role = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn for_company(mut self, company_id: impl Into<CompanyId>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }
}

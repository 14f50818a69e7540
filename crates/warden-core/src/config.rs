//! Engine configuration.
//!
//! Deserialized from the `[engine]` table of a policy document. Every field
//! has a default, so an absent table yields `EngineConfig::default()`.
//!
//! ```toml
//! [engine]
//! cache_ttl_secs = 60
//! inactive_roles = "include"
//! company_field = "companyId"
//! ownership_fields = ["ownerId", "userId"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether inactive roles count toward effective permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InactiveRolePolicy {
    /// Inactive roles still resolve, for assignees and for inheritors.
    #[default]
    Include,
    /// An inactive role contributes nothing: neither its direct permissions
    /// nor anything it inherits.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the age of a cached effective-permission set. `0`
    /// disables expiry; entries then live until explicitly invalidated.
    pub cache_ttl_secs: u64,

    pub inactive_roles: InactiveRolePolicy,

    /// Target field compared with the user's company for `company` scope.
    pub company_field: String,

    /// Target fields checked, in order, for `own` scope. The first one
    /// present on the target decides.
    pub ownership_fields: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            inactive_roles: InactiveRolePolicy::Include,
            company_field: "companyId".to_string(),
            ownership_fields: vec!["ownerId".to_string(), "userId".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

//! Immutable policy snapshots.
//!
//! A snapshot pairs one catalog with one role graph. The engine serves from
//! exactly one snapshot at a time and replaces it whole; evaluators holding an
//! older `Arc<PolicySnapshot>` keep a consistent view until they drop it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use warden_contracts::ids::SnapshotId;

use crate::{catalog::Catalog, config::InactiveRolePolicy, role_graph::RoleGraph};

#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    pub id: SnapshotId,
    pub loaded_at: DateTime<Utc>,
    pub catalog: Arc<Catalog>,
    pub roles: RoleGraph,
}

impl PolicySnapshot {
    pub fn new(catalog: Arc<Catalog>, roles: RoleGraph) -> Self {
        Self {
            id: SnapshotId::new(),
            loaded_at: Utc::now(),
            catalog,
            roles,
        }
    }

    /// A snapshot with no permissions and no roles. Every check denies.
    pub fn empty(inactive_roles: InactiveRolePolicy) -> Self {
        Self::new(Arc::new(Catalog::default()), RoleGraph::empty(inactive_roles))
    }

    /// The successor snapshot after a role-graph edit: same catalog, new id.
    pub fn with_roles(&self, roles: RoleGraph) -> Self {
        Self::new(self.catalog.clone(), roles)
    }
}

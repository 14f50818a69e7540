//! The authorization engine: snapshot ownership and wiring.
//!
//! The engine owns the one current `PolicySnapshot` and routes every request
//! through the same pipeline:
//!
//!   snapshot → aggregator (cached effective set) → evaluator → result
//!
//! Writers never edit a snapshot in place. `reload` and the role mutation
//! entry points build a successor snapshot, swap it under the write lock, and
//! clear the user cache before releasing the lock. Readers clone the current
//! `Arc` and release the lock immediately, so a long evaluation never blocks
//! a writer and never observes a half-applied change.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use warden_contracts::{
    context::PermissionContext,
    decision::PermissionResult,
    error::{RoleGraphError, WardenResult},
    ids::{PermissionId, RoleId, SnapshotId, UserId},
    permission::PermissionRecord,
    role::Role,
    user::UserAuth,
};

use crate::{
    aggregator::{EffectivePermissions, PermissionAggregator},
    catalog::Catalog,
    config::EngineConfig,
    evaluator::PermissionEvaluator,
    guard::Guard,
    role_graph::RoleGraph,
    snapshot::PolicySnapshot,
};

/// Outcome of a successful `reload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub snapshot_id: SnapshotId,
    pub permissions: usize,
    pub roles: usize,
    /// Role definitions excluded from activation, with the reason.
    pub quarantined: Vec<RoleGraphError>,
}

pub struct AuthorizationEngine {
    config: EngineConfig,
    snapshot: RwLock<Arc<PolicySnapshot>>,
    aggregator: PermissionAggregator,
    evaluator: PermissionEvaluator,
}

impl AuthorizationEngine {
    /// An engine serving an empty snapshot. Every check denies until the
    /// first `reload`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(PolicySnapshot::empty(config.inactive_roles))),
            aggregator: PermissionAggregator::new(config.cache_ttl()),
            evaluator: PermissionEvaluator::from_config(&config),
            config,
        }
    }

    /// Build an engine and load its first snapshot.
    pub fn from_records(
        permissions: &[PermissionRecord],
        roles: Vec<Role>,
        config: EngineConfig,
    ) -> WardenResult<Self> {
        let engine = Self::new(config);
        engine.reload(permissions, roles)?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate new definitions and, if the catalog is sound, swap them in.
    ///
    /// A catalog error rejects the whole load and the previous snapshot keeps
    /// serving. Invalid roles do not: they are quarantined and listed in the
    /// report.
    pub fn reload(&self, permissions: &[PermissionRecord], roles: Vec<Role>) -> WardenResult<LoadReport> {
        let catalog = Arc::new(Catalog::load(permissions)?);
        let (graph, quarantined) = RoleGraph::build(roles, &catalog, self.config.inactive_roles);
        let next = Arc::new(PolicySnapshot::new(catalog, graph));

        let report = LoadReport {
            snapshot_id: next.id,
            permissions: next.catalog.len(),
            roles: next.roles.len(),
            quarantined,
        };

        {
            let mut current = self.snapshot_write();
            *current = next;
            self.aggregator.invalidate_all();
        }

        info!(
            snapshot_id = %report.snapshot_id,
            permissions = report.permissions,
            roles = report.roles,
            quarantined = report.quarantined.len(),
            "policy snapshot loaded"
        );
        Ok(report)
    }

    /// The snapshot currently serving requests.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot_read().clone()
    }

    pub fn effective_permissions(&self, user: &UserAuth) -> Arc<EffectivePermissions> {
        self.effective_permissions_in(&self.snapshot(), user)
    }

    pub fn evaluate(
        &self,
        user: &UserAuth,
        resource: &str,
        action: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        self.evaluate_in(&self.snapshot(), user, resource, action, ctx)
    }

    pub fn evaluate_permission(
        &self,
        user: &UserAuth,
        permission_id: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        self.evaluate_permission_in(&self.snapshot(), user, permission_id, ctx)
    }

    /// An access guard for `user`, pinned to the current snapshot.
    pub fn guard<'e>(&'e self, user: &'e UserAuth) -> Guard<'e> {
        Guard::new(self, user)
    }

    /// Drop the cached set for one user. Call after changing their role
    /// assignments or direct grants.
    pub fn invalidate_user(&self, user_id: &UserId) {
        self.aggregator.invalidate(user_id);
    }

    pub fn invalidate_users<'a>(&self, user_ids: impl IntoIterator<Item = &'a UserId>) {
        self.aggregator.invalidate_users(user_ids);
    }

    pub fn invalidate_all(&self) {
        self.aggregator.invalidate_all();
    }

    pub fn cached_users(&self) -> usize {
        self.aggregator.cached_len()
    }

    // ── Role administration ───────────────────────────────────────────────────

    pub fn create_role(&self, role: Role) -> WardenResult<SnapshotId> {
        let role_id = role.id.clone();
        self.mutate("create_role", &role_id, |s| {
            s.roles.with_role_created(role, &s.catalog)
        })
    }

    pub fn update_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: Vec<PermissionId>,
    ) -> WardenResult<SnapshotId> {
        self.mutate("update_role_permissions", role_id, |s| {
            s.roles.with_permissions_updated(role_id, permissions, &s.catalog)
        })
    }

    pub fn set_inheritance(&self, role_id: &RoleId, parents: Vec<RoleId>) -> WardenResult<SnapshotId> {
        self.mutate("set_inheritance", role_id, |s| {
            s.roles.with_inheritance(role_id, parents, &s.catalog)
        })
    }

    pub fn set_role_active(&self, role_id: &RoleId, active: bool) -> WardenResult<SnapshotId> {
        self.mutate("set_role_active", role_id, |s| {
            s.roles.with_role_active(role_id, active, &s.catalog)
        })
    }

    pub fn delete_role(&self, role_id: &RoleId) -> WardenResult<SnapshotId> {
        self.mutate("delete_role", role_id, |s| s.roles.without_role(role_id))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Apply a copy-on-write graph edit and swap the successor snapshot.
    ///
    /// The write lock is held from reading the current graph until the cache
    /// is cleared, so concurrent edits serialize and none is lost.
    fn mutate<F>(&self, operation: &'static str, role_id: &RoleId, edit: F) -> WardenResult<SnapshotId>
    where
        F: FnOnce(&PolicySnapshot) -> Result<RoleGraph, RoleGraphError>,
    {
        let mut current = self.snapshot_write();
        let roles = edit(&current)?;
        let next = Arc::new(current.with_roles(roles));
        let snapshot_id = next.id;
        *current = next;
        self.aggregator.invalidate_all();
        drop(current);

        info!(operation, role_id = %role_id, snapshot_id = %snapshot_id, "role graph updated");
        Ok(snapshot_id)
    }

    pub(crate) fn effective_permissions_in(
        &self,
        snapshot: &PolicySnapshot,
        user: &UserAuth,
    ) -> Arc<EffectivePermissions> {
        self.aggregator.compute_effective_permissions(snapshot, user)
    }

    pub(crate) fn evaluate_in(
        &self,
        snapshot: &PolicySnapshot,
        user: &UserAuth,
        resource: &str,
        action: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        let effective = self.effective_permissions_in(snapshot, user);
        self.evaluator.evaluate(&effective, user, resource, action, ctx)
    }

    pub(crate) fn evaluate_permission_in(
        &self,
        snapshot: &PolicySnapshot,
        user: &UserAuth,
        permission_id: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        let effective = self.effective_permissions_in(snapshot, user);
        self.evaluator.evaluate_permission(&effective, user, permission_id, ctx)
    }

    // Writers replace the whole `Arc`, so a poisoned lock still holds a
    // complete snapshot.
    fn snapshot_read(&self) -> RwLockReadGuard<'_, Arc<PolicySnapshot>> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_write(&self) -> RwLockWriteGuard<'_, Arc<PolicySnapshot>> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AuthorizationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

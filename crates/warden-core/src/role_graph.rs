//! Role graph and inheritance resolution.
//!
//! A role's effective permission set is its direct permissions plus the
//! effective sets of every role in `inherits_from`, resolved depth-first.
//! Each resolution keeps the path of roles currently being visited; reaching
//! a role that is already on the path is a cycle and fails the whole
//! resolution with `CycleDetected`. A partial set is never returned.
//!
//! The graph is a snapshot. Mutations (`with_role_created`,
//! `with_permissions_updated`, ...) leave `self` untouched and return a new
//! graph, so concurrent readers never see a half-applied edit. Resolved sets
//! are memoized; a mutation drops the memo of the edited role and of every
//! role that transitively inherits from it.
//!
//! Loading is lenient (`build`): a role that is malformed or sits on a cycle
//! is quarantined and reported while the rest of the graph keeps serving.
//! `new` is the strict variant and fails on the first problem.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::warn;

use warden_contracts::{
    error::RoleGraphError,
    ids::{PermissionId, RoleId},
    role::Role,
};

use crate::{catalog::Catalog, config::InactiveRolePolicy};

/// A resolved, de-duplicated set of permission ids.
pub type PermissionSet = Arc<BTreeSet<PermissionId>>;

#[derive(Debug)]
pub struct RoleGraph {
    roles: BTreeMap<RoleId, Role>,
    /// Roles excluded from activation, with the reason.
    quarantined: BTreeMap<RoleId, RoleGraphError>,
    inactive_roles: InactiveRolePolicy,
    memo: RwLock<HashMap<RoleId, PermissionSet>>,
}

impl Clone for RoleGraph {
    fn clone(&self) -> Self {
        Self {
            roles: self.roles.clone(),
            quarantined: self.quarantined.clone(),
            inactive_roles: self.inactive_roles,
            memo: RwLock::new(self.memo_read().clone()),
        }
    }
}

impl RoleGraph {
    /// An empty graph.
    pub fn empty(inactive_roles: InactiveRolePolicy) -> Self {
        Self {
            roles: BTreeMap::new(),
            quarantined: BTreeMap::new(),
            inactive_roles,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Build a graph, failing on the first invalid role or cycle.
    pub fn new(
        roles: Vec<Role>,
        catalog: &Catalog,
        inactive_roles: InactiveRolePolicy,
    ) -> Result<Self, RoleGraphError> {
        let (graph, mut problems) = Self::build(roles, catalog, inactive_roles);
        if problems.is_empty() {
            Ok(graph)
        } else {
            Err(problems.remove(0))
        }
    }

    /// Build a graph, quarantining every role that cannot be resolved.
    ///
    /// Returns the graph together with one error per rejected definition.
    /// Quarantined roles stay visible through `get` but resolve to their
    /// stored error, as does any role inheriting from them.
    pub fn build(
        roles: Vec<Role>,
        catalog: &Catalog,
        inactive_roles: InactiveRolePolicy,
    ) -> (Self, Vec<RoleGraphError>) {
        let mut graph = Self::empty(inactive_roles);
        let mut problems = Vec::new();

        for role in roles {
            if graph.roles.contains_key(&role.id) {
                problems.push(RoleGraphError::DuplicateRole {
                    role: role.id.clone(),
                });
                continue;
            }
            graph.roles.insert(role.id.clone(), role);
        }

        let ids: Vec<RoleId> = graph.roles.keys().cloned().collect();
        for id in &ids {
            if let Err(e) = graph.check_references(id, catalog) {
                graph.quarantined.insert(id.clone(), e.clone());
                problems.push(e);
            }
        }

        // Resolution fills the memo as a side effect, so every role that
        // survives this loop is already resolved.
        for id in &ids {
            if graph.quarantined.contains_key(id) {
                continue;
            }
            if let Err(e) = graph.resolve_effective_permissions(id) {
                graph.quarantined.insert(id.clone(), e.clone());
                problems.push(e);
            }
        }

        for problem in &problems {
            warn!(error = %problem, "role excluded from activation");
        }

        (graph, problems)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.name == name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn quarantined(&self) -> &BTreeMap<RoleId, RoleGraphError> {
        &self.quarantined
    }

    pub fn is_quarantined(&self, id: &RoleId) -> bool {
        self.quarantined.contains_key(id)
    }

    pub fn inactive_roles(&self) -> InactiveRolePolicy {
        self.inactive_roles
    }

    /// Every role that inherits from `id`, directly or transitively, sorted.
    pub fn dependents_of(&self, id: &RoleId) -> Vec<RoleId> {
        let mut found: BTreeSet<RoleId> = BTreeSet::new();
        let mut frontier = vec![id.clone()];

        while let Some(current) = frontier.pop() {
            for role in self.roles.values() {
                if role.inherits_from.contains(&current) && found.insert(role.id.clone()) {
                    frontier.push(role.id.clone());
                }
            }
        }

        found.remove(id);
        found.into_iter().collect()
    }

    /// Resolve the transitive permission set of `id`.
    pub fn resolve_effective_permissions(&self, id: &RoleId) -> Result<PermissionSet, RoleGraphError> {
        let mut path = Vec::new();
        self.resolve_inner(id, &mut path)
    }

    fn resolve_inner(
        &self,
        id: &RoleId,
        path: &mut Vec<RoleId>,
    ) -> Result<PermissionSet, RoleGraphError> {
        if let Some(set) = self.memo_read().get(id) {
            return Ok(set.clone());
        }

        if let Some(pos) = path.iter().position(|visiting| visiting == id) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(id.clone());
            return Err(RoleGraphError::CycleDetected { path: cycle });
        }

        if let Some(e) = self.quarantined.get(id) {
            return Err(e.clone());
        }

        let role = self
            .roles
            .get(id)
            .ok_or_else(|| RoleGraphError::UnknownRole { role: id.clone() })?;

        let contributes = role.is_active || self.inactive_roles == InactiveRolePolicy::Include;

        path.push(id.clone());
        let mut set: BTreeSet<PermissionId> = BTreeSet::new();
        if contributes {
            set.extend(role.permissions.iter().cloned());
        }
        for parent in &role.inherits_from {
            // Parents are resolved even for a non-contributing role so that a
            // cycle behind an inactive role is still reported.
            let inherited = self.resolve_inner(parent, path)?;
            if contributes {
                set.extend(inherited.iter().cloned());
            }
        }
        path.pop();

        let set = Arc::new(set);
        self.memo_write().insert(id.clone(), set.clone());
        Ok(set)
    }

    // ── Copy-on-write mutations ───────────────────────────────────────────────

    /// Return a graph with `role` added.
    ///
    /// System roles only come from loaded data; creating one at runtime is
    /// rejected with `SystemRoleImmutable`.
    pub fn with_role_created(&self, role: Role, catalog: &Catalog) -> Result<Self, RoleGraphError> {
        if role.is_system_role {
            return Err(RoleGraphError::SystemRoleImmutable { role: role.id });
        }
        if self.roles.contains_key(&role.id) {
            return Err(RoleGraphError::DuplicateRole { role: role.id });
        }

        let id = role.id.clone();
        let mut next = self.clone();
        next.roles.insert(id.clone(), role);
        next.revalidate(&id, catalog)?;
        Ok(next)
    }

    /// Return a graph where `id` grants exactly `permissions`.
    pub fn with_permissions_updated(
        &self,
        id: &RoleId,
        permissions: Vec<PermissionId>,
        catalog: &Catalog,
    ) -> Result<Self, RoleGraphError> {
        self.mutable_role(id)?;
        let mut next = self.clone();
        if let Some(role) = next.roles.get_mut(id) {
            role.permissions = permissions;
        }
        next.revalidate(id, catalog)?;
        Ok(next)
    }

    /// Return a graph where `id` inherits from exactly `parents`.
    ///
    /// Fails with `CycleDetected` if the new edges would close a cycle.
    pub fn with_inheritance(
        &self,
        id: &RoleId,
        parents: Vec<RoleId>,
        catalog: &Catalog,
    ) -> Result<Self, RoleGraphError> {
        self.mutable_role(id)?;
        let mut next = self.clone();
        if let Some(role) = next.roles.get_mut(id) {
            role.inherits_from = parents;
        }
        next.revalidate(id, catalog)?;
        Ok(next)
    }

    pub fn with_role_active(
        &self,
        id: &RoleId,
        active: bool,
        catalog: &Catalog,
    ) -> Result<Self, RoleGraphError> {
        self.mutable_role(id)?;
        let mut next = self.clone();
        if let Some(role) = next.roles.get_mut(id) {
            role.is_active = active;
        }
        next.revalidate(id, catalog)?;
        Ok(next)
    }

    /// Return a graph without `id`.
    ///
    /// A role that other roles inherit from cannot be deleted; detach the
    /// dependents first.
    pub fn without_role(&self, id: &RoleId) -> Result<Self, RoleGraphError> {
        self.mutable_role(id)?;
        let dependents = self.dependents_of(id);
        if !dependents.is_empty() {
            return Err(RoleGraphError::RoleInUse {
                role: id.clone(),
                dependents,
            });
        }

        let mut next = self.clone();
        next.roles.remove(id);
        next.quarantined.remove(id);
        next.memo_write().remove(id);
        Ok(next)
    }

    fn mutable_role(&self, id: &RoleId) -> Result<&Role, RoleGraphError> {
        let role = self
            .roles
            .get(id)
            .ok_or_else(|| RoleGraphError::UnknownRole { role: id.clone() })?;
        if role.is_system_role {
            return Err(RoleGraphError::SystemRoleImmutable { role: id.clone() });
        }
        Ok(role)
    }

    /// Drop memoized state for `id` and its dependents, then re-check them.
    ///
    /// The edited role must validate; a dependent that still fails (because
    /// it was broken for other reasons) stays quarantined.
    fn revalidate(&mut self, id: &RoleId, catalog: &Catalog) -> Result<(), RoleGraphError> {
        let dependents = self.dependents_of(id);
        {
            let mut memo = self.memo_write();
            memo.remove(id);
            for dependent in &dependents {
                memo.remove(dependent);
            }
        }
        self.quarantined.remove(id);
        for dependent in &dependents {
            self.quarantined.remove(dependent);
        }

        self.check_references(id, catalog)?;
        self.resolve_effective_permissions(id)?;

        for dependent in &dependents {
            let checked = self
                .check_references(dependent, catalog)
                .and_then(|_| self.resolve_effective_permissions(dependent).map(|_| ()));
            if let Err(e) = checked {
                warn!(role_id = %dependent, error = %e, "dependent role remains excluded");
                self.quarantined.insert(dependent.clone(), e);
            }
        }
        Ok(())
    }

    fn check_references(&self, id: &RoleId, catalog: &Catalog) -> Result<(), RoleGraphError> {
        let role = self
            .roles
            .get(id)
            .ok_or_else(|| RoleGraphError::UnknownRole { role: id.clone() })?;

        if let Some(parent) = role.inherits_from.iter().find(|p| !self.roles.contains_key(*p)) {
            return Err(RoleGraphError::UnknownParent {
                role: id.clone(),
                parent: parent.clone(),
            });
        }
        if let Some(permission) = role.permissions.iter().find(|p| !catalog.contains(p.as_str())) {
            return Err(RoleGraphError::UnknownPermission {
                role: id.clone(),
                permission: permission.clone(),
            });
        }
        Ok(())
    }

    // The memo only ever receives whole, fully resolved sets, so a poisoned
    // lock still guards consistent data.
    fn memo_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<RoleId, PermissionSet>> {
        self.memo.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn memo_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<RoleId, PermissionSet>> {
        self.memo.write().unwrap_or_else(PoisonError::into_inner)
    }
}

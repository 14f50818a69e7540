//! Engine-backed access guard for one user.

use std::sync::Arc;

use warden_contracts::{
    context::{PermissionContext, Target},
    decision::PermissionResult,
    ids::{PermissionId, RoleId},
    user::UserAuth,
};

use crate::{engine::AuthorizationEngine, snapshot::PolicySnapshot, traits::AccessGuard};

/// Binds an engine, a user, and the snapshot current at creation time.
///
/// Every check made through one guard sees the same snapshot, even if the
/// engine swaps in a new one meanwhile. Create a fresh guard per request.
pub struct Guard<'e> {
    engine: &'e AuthorizationEngine,
    user: &'e UserAuth,
    snapshot: Arc<PolicySnapshot>,
}

impl<'e> Guard<'e> {
    pub(crate) fn new(engine: &'e AuthorizationEngine, user: &'e UserAuth) -> Self {
        Self {
            engine,
            user,
            snapshot: engine.snapshot(),
        }
    }

    pub fn user(&self) -> &UserAuth {
        self.user
    }

    /// Full decision for one permission id, for callers that want the reason.
    pub fn check_permission(&self, permission_id: &str, ctx: &PermissionContext) -> PermissionResult {
        self.engine
            .evaluate_permission_in(&self.snapshot, self.user, permission_id, ctx)
    }

    /// Ids of every permission the user holds, in catalog order.
    ///
    /// Holding an id does not mean every target passes its scope and
    /// conditions; use it to build menus, not to authorize.
    pub fn permission_ids(&self) -> Vec<PermissionId> {
        self.engine
            .effective_permissions_in(&self.snapshot, self.user)
            .ids()
            .cloned()
            .collect()
    }
}

impl AccessGuard for Guard<'_> {
    fn has_permission(&self, permission_id: &str, ctx: &PermissionContext) -> bool {
        self.check_permission(permission_id, ctx).allowed
    }

    fn can_access_resource(
        &self,
        resource: &str,
        action: &str,
        target: Option<&Target>,
    ) -> PermissionResult {
        let ctx = PermissionContext {
            target: target.cloned(),
            ..PermissionContext::default()
        };
        self.engine
            .evaluate_in(&self.snapshot, self.user, resource, action, &ctx)
    }

    fn has_role(&self, name: &str) -> bool {
        if self.user.has_role_id(&RoleId::new(name)) {
            return true;
        }
        self.user.role_ids.iter().any(|role_id| {
            self.snapshot
                .roles
                .get(role_id)
                .is_some_and(|role| role.name == name)
        })
    }
}

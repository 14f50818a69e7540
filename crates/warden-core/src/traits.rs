//! The access-guard boundary.
//!
//! `AccessGuard` is what route middleware, UI guards and other subsystems
//! program against. `Guard` is the engine-backed implementation; callers may
//! substitute their own (for example a fixed allow-list in tests).

use warden_contracts::{
    context::{PermissionContext, Target},
    decision::PermissionResult,
};

/// Access checks for one acting user.
///
/// The boolean methods never panic and treat any doubt as `false`, so UI
/// code can render a fallback without error handling.
pub trait AccessGuard {
    /// True if the user holds `permission_id` and its scope and conditions
    /// pass for `ctx`.
    fn has_permission(&self, permission_id: &str, ctx: &PermissionContext) -> bool;

    /// True if any of `permission_ids` passes. Stops at the first success.
    fn has_any_permission(&self, permission_ids: &[&str], ctx: &PermissionContext) -> bool {
        permission_ids.iter().any(|id| self.has_permission(id, ctx))
    }

    /// True if every one of `permission_ids` passes. Stops at the first
    /// failure. An empty list is vacuously true.
    fn has_all_permissions(&self, permission_ids: &[&str], ctx: &PermissionContext) -> bool {
        permission_ids.iter().all(|id| self.has_permission(id, ctx))
    }

    /// Full decision for `action` on `resource` against `target`.
    fn can_access_resource(
        &self,
        resource: &str,
        action: &str,
        target: Option<&Target>,
    ) -> PermissionResult;

    /// Coarse role-membership check for UI affordances.
    ///
    /// Bypasses permission resolution entirely. Never use it in place of a
    /// permission check before a mutating operation.
    fn has_role(&self, name: &str) -> bool;

    fn has_any_role(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_role(name))
    }
}

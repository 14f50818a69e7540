//! # warden-core
//!
//! The permission evaluation core of Warden.
//!
//! This crate provides:
//! - `Catalog`: validated permission definitions, indexed by id and by
//!   `(resource, action)`
//! - `RoleGraph`: role inheritance with cycle detection and copy-on-write edits
//! - `PermissionAggregator`: per-user effective permission sets, cached
//! - `PermissionEvaluator`: scope and condition checks, first match wins
//! - `AuthorizationEngine`: the snapshot owner that wires them together
//! - `AccessGuard` / `Guard`: the boolean façade used by routes and UI code
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{AuthorizationEngine, EngineConfig, traits::AccessGuard};
//!
//! let engine = AuthorizationEngine::from_records(&permissions, roles, EngineConfig::default())?;
//! let allowed = engine.guard(&user).has_permission("assessments:create", &ctx);
//! ```

pub mod aggregator;
pub mod catalog;
pub mod condition;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod guard;
pub mod role_graph;
pub mod snapshot;
pub mod traits;

pub use aggregator::{EffectivePermissions, PermissionAggregator};
pub use catalog::Catalog;
pub use config::{EngineConfig, InactiveRolePolicy};
pub use engine::{AuthorizationEngine, LoadReport};
pub use evaluator::PermissionEvaluator;
pub use guard::Guard;
pub use role_graph::{PermissionSet, RoleGraph};
pub use snapshot::PolicySnapshot;
pub use traits::AccessGuard;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use warden_contracts::{
        context::{PermissionContext, Target},
        decision::{DecisionReason, PermissionResult},
        permission::{PermissionRecord, Scope},
        role::Role,
        user::UserAuth,
    };

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn engine() -> AuthorizationEngine {
        AuthorizationEngine::from_records(
            &[
                PermissionRecord::new("dashboard:read"),
                PermissionRecord::new("reports:read").with_scope(Scope::Company),
                PermissionRecord::new("reports:export").with_scope(Scope::Company),
                PermissionRecord::new("assessments:update:own").with_scope(Scope::Own),
            ],
            vec![
                Role::new("viewer", "viewer").with_permissions(["dashboard:read", "reports:read"]),
                Role::new("role-7f3", "risk_manager")
                    .inheriting(["viewer"])
                    .with_permissions(["reports:export", "assessments:update:own"]),
            ],
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn viewer() -> UserAuth {
        UserAuth::new("u-1", "acme").with_roles(["viewer"])
    }

    fn manager() -> UserAuth {
        UserAuth::new("u-2", "acme").with_roles(["role-7f3"])
    }

    fn acme() -> PermissionContext {
        PermissionContext::for_target(json!({ "companyId": "acme" }))
    }

    // ── 1. composites ─────────────────────────────────────────────────────────

    #[test]
    fn test_any_and_all_permissions() {
        let engine = engine();
        let user = viewer();
        let guard = engine.guard(&user);

        assert!(guard.has_any_permission(&["reports:export", "reports:read"], &acme()));
        assert!(!guard.has_any_permission(&["reports:export"], &acme()));
        assert!(!guard.has_any_permission(&[], &acme()));

        assert!(guard.has_all_permissions(&["dashboard:read", "reports:read"], &acme()));
        assert!(!guard.has_all_permissions(&["dashboard:read", "reports:export"], &acme()));
        assert!(guard.has_all_permissions(&[], &acme()));
    }

    /// A guard that counts calls, to observe short-circuiting through the
    /// default trait methods.
    struct Counting {
        allow: HashSet<&'static str>,
        calls: std::cell::Cell<usize>,
    }

    impl AccessGuard for Counting {
        fn has_permission(&self, permission_id: &str, _ctx: &PermissionContext) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.allow.contains(permission_id)
        }

        fn can_access_resource(&self, _: &str, _: &str, _: Option<&Target>) -> PermissionResult {
            PermissionResult::no_matching_permission("test double")
        }

        fn has_role(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_composites_short_circuit() {
        let guard = Counting {
            allow: HashSet::from(["a"]),
            calls: std::cell::Cell::new(0),
        };
        let ctx = PermissionContext::empty();

        assert!(guard.has_any_permission(&["a", "b", "c"], &ctx));
        assert_eq!(guard.calls.get(), 1);

        guard.calls.set(0);
        assert!(!guard.has_all_permissions(&["b", "a", "c"], &ctx));
        assert_eq!(guard.calls.get(), 1);
    }

    // ── 2. roles ──────────────────────────────────────────────────────────────

    /// `has_role` accepts the role id or its display name.
    #[test]
    fn test_has_role_by_id_or_name() {
        let engine = engine();
        let user = manager();
        let guard = engine.guard(&user);
        assert!(guard.has_role("role-7f3"));
        assert!(guard.has_role("risk_manager"));
        // Membership is literal: inherited roles are not reported.
        assert!(!guard.has_role("viewer"));
        assert!(guard.has_any_role(&["admin", "risk_manager"]));
        assert!(!guard.has_any_role(&[]));

        // Plain membership: an assigned id counts even if the snapshot does
        // not define it.
        let ghost = UserAuth::new("u-3", "acme").with_roles(["retired_role"]);
        assert!(ghost.has_role_id(&"retired_role".into()));
        assert!(engine.guard(&ghost).has_role("retired_role"));
        assert!(!engine.guard(&ghost).has_permission("dashboard:read", &acme()));
    }

    // ── 3. guard pinning ──────────────────────────────────────────────────────

    #[test]
    fn test_guard_reports_reasons_and_ids() {
        let engine = engine();
        let user = manager();
        let guard = engine.guard(&user);

        let ids: Vec<String> = guard.permission_ids().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            ids,
            vec!["dashboard:read", "reports:read", "reports:export", "assessments:update:own"]
        );

        let mine = Target::new(json!({ "ownerId": "u-2" }));
        assert!(guard.can_access_resource("assessments", "update", Some(&mine)).allowed);

        let theirs = Target::new(json!({ "ownerId": "u-9" }));
        let denied = guard.can_access_resource("assessments", "update", Some(&theirs));
        assert_eq!(denied.reason, DecisionReason::ScopeOrConditionFailed);
        assert_eq!(denied.public_message(), "not authorized");

        let checked = guard.check_permission("reports:export", &PermissionContext::empty());
        assert!(!checked.allowed);
    }

    /// A guard keeps the snapshot it was created with.
    #[test]
    fn test_guard_is_pinned_to_its_snapshot() {
        let engine = engine();
        let user = viewer();
        let guard = engine.guard(&user);

        engine.reload(&[], Vec::new()).unwrap();

        assert!(guard.has_permission("dashboard:read", &acme()));
        assert!(!engine.guard(&user).has_permission("dashboard:read", &acme()));
    }
}

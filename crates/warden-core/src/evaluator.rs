//! The permission evaluator: the decision core.
//!
//! Evaluation algorithm, for a request of `action` on `resource`:
//!
//! 1. Take the user's effective permission set (from the aggregator).
//! 2. Keep the entries matching `(resource, action)`; these are the
//!    candidates. No candidates ⇒ deny with `NoMatchingPermission`.
//! 3. Try candidates in catalog order. The first one that passes
//!    a. its scope check (`global` always; `company` when the target's
//!       company matches the user's; `own` when the target's ownership field
//!       equals the user id), and
//!    b. every one of its conditions,
//!    grants access.
//! 4. Otherwise deny with `ScopeOrConditionFailed`, reporting the failures of
//!    the best candidate: the first that passed scope but failed a condition,
//!    else the first candidate.
//!
//! Evaluation reads only its arguments. It performs no I/O, holds no locks,
//! and cannot fail: every anomaly resolves to a deny.

use std::sync::Arc;

use tracing::debug;

use warden_contracts::{
    context::{PermissionContext, Target},
    decision::{CheckFailure, FailedCheck, PermissionResult},
    ids::PermissionId,
    permission::{Permission, Scope},
    user::UserAuth,
};

use crate::{
    aggregator::EffectivePermissions,
    condition::{evaluate_condition, id_string},
    config::EngineConfig,
};

#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    company_field: String,
    ownership_fields: Vec<String>,
}

impl PermissionEvaluator {
    pub fn new(company_field: impl Into<String>, ownership_fields: Vec<String>) -> Self {
        Self {
            company_field: company_field.into(),
            ownership_fields,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.company_field.clone(), config.ownership_fields.clone())
    }

    /// Decide whether `user` may perform `action` on `resource`.
    pub fn evaluate(
        &self,
        effective: &EffectivePermissions,
        user: &UserAuth,
        resource: &str,
        action: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        let candidates: Vec<&Arc<Permission>> = effective.candidates(resource, action).collect();

        let result = if candidates.is_empty() {
            PermissionResult::no_matching_permission(format!(
                "no permission in the effective set grants '{action}' on '{resource}'"
            ))
        } else {
            self.decide(&candidates, user, ctx, &format!("{resource}:{action}"))
        };

        debug!(
            user_id = %user.id,
            resource = %resource,
            action = %action,
            allowed = result.allowed,
            reason = %result.reason,
            "permission evaluated"
        );
        result
    }

    /// Decide whether `user` holds `permission_id` for this context.
    ///
    /// The candidate set is the single named permission, and its scope and
    /// conditions still apply: holding the id is not enough on its own.
    pub fn evaluate_permission(
        &self,
        effective: &EffectivePermissions,
        user: &UserAuth,
        permission_id: &str,
        ctx: &PermissionContext,
    ) -> PermissionResult {
        let result = match effective.get(permission_id) {
            None => PermissionResult::no_matching_permission(format!(
                "permission '{permission_id}' is not in the effective set"
            )),
            Some(permission) => self.decide(&[permission], user, ctx, permission_id),
        };

        debug!(
            user_id = %user.id,
            permission_id = %permission_id,
            allowed = result.allowed,
            reason = %result.reason,
            "permission evaluated"
        );
        result
    }

    fn decide(
        &self,
        candidates: &[&Arc<Permission>],
        user: &UserAuth,
        ctx: &PermissionContext,
        requested: &str,
    ) -> PermissionResult {
        let matching: Vec<PermissionId> = candidates.iter().map(|p| p.id.clone()).collect();

        let mut first_failure: Option<Vec<FailedCheck>> = None;
        let mut condition_failure: Option<Vec<FailedCheck>> = None;

        for permission in candidates {
            if let Err(detail) = self.check_scope(permission, user, ctx.target()) {
                if first_failure.is_none() {
                    first_failure = Some(vec![FailedCheck {
                        permission_id: permission.id.clone(),
                        failure: CheckFailure::Scope {
                            scope: permission.scope,
                            detail,
                        },
                    }]);
                }
                continue;
            }

            let failed: Vec<FailedCheck> = permission
                .conditions
                .iter()
                .filter_map(|condition| evaluate_condition(condition, user, ctx).err())
                .map(|failure| FailedCheck {
                    permission_id: permission.id.clone(),
                    failure,
                })
                .collect();

            if failed.is_empty() {
                return PermissionResult::granted(permission.id.clone(), matching);
            }

            if condition_failure.is_none() {
                condition_failure = Some(failed.clone());
            }
            if first_failure.is_none() {
                first_failure = Some(failed);
            }
        }

        PermissionResult::scope_or_condition_failed(
            format!(
                "{} candidate permission(s) for '{requested}' failed scope or condition checks",
                candidates.len()
            ),
            matching,
            condition_failure.or(first_failure).unwrap_or_default(),
        )
    }

    fn check_scope(
        &self,
        permission: &Permission,
        user: &UserAuth,
        target: Option<&Target>,
    ) -> Result<(), String> {
        match permission.scope {
            Scope::Global => Ok(()),

            Scope::Company => {
                let target = target.ok_or("company-scoped permission requires a target")?;
                match target.field(&self.company_field).value().and_then(id_string) {
                    Some(company) if company == user.company_id.as_str() => Ok(()),
                    Some(company) => Err(format!(
                        "target {} '{company}' is not the user's company '{}'",
                        self.company_field, user.company_id
                    )),
                    None => Err(format!("target has no {}", self.company_field)),
                }
            }

            Scope::Own => {
                let target = target.ok_or("owner-scoped permission requires a target")?;
                let owner = self
                    .ownership_fields
                    .iter()
                    .find_map(|field| target.field(field).value().map(|v| (field, v)));
                match owner {
                    Some((field, value)) => match id_string(value) {
                        Some(id) if id == user.id.as_str() => Ok(()),
                        _ => Err(format!("target {field} {value} is not user '{}'", user.id)),
                    },
                    None => Err(format!(
                        "target has none of the ownership fields [{}]",
                        self.ownership_fields.join(", ")
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use warden_contracts::{
        decision::DecisionReason,
        permission::PermissionRecord,
        role::Role,
    };

    use super::*;
    use crate::{
        aggregator::PermissionAggregator, catalog::Catalog, config::InactiveRolePolicy,
        role_graph::RoleGraph, snapshot::PolicySnapshot,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn snapshot() -> PolicySnapshot {
        let catalog = Catalog::load(&[
            PermissionRecord::new("dashboard:read"),
            PermissionRecord::new("assessments:create").with_scope(Scope::Company),
            PermissionRecord::new("assessments:update:own")
                .with_scope(Scope::Own)
                .with_condition("status", "eq", json!("draft")),
            PermissionRecord::new("assessments:update").with_scope(Scope::Company),
            PermissionRecord::new("assessments:approve")
                .with_scope(Scope::Company)
                .with_condition("status", "eq", json!("submitted"))
                .with_condition("riskScore", "lt", json!(80)),
        ])
        .unwrap();
        let roles = RoleGraph::new(
            vec![
                Role::new("analyst", "analyst").with_permissions([
                    "dashboard:read",
                    "assessments:create",
                    "assessments:update:own",
                ]),
                Role::new("manager", "manager")
                    .with_permissions(["assessments:update", "assessments:approve"])
                    .inheriting(["analyst"]),
            ],
            &catalog,
            InactiveRolePolicy::Include,
        )
        .unwrap();
        PolicySnapshot::new(Arc::new(catalog), roles)
    }

    fn evaluator() -> PermissionEvaluator {
        PermissionEvaluator::from_config(&EngineConfig::default())
    }

    fn effective(user: &UserAuth) -> EffectivePermissions {
        PermissionAggregator::materialize(&snapshot(), user)
    }

    fn analyst() -> UserAuth {
        UserAuth::new("u-1", "acme").with_roles(["analyst"])
    }

    fn manager() -> UserAuth {
        UserAuth::new("u-9", "acme").with_roles(["manager"])
    }

    fn eval(user: &UserAuth, resource: &str, action: &str, ctx: &PermissionContext) -> PermissionResult {
        evaluator().evaluate(&effective(user), user, resource, action, ctx)
    }

    // ── 1. candidate selection ────────────────────────────────────────────────

    #[test]
    fn test_no_candidates_is_no_matching_permission() {
        let result = eval(&analyst(), "entities", "delete", &PermissionContext::empty());
        assert!(!result.allowed);
        assert_eq!(result.reason, DecisionReason::NoMatchingPermission);
        assert!(result.matching_permissions.is_empty());
    }

    #[test]
    fn test_global_scope_needs_no_target() {
        let result = eval(&analyst(), "dashboard", "read", &PermissionContext::empty());
        assert!(result.allowed);
        assert_eq!(result.granted_by, Some(PermissionId::new("dashboard:read")));
    }

    // ── 2. company scope ──────────────────────────────────────────────────────

    #[test]
    fn test_company_scope_matches_user_company() {
        let same = PermissionContext::for_target(json!({ "companyId": "acme" }));
        assert!(eval(&analyst(), "assessments", "create", &same).allowed);

        let other = PermissionContext::for_target(json!({ "companyId": "other" }));
        let result = eval(&analyst(), "assessments", "create", &other);
        assert!(!result.allowed);
        assert_eq!(result.reason, DecisionReason::ScopeOrConditionFailed);
        assert!(matches!(
            result.failed_checks[0].failure,
            CheckFailure::Scope { scope: Scope::Company, .. }
        ));
    }

    /// Absence of a target is never implicit access.
    #[test]
    fn test_company_scope_without_target_denies() {
        let result = eval(&analyst(), "assessments", "create", &PermissionContext::empty());
        assert!(!result.allowed);
        assert_eq!(result.reason, DecisionReason::ScopeOrConditionFailed);
    }

    // ── 3. own scope ──────────────────────────────────────────────────────────

    #[test]
    fn test_own_scope_compares_owner_with_user() {
        let mine = PermissionContext::for_target(json!({ "ownerId": "u-1", "status": "draft" }));
        let theirs = PermissionContext::for_target(json!({ "ownerId": "u-2", "status": "draft" }));

        assert!(eval(&analyst(), "assessments", "update", &mine).allowed);
        assert!(!eval(&analyst(), "assessments", "update", &theirs).allowed);
    }

    #[test]
    fn test_own_scope_falls_back_to_user_id_field() {
        let ctx = PermissionContext::for_target(json!({ "userId": "u-1", "status": "draft" }));
        assert!(eval(&analyst(), "assessments", "update", &ctx).allowed);

        let no_owner = PermissionContext::for_target(json!({ "status": "draft" }));
        assert!(!eval(&analyst(), "assessments", "update", &no_owner).allowed);
    }

    // ── 4. alternatives and failure reporting ─────────────────────────────────

    /// The own-scoped alternative is tried first; the company-wide one still
    /// grants the manager access to someone else's record.
    #[test]
    fn test_first_passing_alternative_wins() {
        let ctx = PermissionContext::for_target(json!({
            "ownerId": "u-1",
            "companyId": "acme",
            "status": "submitted"
        }));
        let result = eval(&manager(), "assessments", "update", &ctx);
        assert!(result.allowed);
        assert_eq!(result.granted_by, Some(PermissionId::new("assessments:update")));
        assert_eq!(
            result.matching_permissions,
            vec![
                PermissionId::new("assessments:update:own"),
                PermissionId::new("assessments:update")
            ]
        );
    }

    /// The candidate that passed scope but failed a condition is reported in
    /// preference to one that failed scope.
    #[test]
    fn test_best_candidate_reported_on_denial() {
        let ctx = PermissionContext::for_target(json!({
            "ownerId": "u-9",
            "companyId": "other",
            "status": "final"
        }));
        let result = eval(&manager(), "assessments", "update", &ctx);
        assert!(!result.allowed);
        assert_eq!(result.matching_permissions.len(), 2);
        assert_eq!(result.failed_checks.len(), 1);
        assert_eq!(
            result.failed_checks[0].permission_id,
            PermissionId::new("assessments:update:own")
        );
        assert!(matches!(result.failed_checks[0].failure, CheckFailure::Condition { .. }));
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let low = PermissionContext::for_target(json!({
            "companyId": "acme", "status": "submitted", "riskScore": 40
        }));
        let high = PermissionContext::for_target(json!({
            "companyId": "acme", "status": "submitted", "riskScore": 95
        }));
        let missing = PermissionContext::for_target(json!({
            "companyId": "acme", "status": "submitted"
        }));

        assert!(eval(&manager(), "assessments", "approve", &low).allowed);
        assert!(!eval(&manager(), "assessments", "approve", &high).allowed);
        assert!(!eval(&manager(), "assessments", "approve", &missing).allowed);
    }

    // ── 5. permission-id checks ───────────────────────────────────────────────

    #[test]
    fn test_evaluate_permission_still_applies_scope() {
        let user = analyst();
        let effective = effective(&user);

        let other = PermissionContext::for_target(json!({ "companyId": "other" }));
        let result = evaluator().evaluate_permission(&effective, &user, "assessments:create", &other);
        assert!(!result.allowed);
        assert_eq!(result.reason, DecisionReason::ScopeOrConditionFailed);

        let missing =
            evaluator().evaluate_permission(&effective, &user, "assessments:approve", &other);
        assert_eq!(missing.reason, DecisionReason::NoMatchingPermission);
    }

    /// Evaluation has no hidden state: repeated calls agree exactly.
    #[test]
    fn test_evaluate_is_idempotent() {
        let user = manager();
        let effective = effective(&user);
        let ctx = PermissionContext::for_target(json!({ "companyId": "acme", "status": "x" }));

        let first = evaluator().evaluate(&effective, &user, "assessments", "approve", &ctx);
        let second = evaluator().evaluate(&effective, &user, "assessments", "approve", &ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn test_numeric_identifiers_compare_as_strings() {
        let user = UserAuth::new("42", "7").with_roles(["analyst"]);
        let effective = effective(&user);
        let ctx = PermissionContext::for_target(json!({ "companyId": 7, "ownerId": 42, "status": "draft" }));

        assert!(evaluator().evaluate(&effective, &user, "assessments", "create", &ctx).allowed);
        assert!(evaluator().evaluate(&effective, &user, "assessments", "update", &ctx).allowed);
    }
}

//! # warden-policy
//!
//! TOML policy documents for the Warden permission engine.
//!
//! ## Overview
//!
//! This crate provides [`PolicyDocument`], the on-disk form of a permission
//! catalog plus role definitions plus engine settings. Built-in roles and
//! permissions are data, shipped as TOML, not control flow.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use warden_policy::PolicyDocument;
//!
//! let (engine, report) = PolicyDocument::from_file(Path::new("policies/insurance.toml"))?
//!     .into_engine()?;
//! ```

pub mod document;

pub use document::PolicyDocument;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use warden_contracts::{
        context::PermissionContext,
        decision::DecisionReason,
        error::{CatalogError, RoleGraphError, WardenError},
        permission::{Operator, Scope},
        user::UserAuth,
    };
    use warden_core::{AccessGuard, InactiveRolePolicy};

    use crate::PolicyDocument;

    const BASE: &str = r#"
        [engine]
        cache_ttl_secs = 0
        inactive_roles = "exclude"

        [[permissions]]
        id = "dashboard:read"

        [[permissions]]
        id = "assessments:approve"
        scope = "company"
        conditions = [
            { field = "status", operator = "eq", value = "submitted" },
            { field = "riskScore", operator = "lt", value = 80 },
        ]

        [[roles]]
        id = "viewer"
        name = "viewer"
        display_name = "Viewer"
        permissions = ["dashboard:read"]

        [[roles]]
        id = "risk_manager"
        name = "risk_manager"
        display_name = "Risk Manager"
        permissions = ["assessments:approve"]
        inherits_from = ["viewer"]
    "#;

    // ── 1. parsing ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_full_document() {
        let doc = PolicyDocument::from_toml_str(BASE).unwrap();

        assert_eq!(doc.engine.cache_ttl(), None);
        assert_eq!(doc.engine.inactive_roles, InactiveRolePolicy::Exclude);
        // Unset engine keys keep their defaults.
        assert_eq!(doc.engine.company_field, "companyId");

        assert_eq!(doc.permissions.len(), 2);
        let approve = &doc.permissions[1];
        assert_eq!(approve.scope, Scope::Company);
        assert_eq!(approve.conditions[1].value, json!(80));

        assert_eq!(doc.roles[1].inherits_from[0].as_str(), "viewer");
        assert!(doc.roles[1].is_active);
        assert!(!doc.roles[1].is_system_role);
    }

    /// An empty document is valid and yields an engine that denies everything.
    #[test]
    fn test_empty_document() {
        let (engine, report) = PolicyDocument::from_toml_str("").unwrap().into_engine().unwrap();
        assert_eq!(report.permissions, 0);
        let user = UserAuth::new("u-1", "acme");
        assert!(!engine.guard(&user).has_permission("dashboard:read", &PermissionContext::empty()));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = PolicyDocument::from_toml_str("[[permissions]\nid = ").unwrap_err();
        match err {
            WardenError::ConfigError { reason } => {
                assert!(
                    reason.contains("failed to parse policy TOML"),
                    "unexpected reason: {reason}"
                );
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    /// Schema violations (a role without a name) are parse errors too.
    #[test]
    fn test_schema_violation_is_config_error() {
        let err = PolicyDocument::from_toml_str(
            r#"
            [[roles]]
            id = "viewer"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, WardenError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PolicyDocument::from_file(Path::new("/nonexistent/warden/policy.toml")).unwrap_err();
        match err {
            WardenError::ConfigError { reason } => {
                assert!(reason.contains("failed to read policy file"), "unexpected reason: {reason}");
                assert!(reason.contains("/nonexistent/warden/policy.toml"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    // ── 2. validation ─────────────────────────────────────────────────────────

    /// Operators are accepted as strings by the parser and rejected by the
    /// catalog, so the error names the offending permission.
    #[test]
    fn test_unsupported_operator_fails_validation() {
        let doc = PolicyDocument::from_toml_str(
            r#"
            [[permissions]]
            id = "entities:read"
            conditions = [{ field = "region", operator = "like", value = "em%" }]
            "#,
        )
        .unwrap();

        assert_eq!(
            doc.validate().unwrap_err(),
            WardenError::Catalog(CatalogError::UnsupportedOperator {
                id: "entities:read".to_string(),
                operator: "like".to_string(),
            })
        );
        assert!(doc.into_engine().is_err());
    }

    #[test]
    fn test_role_cycle_is_quarantined_not_fatal() {
        let mut doc = PolicyDocument::from_toml_str(BASE).unwrap();
        doc.extend(
            PolicyDocument::from_toml_str(
                r#"
                [[roles]]
                id = "a"
                name = "a"
                display_name = "A"
                inherits_from = ["b"]

                [[roles]]
                id = "b"
                name = "b"
                display_name = "B"
                inherits_from = ["a"]
                "#,
            )
            .unwrap(),
        );

        let quarantined = doc.validate().unwrap();
        assert_eq!(quarantined.len(), 2);
        assert!(quarantined
            .iter()
            .all(|e| matches!(e, RoleGraphError::CycleDetected { .. })));

        let (_, report) = doc.into_engine().unwrap();
        assert_eq!(report.roles, 4);
        assert_eq!(report.quarantined.len(), 2);
    }

    // ── 3. engine construction ────────────────────────────────────────────────

    #[test]
    fn test_engine_honors_document() {
        let (engine, report) = PolicyDocument::from_toml_str(BASE).unwrap().into_engine().unwrap();
        assert_eq!(report.permissions, 2);
        assert_eq!(report.roles, 2);
        assert!(report.quarantined.is_empty());
        assert_eq!(engine.config().inactive_roles, InactiveRolePolicy::Exclude);

        let manager = UserAuth::new("u-1", "acme").with_roles(["risk_manager"]);
        let approvable = PermissionContext::for_target(json!({
            "companyId": "acme",
            "status": "submitted",
            "riskScore": 42,
        }));
        assert!(engine.evaluate(&manager, "assessments", "approve", &approvable).allowed);

        let risky = PermissionContext::for_target(json!({
            "companyId": "acme",
            "status": "submitted",
            "riskScore": 91,
        }));
        let denied = engine.evaluate(&manager, "assessments", "approve", &risky);
        assert_eq!(denied.reason, DecisionReason::ScopeOrConditionFailed);
        assert_eq!(denied.failed_checks.len(), 1);
    }

    /// Overlays add custom roles on top of built-in ones; the base engine
    /// settings win.
    #[test]
    fn test_overlay_adds_custom_roles() {
        let mut doc = PolicyDocument::from_toml_str(BASE).unwrap();
        doc.extend(
            PolicyDocument::from_toml_str(
                r#"
                [engine]
                cache_ttl_secs = 5

                [[roles]]
                id = "acme_lead"
                name = "acme_lead"
                display_name = "Acme Lead"
                company_id = "acme"
                inherits_from = ["risk_manager"]
                "#,
            )
            .unwrap(),
        );
        assert_eq!(doc.engine.cache_ttl(), None);

        let (engine, _) = doc.into_engine().unwrap();
        let lead = UserAuth::new("u-7", "acme").with_roles(["acme_lead"]);
        let effective = engine.effective_permissions(&lead);
        assert!(effective.contains("dashboard:read"));
        assert!(effective.contains("assessments:approve"));
        assert_eq!(
            effective.get("assessments:approve").map(|p| p.conditions[1].operator),
            Some(Operator::Lt)
        );
    }

    #[test]
    fn test_reload_into_running_engine() {
        let (engine, first) = PolicyDocument::from_toml_str(BASE).unwrap().into_engine().unwrap();
        let viewer = UserAuth::new("u-1", "acme").with_roles(["viewer"]);
        assert!(engine.guard(&viewer).has_permission("dashboard:read", &PermissionContext::empty()));

        let stripped = PolicyDocument::from_toml_str(
            r#"
            [[roles]]
            id = "viewer"
            name = "viewer"
            display_name = "Viewer"
            "#,
        )
        .unwrap();
        let second = stripped.reload_into(&engine).unwrap();
        assert_ne!(first.snapshot_id, second.snapshot_id);
        assert!(!engine.guard(&viewer).has_permission("dashboard:read", &PermissionContext::empty()));
    }
}

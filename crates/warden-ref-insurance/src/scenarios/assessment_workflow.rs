//! Scenario 5: Assessment workflow
//!
//! Ownership scope and field conditions working together across the life of
//! an assessment:
//!
//! - analysts edit only their own assessments, and only while open
//! - managers edit any assessment of their company
//! - approval requires `status = submitted`; scores of 80 and above need the
//!   escalated grant held by company admins
//! - approved assessments cannot be deleted
//! - platform operators read across companies

use warden_contracts::{
    decision::{CheckFailure, PermissionResult},
    error::{WardenError, WardenResult},
    user::UserAuth,
};
use warden_core::{AccessGuard, AuthorizationEngine};

use crate::{mock_data, policy::insurance_engine, scenarios::describe};

/// Decide `action` on the stored assessment `assessment_id`.
pub fn check_assessment(
    engine: &AuthorizationEngine,
    user: &UserAuth,
    action: &str,
    assessment_id: &str,
) -> WardenResult<PermissionResult> {
    let assessment = mock_data::get_assessment(assessment_id).ok_or_else(|| WardenError::InvalidTarget {
        reason: format!("unknown assessment '{assessment_id}'"),
    })?;
    let target = assessment.target()?;
    Ok(engine.guard(user).can_access_resource("assessments", action, Some(&target)))
}

/// Run Scenario 5: Assessment workflow.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 5: Assessment workflow ===");
    println!();

    let (engine, _) = insurance_engine()?;

    let steps = [
        ("u-alice edits her draft as-100", mock_data::alice(), "update", "as-100"),
        ("u-alice edits u-maria's as-102", mock_data::alice(), "update", "as-102"),
        ("u-alice re-submits as-101", mock_data::alice(), "submit", "as-101"),
        ("u-maria edits u-alice's as-100", mock_data::maria(), "update", "as-100"),
        ("u-maria approves as-101 (score 62)", mock_data::maria(), "approve", "as-101"),
        ("u-maria approves as-102 (score 88)", mock_data::maria(), "approve", "as-102"),
        ("u-carlos approves as-102 (score 88)", mock_data::carlos(), "approve", "as-102"),
        ("u-maria deletes approved as-103", mock_data::maria(), "delete", "as-103"),
        ("u-oscar reads acme's as-101", mock_data::oscar(), "read", "as-101"),
        ("u-root reads globex's as-200", mock_data::root(), "read", "as-200"),
    ];

    for (label, user, action, assessment_id) in &steps {
        let result = check_assessment(&engine, user, action, assessment_id)?;
        println!("  {label}");
        println!("    {}", describe(&result));
        for check in &result.failed_checks {
            match &check.failure {
                CheckFailure::Scope { detail, .. } => println!("    scope: {detail}"),
                CheckFailure::Condition { detail, .. } => println!("    condition: {detail}"),
            }
        }
    }
    println!();

    println!("  Scenario 5 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use warden_contracts::decision::DecisionReason;

    use super::*;

    fn granted_by(result: &PermissionResult) -> Option<&str> {
        result.granted_by.as_ref().map(|p| p.as_str())
    }

    #[test]
    fn test_analyst_edits_only_own_open_assessments() {
        let (engine, _) = insurance_engine().unwrap();
        let alice = mock_data::alice();

        let own = check_assessment(&engine, &alice, "update", "as-100").unwrap();
        assert_eq!(granted_by(&own), Some("assessments:update:own"));

        let theirs = check_assessment(&engine, &alice, "update", "as-102").unwrap();
        assert_eq!(theirs.reason, DecisionReason::ScopeOrConditionFailed);
        assert!(matches!(theirs.failed_checks[0].failure, CheckFailure::Scope { .. }));

        // Own but no longer open.
        let approved = check_assessment(&engine, &alice, "update", "as-103").unwrap();
        assert!(!approved.allowed);
        assert!(matches!(approved.failed_checks[0].failure, CheckFailure::Condition { .. }));
    }

    /// Managers fall through the own-scope alternative to the company-wide one.
    #[test]
    fn test_manager_edit_falls_through_to_company_scope() {
        let (engine, _) = insurance_engine().unwrap();
        let result = check_assessment(&engine, &mock_data::maria(), "update", "as-100").unwrap();
        assert_eq!(granted_by(&result), Some("assessments:update"));
        assert_eq!(result.matching_permissions.len(), 2);
    }

    #[test]
    fn test_approval_threshold_and_escalation() {
        let (engine, _) = insurance_engine().unwrap();

        let low = check_assessment(&engine, &mock_data::maria(), "approve", "as-101").unwrap();
        assert_eq!(granted_by(&low), Some("assessments:approve"));

        let high = check_assessment(&engine, &mock_data::maria(), "approve", "as-102").unwrap();
        assert!(!high.allowed);
        match &high.failed_checks[0].failure {
            CheckFailure::Condition { field, .. } => assert_eq!(field, "riskScore"),
            other => panic!("expected a condition failure, got {other:?}"),
        }

        let escalated = check_assessment(&engine, &mock_data::carlos(), "approve", "as-102").unwrap();
        assert_eq!(granted_by(&escalated), Some("assessments:approve:escalated"));

        // A draft cannot be approved by anyone.
        let draft = check_assessment(&engine, &mock_data::carlos(), "approve", "as-100").unwrap();
        assert!(!draft.allowed);
    }

    #[test]
    fn test_approved_assessment_cannot_be_deleted() {
        let (engine, _) = insurance_engine().unwrap();
        let maria = mock_data::maria();
        assert!(!check_assessment(&engine, &maria, "delete", "as-103").unwrap().allowed);
        assert!(check_assessment(&engine, &maria, "delete", "as-101").unwrap().allowed);
    }

    #[test]
    fn test_cross_company_reads() {
        let (engine, _) = insurance_engine().unwrap();
        assert!(!check_assessment(&engine, &mock_data::oscar(), "read", "as-101").unwrap().allowed);

        let root = check_assessment(&engine, &mock_data::root(), "read", "as-200").unwrap();
        assert_eq!(granted_by(&root), Some("assessments:read:any"));
    }

    #[test]
    fn test_unknown_assessment_is_an_error() {
        let (engine, _) = insurance_engine().unwrap();
        let err = check_assessment(&engine, &mock_data::alice(), "read", "as-999").unwrap_err();
        assert!(matches!(err, WardenError::InvalidTarget { .. }));
    }

    #[test]
    fn test_run_scenario() {
        run_scenario().unwrap();
    }
}

//! Scenario 1: Company-scoped assessment creation
//!
//! A risk analyst at Acme holds `assessments:create` with `company` scope.
//!
//! Sub-case A: target belongs to Acme     → allowed
//! Sub-case B: target belongs to Globex   → denied, ScopeOrConditionFailed
//! Sub-case C: no target at all           → denied (company scope needs one)

use warden_contracts::{
    context::PermissionContext,
    decision::{CheckFailure, DecisionReason},
    error::WardenResult,
};
use warden_core::AccessGuard;

use crate::{mock_data, policy::insurance_engine, scenarios::describe};

/// Run Scenario 1: Company-scoped assessment creation.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 1: Company-scoped assessment creation ===");
    println!();

    let (engine, _) = insurance_engine()?;
    let alice = mock_data::alice();
    let guard = engine.guard(&alice);

    println!("  User: u-alice (risk_analyst @ acme)");
    println!("  Permission: assessments:create [scope = company]");
    println!();

    // ── Sub-case A: own company ───────────────────────────────────────────────

    let acme = mock_data::company("acme");
    let result = guard.can_access_resource("assessments", "create", Some(&acme));
    println!("  Sub-case A: target {{ companyId: \"acme\" }}");
    println!("    Decision: {}", describe(&result));
    println!();

    // ── Sub-case B: another company ───────────────────────────────────────────

    let globex = mock_data::company("globex");
    let result = guard.can_access_resource("assessments", "create", Some(&globex));
    println!("  Sub-case B: target {{ companyId: \"globex\" }}");
    println!("    Decision: {}", describe(&result));
    for check in &result.failed_checks {
        if let CheckFailure::Scope { scope, detail } = &check.failure {
            println!("    Failed {} scope on {}: {}", scope, check.permission_id, detail);
        }
    }
    if result.reason == DecisionReason::ScopeOrConditionFailed {
        println!("    End user sees: \"{}\"", result.public_message());
    }
    println!();

    // ── Sub-case C: no target ─────────────────────────────────────────────────

    let allowed = guard.has_permission("assessments:create", &PermissionContext::empty());
    println!("  Sub-case C: no target supplied");
    println!("    has_permission: {}", allowed);
    println!();

    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyst_creates_in_own_company() {
        let (engine, _) = insurance_engine().unwrap();
        let alice = mock_data::alice();
        let result = engine.guard(&alice).can_access_resource(
            "assessments",
            "create",
            Some(&mock_data::company("acme")),
        );
        assert!(result.allowed);
        assert_eq!(
            result.granted_by.map(|p| p.to_string()).as_deref(),
            Some("assessments:create")
        );
    }

    #[test]
    fn test_analyst_denied_in_other_company() {
        let (engine, _) = insurance_engine().unwrap();
        let alice = mock_data::alice();
        let result = engine.guard(&alice).can_access_resource(
            "assessments",
            "create",
            Some(&mock_data::company("globex")),
        );
        assert!(!result.allowed);
        assert_eq!(result.reason, DecisionReason::ScopeOrConditionFailed);
        assert!(matches!(
            result.failed_checks[0].failure,
            CheckFailure::Scope { .. }
        ));
    }

    #[test]
    fn test_company_scope_without_target_denied() {
        let (engine, _) = insurance_engine().unwrap();
        let alice = mock_data::alice();
        assert!(!engine
            .guard(&alice)
            .has_permission("assessments:create", &PermissionContext::empty()));
    }

    #[test]
    fn test_run_scenario() {
        run_scenario().unwrap();
    }
}

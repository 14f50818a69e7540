//! Scenario 3: Built-in roles are immutable
//!
//! Role administration is a two-step affair: the route first checks that
//! the caller holds `users:manage_roles` in the role's company, then asks
//! the engine to apply the edit. For a system role the second step always
//! fails with `SystemRoleImmutable`, whoever the caller is, and the served
//! snapshot is left untouched.

use warden_contracts::{
    context::PermissionContext,
    error::{RoleGraphError, WardenError, WardenResult},
    ids::{PermissionId, RoleId},
    user::UserAuth,
};
use warden_core::{AccessGuard, AuthorizationEngine};

use crate::{mock_data, policy::insurance_engine};

/// What happened to one attempted role edit.
#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The caller lacks `users:manage_roles` for the role's company.
    Forbidden,
    /// The engine refused the edit.
    Rejected(WardenError),
    Applied,
}

/// Attempt to strip every permission from `role_id` on behalf of `caller`.
pub fn strip_role(engine: &AuthorizationEngine, caller: &UserAuth, role_id: &RoleId) -> EditOutcome {
    let snapshot = engine.snapshot();
    let company = snapshot
        .roles
        .get(role_id)
        .and_then(|role| role.company_id.clone())
        .unwrap_or_else(|| caller.company_id.clone());

    let ctx = PermissionContext::for_target(mock_data::company(company.as_str()));
    if !engine.guard(caller).has_permission("users:manage_roles", &ctx) {
        return EditOutcome::Forbidden;
    }

    match engine.update_role_permissions(role_id, Vec::<PermissionId>::new()) {
        Ok(_) => EditOutcome::Applied,
        Err(e) => EditOutcome::Rejected(e),
    }
}

/// Run Scenario 3: Built-in roles are immutable.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 3: Built-in roles are immutable ===");
    println!();

    let (engine, _) = insurance_engine()?;
    let system_admin = RoleId::new("system_admin");
    let before = engine.snapshot();

    for (label, caller) in [
        ("u-root (system_admin)", mock_data::root()),
        ("u-carlos (company_admin @ acme)", mock_data::carlos()),
        ("u-alice (risk_analyst @ acme)", mock_data::alice()),
    ] {
        let outcome = strip_role(&engine, &caller, &system_admin);
        match &outcome {
            EditOutcome::Forbidden => {
                println!("  {label}: blocked at the route (lacks users:manage_roles)");
            }
            EditOutcome::Rejected(e) => {
                println!("  {label}: rejected by the engine: {e}");
            }
            EditOutcome::Applied => {
                println!("  {label}: UNEXPECTED: edit applied");
            }
        }
    }

    let after = engine.snapshot();
    let unchanged = after.id == before.id
        && after.roles.get(&system_admin).map(|r| &r.permissions)
            == before.roles.get(&system_admin).map(|r| &r.permissions);
    println!();
    println!("  Snapshot unchanged: {}", unchanged);

    // The same rule covers every other kind of edit.
    let deactivate = engine.set_role_active(&RoleId::new("viewer"), false);
    if let Err(WardenError::RoleGraph(RoleGraphError::SystemRoleImmutable { role })) = &deactivate {
        println!("  Deactivating '{role}': rejected");
    }
    println!();

    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn immutable(role: &str) -> EditOutcome {
        EditOutcome::Rejected(WardenError::RoleGraph(RoleGraphError::SystemRoleImmutable {
            role: RoleId::new(role),
        }))
    }

    #[test]
    fn test_system_admin_edit_rejected_for_every_admin() {
        let (engine, _) = insurance_engine().unwrap();
        let target = RoleId::new("system_admin");
        let before = engine.snapshot().id;

        assert_eq!(strip_role(&engine, &mock_data::root(), &target), immutable("system_admin"));
        assert_eq!(strip_role(&engine, &mock_data::carlos(), &target), immutable("system_admin"));
        assert_eq!(engine.snapshot().id, before);
    }

    #[test]
    fn test_non_admin_is_stopped_before_the_engine() {
        let (engine, _) = insurance_engine().unwrap();
        let outcome = strip_role(&engine, &mock_data::alice(), &RoleId::new("system_admin"));
        assert_eq!(outcome, EditOutcome::Forbidden);
    }

    /// Custom roles stay editable by their own company's admin only.
    #[test]
    fn test_custom_role_edit_respects_company() {
        let (engine, _) = insurance_engine().unwrap();
        let lead = RoleId::new("acme_custom_lead");

        assert_eq!(strip_role(&engine, &mock_data::oscar(), &lead), EditOutcome::Forbidden);
        assert_eq!(strip_role(&engine, &mock_data::carlos(), &lead), EditOutcome::Applied);

        let role = engine.snapshot().roles.get(&lead).cloned().unwrap();
        assert!(role.permissions.is_empty());
    }

    #[test]
    fn test_run_scenario() {
        run_scenario().unwrap();
    }
}

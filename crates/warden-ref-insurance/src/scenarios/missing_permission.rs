//! Scenario 2: Permission outside the effective set
//!
//! A viewer at Acme asks to delete an entity. `entities:delete` is not in the
//! viewer's effective set, so the answer is `NoMatchingPermission` for every
//! target, including one in the viewer's own company.

use warden_contracts::{context::PermissionContext, error::WardenResult};
use warden_core::AccessGuard;

use crate::{mock_data, policy::insurance_engine, scenarios::describe};

/// Run Scenario 2: Permission outside the effective set.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 2: Permission outside the effective set ===");
    println!();

    let (engine, _) = insurance_engine()?;
    let victor = mock_data::victor();
    let guard = engine.guard(&victor);

    let ids = guard.permission_ids();
    println!("  User: u-victor (viewer @ acme)");
    println!(
        "  Effective permissions ({}): {}",
        ids.len(),
        ids.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!();

    for (label, target) in [
        ("own company", mock_data::entity("en-1", "acme", "active")),
        ("other company", mock_data::entity("en-9", "globex", "active")),
    ] {
        let result = guard.can_access_resource("entities", "delete", Some(&target));
        println!("  entities:delete on {label}: {}", describe(&result));
    }

    // UI code asks the boolean form; no target needed for the answer.
    let visible = guard.has_any_permission(
        &["entities:delete", "entities:update"],
        &PermissionContext::empty(),
    );
    println!("  Show 'Edit entity' menu: {}", visible);
    println!();

    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}

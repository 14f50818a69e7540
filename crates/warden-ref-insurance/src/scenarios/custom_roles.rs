//! Scenario 4: Custom role chains
//!
//! Acme's `custom_lead` role inherits `risk_analyst`, which inherits
//! `viewer`. A lead therefore holds everything an analyst holds, and an
//! analyst everything a viewer holds.
//!
//! The scenario then edits the custom role at runtime and shows that the
//! next check sees the change without any manual cache handling, and that an
//! edit closing an inheritance cycle is refused.

use std::collections::BTreeSet;

use warden_contracts::{
    error::{RoleGraphError, WardenError, WardenResult},
    ids::{PermissionId, RoleId},
    role::Role,
    user::UserAuth,
};
use warden_core::{AccessGuard, AuthorizationEngine};

use crate::{mock_data, policy::insurance_engine};

fn effective_ids(engine: &AuthorizationEngine, user: &UserAuth) -> BTreeSet<PermissionId> {
    engine.effective_permissions(user).ids().cloned().collect()
}

/// Run Scenario 4: Custom role chains.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 4: Custom role chains ===");
    println!();

    let (engine, _) = insurance_engine()?;

    let lead = effective_ids(&engine, &mock_data::lena());
    let analyst = effective_ids(&engine, &mock_data::alice());
    let viewer = effective_ids(&engine, &mock_data::victor());

    println!("  custom_lead  → risk_analyst → viewer");
    println!("  Effective set sizes: lead {}, analyst {}, viewer {}", lead.len(), analyst.len(), viewer.len());
    println!("  lead ⊇ analyst:  {}", lead.is_superset(&analyst));
    println!("  analyst ⊇ viewer: {}", analyst.is_superset(&viewer));
    let extra: Vec<&str> = lead.difference(&analyst).map(|p| p.as_str()).collect();
    println!("  Lead-only grants: {}", extra.join(", "));
    println!();

    // ── Runtime edits ─────────────────────────────────────────────────────────

    let lena = mock_data::lena();
    let lead_id = RoleId::new("acme_custom_lead");
    let export = mock_data::company("acme");

    println!("  Removing reports:export from custom_lead...");
    engine.update_role_permissions(&lead_id, Vec::new())?;
    let can_export = engine
        .guard(&lena)
        .can_access_resource("reports", "export", Some(&export))
        .allowed;
    println!("    u-lena may export reports: {}", can_export);

    println!("  Creating acme_reviewer (inherits custom_lead)...");
    engine.create_role(
        Role::new("acme_reviewer", "reviewer")
            .for_company("acme")
            .inheriting(["acme_custom_lead"])
            .with_permissions(["reports:export"]),
    )?;

    println!("  Making custom_lead inherit acme_reviewer...");
    match engine.set_inheritance(&lead_id, vec![RoleId::new("acme_reviewer")]) {
        Err(WardenError::RoleGraph(RoleGraphError::CycleDetected { path })) => {
            let path: Vec<&str> = path.iter().map(|r| r.as_str()).collect();
            println!("    Rejected: cycle {}", path.join(" -> "));
        }
        Err(e) => println!("    Rejected: {e}"),
        Ok(_) => println!("    UNEXPECTED: cycle accepted"),
    }
    println!();

    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}

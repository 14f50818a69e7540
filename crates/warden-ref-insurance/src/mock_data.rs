//! Simulated dashboard users and records for the Warden reference runtime.
//!
//! All data in this module is hardcoded and fictional. It stands in for the
//! user store and the assessment/entity tables of a production deployment.
//! Records are built as the JSON documents the dashboard API would hand to
//! the engine as targets.

use serde::Serialize;
use serde_json::json;

use warden_contracts::{context::Target, error::WardenResult, user::UserAuth};

// ── Users ─────────────────────────────────────────────────────────────────────

/// Acme risk analyst.
pub fn alice() -> UserAuth {
    UserAuth::new("u-alice", "acme").with_roles(["risk_analyst"])
}

/// Acme read-only viewer.
pub fn victor() -> UserAuth {
    UserAuth::new("u-victor", "acme").with_roles(["viewer"])
}

/// Acme risk manager.
pub fn maria() -> UserAuth {
    UserAuth::new("u-maria", "acme").with_roles(["risk_manager"])
}

/// Acme company administrator.
pub fn carlos() -> UserAuth {
    UserAuth::new("u-carlos", "acme").with_roles(["company_admin"])
}

/// Acme portfolio lead holding the company's custom role.
pub fn lena() -> UserAuth {
    UserAuth::new("u-lena", "acme").with_roles(["acme_custom_lead"])
}

/// Platform operator.
pub fn root() -> UserAuth {
    UserAuth::new("u-root", "platform").with_roles(["system_admin"])
}

/// Company administrator at a different insurer.
pub fn oscar() -> UserAuth {
    UserAuth::new("u-oscar", "globex").with_roles(["company_admin"])
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A risk assessment as stored by the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub company_id: String,
    pub owner_id: String,
    pub entity_id: String,
    pub status: String,
    pub risk_score: u32,
}

impl Assessment {
    pub fn target(&self) -> WardenResult<Target> {
        Target::from_serialize(self)
    }
}

/// Look up an assessment by id.
///
/// Known ids:
/// - `as-100` acme, owned by alice, draft, score 35
/// - `as-101` acme, owned by alice, submitted, score 62
/// - `as-102` acme, owned by maria, submitted, score 88
/// - `as-103` acme, owned by alice, approved, score 20
/// - `as-200` globex, owned by oscar, draft, score 50
///
/// Any other id returns `None`.
pub fn get_assessment(id: &str) -> Option<Assessment> {
    let (company_id, owner_id, entity_id, status, risk_score) = match id {
        "as-100" => ("acme", "u-alice", "en-1", "draft", 35),
        "as-101" => ("acme", "u-alice", "en-1", "submitted", 62),
        "as-102" => ("acme", "u-maria", "en-2", "submitted", 88),
        "as-103" => ("acme", "u-alice", "en-2", "approved", 20),
        "as-200" => ("globex", "u-oscar", "en-9", "draft", 50),
        _ => return None,
    };
    Some(Assessment {
        id: id.to_string(),
        company_id: company_id.to_string(),
        owner_id: owner_id.to_string(),
        entity_id: entity_id.to_string(),
        status: status.to_string(),
        risk_score,
    })
}

/// An insured entity record.
pub fn entity(id: &str, company_id: &str, status: &str) -> Target {
    Target::new(json!({
        "id": id,
        "companyId": company_id,
        "status": status,
        "profile": { "sector": "logistics", "region": "emea" },
    }))
}

/// A bare company-owned target, for actions on a company's collection
/// (creating an assessment, exporting a report).
pub fn company(company_id: &str) -> Target {
    Target::new(json!({ "companyId": company_id }))
}

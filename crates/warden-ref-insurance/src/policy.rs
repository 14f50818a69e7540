//! The built-in insurance policy and the Acme overlay.

use warden_contracts::error::WardenResult;
use warden_core::{AuthorizationEngine, LoadReport};
use warden_policy::PolicyDocument;

/// Built-in permission catalog and system roles.
pub const INSURANCE_POLICY: &str = include_str!("../policies/insurance.toml");

/// Custom roles created by Acme's company admins.
pub const ACME_ROLES: &str = include_str!("../policies/acme_roles.toml");

/// The built-in document with the Acme overlay applied.
pub fn insurance_document() -> WardenResult<PolicyDocument> {
    let mut document = PolicyDocument::from_toml_str(INSURANCE_POLICY)?;
    document.extend(PolicyDocument::from_toml_str(ACME_ROLES)?);
    Ok(document)
}

/// An engine serving the built-in policy plus the Acme overlay.
pub fn insurance_engine() -> WardenResult<(AuthorizationEngine, LoadReport)> {
    insurance_document()?.into_engine()
}

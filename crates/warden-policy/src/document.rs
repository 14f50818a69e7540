//! Policy document schema and loading.
//!
//! A `PolicyDocument` is deserialized from TOML and carries everything an
//! engine needs to serve: the permission catalog, the role definitions, and
//! the `[engine]` settings. Documents can be layered: a platform document
//! holding the built-in roles is extended with per-company documents holding
//! custom roles, and the merged result is loaded as one snapshot.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use warden_contracts::{
    error::{RoleGraphError, WardenError, WardenResult},
    permission::PermissionRecord,
    role::Role,
};
use warden_core::{AuthorizationEngine, Catalog, EngineConfig, LoadReport, RoleGraph};

/// The top-level structure deserialized from a TOML policy file.
///
/// Every section is optional; an empty document is valid and denies
/// everything.
///
/// Example:
/// ```toml
/// [engine]
/// cache_ttl_secs = 60
///
/// [[permissions]]
/// id = "assessments:create"
/// scope = "company"
///
/// [[roles]]
/// id = "risk_analyst"
/// name = "risk_analyst"
/// display_name = "Risk Analyst"
/// permissions = ["assessments:create"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Permission definitions, in evaluation order.
    #[serde(default)]
    pub permissions: Vec<PermissionRecord>,

    #[serde(default)]
    pub roles: Vec<Role>,
}

impl PolicyDocument {
    /// Parse `s` as a TOML policy document.
    ///
    /// Returns `WardenError::ConfigError` if the TOML is malformed or does
    /// not match the document schema. Semantic problems (bad ids, cycles)
    /// are reported later, when the document is loaded into an engine.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        let document: PolicyDocument = toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        debug!(
            permissions = document.permissions.len(),
            roles = document.roles.len(),
            "policy document parsed"
        );
        Ok(document)
    }

    /// Read the file at `path` and parse it as a policy document.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Append another document's permissions and roles.
    ///
    /// The `[engine]` table of `self` wins; an overlay cannot change engine
    /// behavior. Duplicate ids are not resolved here: they surface as
    /// catalog or role-graph errors when the merged document is loaded.
    pub fn extend(&mut self, overlay: PolicyDocument) {
        if overlay.engine != EngineConfig::default() && overlay.engine != self.engine {
            warn!("ignoring [engine] table of policy overlay");
        }
        self.permissions.extend(overlay.permissions);
        self.roles.extend(overlay.roles);
    }

    /// Check the document without building an engine.
    ///
    /// A catalog error is returned as `Err`. Role problems do not fail the
    /// check; they are returned so the caller can decide whether a
    /// partially quarantined graph is acceptable.
    pub fn validate(&self) -> WardenResult<Vec<RoleGraphError>> {
        let catalog = Catalog::load(&self.permissions)?;
        let (_, quarantined) =
            RoleGraph::build(self.roles.clone(), &catalog, self.engine.inactive_roles);
        Ok(quarantined)
    }

    /// Build an engine configured by `[engine]` and serving this document.
    pub fn into_engine(self) -> WardenResult<(AuthorizationEngine, LoadReport)> {
        let engine = AuthorizationEngine::new(self.engine);
        let report = engine.reload(&self.permissions, self.roles)?;
        Ok((engine, report))
    }

    /// Swap this document into a running engine.
    ///
    /// The engine keeps its own configuration; only the catalog and roles
    /// are replaced.
    pub fn reload_into(&self, engine: &AuthorizationEngine) -> WardenResult<LoadReport> {
        if &self.engine != engine.config() {
            warn!("policy [engine] table differs from the running engine; keeping engine settings");
        }
        engine.reload(&self.permissions, self.roles.clone())
    }
}

//! Identifier newtypes shared across the Warden crates.
//!
//! Every identifier is a thin wrapper around the string the persistence layer
//! hands us. Wrapping them keeps a role id from being passed where a
//! permission id is expected.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Construct an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Catalog identifier of a permission, conventionally `resource:action`
    /// (e.g. `assessments:approve`), optionally with a `:qualifier` suffix.
    PermissionId
);

string_id!(
    /// Stable identifier of a role (e.g. `system_admin`, `risk_analyst`).
    RoleId
);

string_id!(
    /// Identifier of the acting user.
    UserId
);

string_id!(
    /// Identifier of the tenant company a user or record belongs to.
    CompanyId
);

/// Unique identifier of one loaded policy snapshot.
///
/// Cached effective-permission sets remember the snapshot they were computed
/// against, so a swap makes every older entry unusable in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub uuid::Uuid);

impl SnapshotId {
    /// Create a new, unique snapshot ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

//! # warden-ref-insurance
//!
//! Insurance-risk dashboard reference runtime for the Warden permission
//! engine.
//!
//! Ships the built-in permission catalog and system roles as TOML data, plus
//! five scenarios run against mock users and records:
//!
//! 1. **Company scope**: an analyst creates assessments in their own company
//!    only.
//! 2. **Missing permission**: a viewer asking for `entities:delete` gets
//!    `NoMatchingPermission`.
//! 3. **System roles**: built-in roles reject every edit, whoever asks.
//! 4. **Custom roles**: a company role chain resolves to a superset, and
//!    runtime edits take effect on the next check.
//! 5. **Assessment workflow**: ownership scope and field conditions.
//!
//! All data is hardcoded and fictional.

pub mod mock_data;
pub mod policy;
pub mod scenarios;

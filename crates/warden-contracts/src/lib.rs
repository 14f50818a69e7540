//! # warden-contracts
//!
//! Shared types, records, and the error taxonomy for the Warden permission
//! engine.
//!
//! All crates in the workspace import from here. No decision logic lives in
//! this crate, only data definitions, the target field accessor, and error
//! types.

pub mod context;
pub mod decision;
pub mod error;
pub mod ids;
pub mod permission;
pub mod role;
pub mod user;

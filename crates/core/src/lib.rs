//! Domain core for the Dreamlight production backend.
//!
//! Holds the role vocabulary, access decisions, progress and finance
//! arithmetic, and field validators. This crate has no database or HTTP
//! dependencies; callers pass in the rows they loaded.

pub mod access;
pub mod assets;
pub mod error;
pub mod finance;
pub mod pagination;
pub mod production;
pub mod progress;
pub mod roles;
pub mod types;
pub mod validation;

//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- Per-route role requirements (`RequireAdmin`, `RequireManager`, ...).
//! - [`access`] -- Per-resource project ownership checks.

pub mod access;
pub mod auth;
pub mod rbac;

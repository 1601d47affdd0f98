//! Request handlers, one submodule per resource.
//!
//! Handlers authorize through the extractors in [`crate::middleware`],
//! delegate persistence to the repositories in `dreamlight_db` and map
//! errors via [`crate::error::AppError`].

pub mod asset;
pub mod auth;
pub mod dashboard;
pub mod episode;
pub mod finance;
pub mod milestone;
pub mod project;
pub mod project_crew;
pub mod user;

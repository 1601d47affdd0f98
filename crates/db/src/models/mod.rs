//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod asset;
pub mod dashboard;
pub mod episode;
pub mod finance;
pub mod milestone;
pub mod project;
pub mod project_crew;
pub mod refresh_session;
pub mod user;

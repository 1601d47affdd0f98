//! Route-level role guards.
//!
//! Each guard authenticates like [`AuthUser`] and then rejects callers whose
//! role is outside the guard's set with 403.
//!
//! | Guard                  | Roles           |
//! |------------------------|-----------------|
//! | [`RequireAdmin`]       | admin           |
//! | [`RequireManager`]     | admin, producer |
//! | [`RequireCrew`]        | crew            |
//! | [`RequireBroadcaster`] | broadcaster     |
//! | [`RequireInvestor`]    | investor        |

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dreamlight_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Ok when `user` holds one of `allowed`.
fn authorize(user: AuthUser, allowed: &[Role]) -> Result<AuthUser, AppError> {
    if allowed.contains(&user.role) {
        return Ok(user);
    }
    let required: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
    Err(AppError::forbidden(format!(
        "Role '{}' is not authorized to access this route (requires {})",
        user.role,
        required.join(" or ")
    )))
}

macro_rules! role_guard {
    ($(#[$meta:meta])* $name:ident => [$($role:expr),+ $(,)?]) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                authorize(user, &[$($role),+]).map($name)
            }
        }
    };
}

role_guard!(RequireAdmin => [Role::Admin]);
role_guard!(
    /// Admins and producers: the roles that run productions.
    RequireManager => [Role::Admin, Role::Producer]
);
role_guard!(RequireCrew => [Role::Crew]);
role_guard!(RequireBroadcaster => [Role::Broadcaster]);
role_guard!(RequireInvestor => [Role::Investor]);

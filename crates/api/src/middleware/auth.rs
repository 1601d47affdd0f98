//! Bearer-token authentication.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dreamlight_core::roles::Role;
use dreamlight_core::types::DbId;

use crate::auth::jwt::decode_access_token;
use crate::error::AppError;
use crate::state::AppState;

/// The caller identified by a valid access token.
///
/// Built from the token claims alone; no database lookup happens here, so a
/// role change takes effect when the user next refreshes.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Not authorized, no token"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Malformed Authorization header"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>",
        )),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = decode_access_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::unauthorized("Not authorized, token failed")
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token_case_insensitively() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer xyz")).unwrap(), "xyz");
    }

    #[test]
    fn rejects_missing_or_foreign_schemes() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
        assert!(bearer_token(&headers("token-without-scheme")).is_err());
    }
}

//! Access and refresh tokens.
//!
//! Access tokens are short-lived HS256 JWTs issued by `dreamlight` and carry
//! the user's id and role. Refresh tokens are opaque random strings; the
//! database only ever sees their SHA-256 digest.

use dreamlight_core::roles::Role;
use dreamlight_core::types::DbId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::JwtConfig;

/// `iss` claim of every access token.
pub const TOKEN_ISSUER: &str = "dreamlight";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: DbId,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// A freshly generated refresh token and the digest that gets stored.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub plaintext: String,
    pub hash: String,
}

impl RefreshToken {
    pub fn generate() -> Self {
        let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let hash = hash_token(&plaintext);
        Self { plaintext, hash }
    }
}

/// Hex SHA-256 digest used to look up refresh tokens.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub fn issue_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = chrono::Utc::now().timestamp();
    let claims = AccessClaims {
        sub: user_id,
        role,
        iss: TOKEN_ISSUER.to_string(),
        iat,
        exp: iat + config.access_ttl_secs(),
        jti: Uuid::new_v4(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer and expiry. Unknown roles fail to deserialize.
pub fn decode_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-signing-secret".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 7,
        }
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_decodes_to_user_and_role() {
        let token = issue_access_token(42, Role::Producer, &config()).unwrap();
        let claims = decode_access_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Producer);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            json!({ "sub": 1, "role": "crew", "iss": TOKEN_ISSUER, "iat": now - 600,
                    "exp": now - 300, "jti": Uuid::new_v4() }),
            &config().secret,
        );
        assert!(decode_access_token(&token, &config()).is_err());
    }

    #[test]
    fn foreign_issuer_and_unknown_role_are_rejected() {
        let now = chrono::Utc::now().timestamp();
        let other_issuer = sign(
            json!({ "sub": 1, "role": "admin", "iss": "someone-else", "iat": now,
                    "exp": now + 600, "jti": Uuid::new_v4() }),
            &config().secret,
        );
        assert!(decode_access_token(&other_issuer, &config()).is_err());

        let bad_role = sign(
            json!({ "sub": 1, "role": "superuser", "iss": TOKEN_ISSUER, "iat": now,
                    "exp": now + 600, "jti": Uuid::new_v4() }),
            &config().secret,
        );
        assert!(decode_access_token(&bad_role, &config()).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_access_token(1, Role::Admin, &config()).unwrap();
        let other = JwtConfig {
            secret: "different".to_string(),
            ..config()
        };
        assert!(decode_access_token(&token, &other).is_err());
    }

    #[test]
    fn refresh_token_digest_matches() {
        let token = RefreshToken::generate();
        assert_eq!(token.plaintext.len(), 64);
        assert_eq!(token.hash, hash_token(&token.plaintext));
        assert_ne!(token.plaintext, RefreshToken::generate().plaintext);
    }
}

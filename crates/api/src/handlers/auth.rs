//! `/auth`: sign-in with refresh-token rotation, the caller's own profile and
//! password, and admin-only registration.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use dreamlight_core::roles::{Role, ROLE_CREW};
use dreamlight_core::types::DbId;
use dreamlight_core::validation::{
    validate_email, validate_password, validate_required_text, validate_role, MAX_NAME_LEN,
};
use dreamlight_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use dreamlight_db::repositories::{RefreshSessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{hash_token, issue_access_token, RefreshToken};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Consecutive failed logins that lock an account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

const LOCKOUT_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `crew`.
    pub role: Option<String>,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let email = input.email.trim();
    if email.is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and password".into(),
        ));
    }

    let user = UserRepo::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;
    ensure_can_sign_in(&user)?;
    if let Some(until) = user.locked_until.filter(|until| *until > Utc::now()) {
        tracing::debug!(user_id = user.id, %until, "Login attempt on locked account");
        return Err(AppError::forbidden(
            "Account is temporarily locked. Try again later.",
        ));
    }

    if !check_password(&input.password, &user.password_hash)? {
        record_failed_login(&state, user.id).await?;
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    let response = start_session(&state, user, &headers).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Trades a refresh token for a new pair. The presented token is consumed
/// and cannot be used again.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let session = RefreshSessionRepo::consume(&state.pool, &hash_token(&input.refresh_token))
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    ensure_can_sign_in(&user)?;

    let response = start_session(&state, user, &headers).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// Revokes every refresh token of the caller. Access tokens already issued
/// stay valid until they expire.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = RefreshSessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = find_user(&state, auth_user.user_id).await?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let name = input.name.as_deref().map(str::trim);
    if let Some(name) = name {
        validate_required_text("Name", name, MAX_NAME_LEN)?;
    }
    let email = input.email.as_deref().map(str::trim);
    if let Some(email) = email {
        validate_email(email)?;
        if UserRepo::email_taken(&state.pool, email, Some(auth_user.user_id)).await? {
            return Err(AppError::conflict("Email already in use"));
        }
    }

    let update = UpdateUser {
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        ..Default::default()
    };
    let user = UserRepo::update(&state.pool, auth_user.user_id, &update)
        .await?
        .ok_or(AppError::not_found("User", auth_user.user_id))?;

    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/auth/password
///
/// Requires the current password. Signs the user out everywhere.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let user = find_user(&state, auth_user.user_id).await?;
    if !check_password(&input.current_password, &user.password_hash)? {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    validate_password(&input.new_password)?;
    let new_hash = hash_new_password(&input.new_password)?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;
    let revoked = RefreshSessionRepo::revoke_all_for_user(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, revoked, "Password changed");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Password updated successfully"),
    }))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let name = input.name.trim();
    let email = input.email.trim();
    validate_required_text("Name", name, MAX_NAME_LEN)?;
    validate_email(email)?;
    validate_password(&input.password)?;
    let role: Role = validate_role(input.role.as_deref().unwrap_or(ROLE_CREW))?;

    if UserRepo::email_taken(&state.pool, email, None).await? {
        return Err(AppError::conflict("Email already registered"));
    }

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_new_password(&input.password)?,
            role: role.as_str().to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, %role, created_by = admin.user_id, "User registered");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user.into() })))
}

async fn find_user(state: &AppState, user_id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::not_found("User", user_id))
}

fn ensure_can_sign_in(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::forbidden("Account is deactivated"))
    }
}

fn check_password(password: &str, hash: &str) -> AppResult<bool> {
    verify_password(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))
}

pub(crate) fn hash_new_password(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

/// Count a failed attempt and lock the account once the limit is reached.
async fn record_failed_login(state: &AppState, user_id: DbId) -> AppResult<()> {
    let failed = UserRepo::increment_failed_login(&state.pool, user_id).await?;
    if failed >= MAX_FAILED_ATTEMPTS {
        let until = Utc::now() + Duration::minutes(LOCKOUT_MINS);
        UserRepo::lock_account(&state.pool, user_id, until).await?;
        tracing::warn!(user_id, failed, %until, "Account locked after failed logins");
    }
    Ok(())
}

/// Issue an access token and a stored refresh token for `user`.
async fn start_session(state: &AppState, user: User, headers: &HeaderMap) -> AppResult<AuthResponse> {
    let role: Role = user
        .role
        .parse()
        .map_err(|e: String| AppError::InternalError(format!("Stored role is invalid: {e}")))?;
    let jwt = &state.config.jwt;

    let access_token = issue_access_token(user.id, role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let refresh = RefreshToken::generate();
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    RefreshSessionRepo::issue(
        &state.pool,
        user.id,
        &refresh.hash,
        user_agent,
        jwt.refresh_expires_at(Utc::now()),
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.plaintext,
        expires_in: jwt.access_ttl_secs(),
        user: user.into(),
    })
}

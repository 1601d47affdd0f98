//! First-run setup: seeds an admin account into an empty database.

use dreamlight_core::roles::ROLE_ADMIN;
use dreamlight_core::validation::{
    validate_email, validate_password, validate_required_text, MAX_NAME_LEN,
};
use dreamlight_db::models::user::{CreateUser, User};
use dreamlight_db::repositories::UserRepo;
use dreamlight_db::DbPool;

use crate::config::BootstrapAdmin;
use crate::error::AppResult;
use crate::handlers::auth::hash_new_password;

/// Create the configured admin when no user exists yet.
///
/// Returns the new account, or `None` when nothing was configured or the
/// users table already has rows.
pub async fn ensure_admin(
    pool: &DbPool,
    admin: Option<&BootstrapAdmin>,
) -> AppResult<Option<User>> {
    let Some(admin) = admin else {
        return Ok(None);
    };
    if UserRepo::count(pool).await? > 0 {
        return Ok(None);
    }

    let name = admin.name.trim();
    let email = admin.email.trim();
    validate_required_text("Name", name, MAX_NAME_LEN)?;
    validate_email(email)?;
    validate_password(&admin.password)?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_new_password(&admin.password)?,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin created");
    Ok(Some(user))
}

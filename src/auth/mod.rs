//! Registration, login, and the guards that protect every other endpoint.

pub mod current_user;
pub mod password;
pub mod token;

use log::info;

use crate::config::AuthConfig;
use crate::database::Database;
use crate::error::AlertDeskError;
use crate::users::{Role, User};

pub use current_user::CurrentUser;

/// Stores a new user with a salted hash of `password`. No strength rules are
/// applied to the password. A taken email is reported before any hashing.
pub async fn register(
    db: &Database,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> Result<User, AlertDeskError> {
    if User::get_by_email(db, email)?.is_some() {
        return Err(AlertDeskError::EmailTaken);
    }

    // Hash on a blocking thread to keep the async workers free
    let plain = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AlertDeskError::internal("spawn password hashing task", e))??;

    let user = User::create(db, email, &password_hash, name, role)?;

    info!("Registered {} user {} (id: {})", user.role(), user.email(), user.user_id());
    Ok(user)
}

/// Returns a signed token for the user if the credentials match.
pub async fn login(
    db: &Database,
    auth: &AuthConfig,
    email: &str,
    password: &str,
) -> Result<String, AlertDeskError> {
    let user = User::get_by_email(db, email)?.ok_or(AlertDeskError::InvalidCredentials)?;

    let plain = password.to_owned();
    let hash = user.password_hash().to_owned();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AlertDeskError::internal("spawn password verification task", e))??;

    if !is_valid {
        return Err(AlertDeskError::InvalidCredentials);
    }

    token::issue_token(user.user_id(), auth)
}

/// Resolves the `Authorization` header value to a stored user. The header
/// holds the raw token; a `Bearer ` prefix is tolerated.
pub fn authenticate(
    db: &Database,
    auth: &AuthConfig,
    authorization: Option<&str>,
) -> Result<User, AlertDeskError> {
    let header = authorization
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AlertDeskError::Unauthenticated("Token missing"))?;

    let raw_token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    let claims = token::verify_token(raw_token, auth)?;

    User::get_by_id(db, claims.user_id)?.ok_or(AlertDeskError::Unauthenticated("User not found"))
}

pub fn require_role(user: &User, role: Role) -> Result<(), AlertDeskError> {
    if user.role() != role {
        return Err(AlertDeskError::Forbidden);
    }
    Ok(())
}

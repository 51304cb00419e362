//! Password hashing, cookie sessions and the identity extractors handlers
//! use to require a login or admin rights.

use crate::db::users;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, header, request::Parts};
use chrono::{Duration, Utc};
use nanoid::nanoid;

pub const SESSION_COOKIE: &str = "session_id";
pub const SESSION_DAYS: i64 = 30;

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Opens a session for `user_id` and returns the `Set-Cookie` value.
pub async fn start_session(state: &AppState, user_id: i64) -> Result<HeaderValue, AppError> {
    let token = nanoid!(32);
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    users::create_session(&state.pool, &token, user_id, expires_at).await?;
    tracing::info!(user_id, "session started");
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_DAYS * 24 * 60 * 60
    ))
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session_id=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

async fn user_from_parts(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    match session_token(&parts.headers) {
        Some(token) => users::find_by_session(&state.pool, &token, Utc::now()).await,
        None => Ok(None),
    }
}

/// A logged-in user; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_parts(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::AuthRequired)
    }
}

/// A logged-in admin; 401 without a session, 403 for everyone else.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

/// The caller's identity if there is one. Lookup failures are logged and
/// treated as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match user_from_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                Ok(MaybeUser(None))
            }
        }
    }
}

impl MaybeUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Makes sure the configured first admin can log in. An account that already
/// has a password is left alone.
pub async fn bootstrap_admin(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let existing = users::find_by_email(&state.pool, email).await?;
    if let Some(user) = existing.as_ref().filter(|u| u.password_hash.is_some()) {
        tracing::info!(user_id = user.id, "bootstrap admin already exists");
        return Ok(());
    }
    let hash = hash_password(password, state.password_cost).await?;
    match existing {
        Some(user) => {
            users::set_password(&state.pool, user.id, &hash, true).await?;
            tracing::info!(user_id = user.id, "bootstrap admin password set");
        }
        None => {
            let user = users::create(
                &state.pool,
                users::NewUser {
                    password_hash: Some(&hash),
                    is_admin: true,
                    ..users::NewUser::without_password(email, "Administrator")
                },
            )
            .await?;
            tracing::info!(user_id = user.id, "bootstrap admin created");
        }
    }
    Ok(())
}

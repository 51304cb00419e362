use crate::{
    auth::{self as session, CurrentUser, clear_session_cookie, session_token},
    booking::is_valid_email,
    db::users::{self, NewUser},
    error::AppError,
    extract::AppJson,
    models::User,
    state::AppState,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct SignupPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn with_cookie(status: StatusCode, cookie: axum::http::HeaderValue, user: User) -> Response {
    (status, [(header::SET_COOKIE, cookie)], Json(user)).into_response()
}

pub async fn signup(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<SignupPayload>,
) -> Result<Response, AppError> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let taken = || AppError::conflict("An account with this email already exists");
    let existing = users::find_by_email(&app_state.pool, &payload.email).await?;
    if existing.as_ref().is_some_and(|u| u.password_hash.is_some()) {
        return Err(taken());
    }

    let hash = session::hash_password(&payload.password, app_state.password_cost).await?;
    let user = match existing {
        // Registered by a teacher or studio; the first signup claims it.
        Some(user) => {
            let user = users::claim(&app_state.pool, user.id, &payload.name, &hash)
                .await?
                .ok_or_else(taken)?;
            tracing::info!(user_id = user.id, "password-less account claimed");
            user
        }
        None => {
            let user = users::create(
                &app_state.pool,
                NewUser {
                    password_hash: Some(&hash),
                    ..NewUser::without_password(&payload.email, &payload.name)
                },
            )
            .await?;
            tracing::info!(user_id = user.id, "account created");
            user
        }
    };

    let cookie = session::start_session(&app_state, user.id).await?;
    Ok(with_cookie(StatusCode::CREATED, cookie, user))
}

pub async fn login(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<Response, AppError> {
    let invalid = || AppError::InvalidCredentials;
    let user = users::find_by_email(&app_state.pool, &payload.email)
        .await?
        .ok_or_else(invalid)?;
    // Accounts created by a teacher or studio have no password yet.
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !session::verify_password(&payload.password, hash).await? {
        tracing::info!(user_id = user.id, "failed login");
        return Err(invalid());
    }

    let cookie = session::start_session(&app_state, user.id).await?;
    Ok(with_cookie(StatusCode::OK, cookie, user))
}

pub async fn logout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        users::delete_session(&app_state.pool, &token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    ))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

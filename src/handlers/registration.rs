use crate::{
    auth::{CurrentUser, MaybeUser},
    db::participants,
    error::AppError,
    extract::AppJson,
    models::Participant,
    pricing::{self, PackageInfo},
    registration::{self, BulkOutcome, BulkRequest, RegisterRequest},
    state::AppState,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

#[derive(Serialize)]
pub struct RegisterResponse {
    participant: Participant,
}

pub async fn get_packages() -> Json<Vec<PackageInfo>> {
    Json(pricing::catalog())
}

pub async fn register(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let participant = registration::register_individual(&app_state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { participant })))
}

pub async fn my_registration(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Participant>, AppError> {
    participants::find_by_user(&app_state.pool, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("You are not registered yet"))
}

#[derive(Serialize)]
pub struct BulkResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(flatten)]
    outcome: BulkOutcome,
}

/// 201 when at least one student was registered, 400 with the same body when
/// every student failed.
pub async fn register_bulk(
    State(app_state): State<AppState>,
    caller: MaybeUser,
    AppJson(payload): AppJson<BulkRequest>,
) -> Result<(StatusCode, Json<BulkResponse>), AppError> {
    let outcome = registration::register_bulk(&app_state, caller.is_admin(), payload).await?;

    let registered = outcome.registered.len();
    let failed = outcome.errors.len();
    let (status, body) = if outcome.succeeded() {
        let message = if failed == 0 {
            format!("Registered {registered} student(s)")
        } else {
            format!("Registered {registered} student(s); {failed} could not be registered")
        };
        (
            StatusCode::CREATED,
            BulkResponse {
                success: true,
                message,
                error: None,
                outcome,
            },
        )
    } else {
        let message = "No students could be registered".to_string();
        (
            StatusCode::BAD_REQUEST,
            BulkResponse {
                success: false,
                error: Some(message.clone()),
                message,
                outcome,
            },
        )
    };
    Ok((status, Json(body)))
}

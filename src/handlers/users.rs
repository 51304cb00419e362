use super::deleted;
use crate::{
    auth::AdminUser,
    db::users::{self, RolesPatch},
    error::AppError,
    extract::AppJson,
    models::User,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

pub async fn list_users(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(users::list(&app_state.pool).await?))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    AppJson(patch): AppJson<RolesPatch>,
) -> Result<Json<User>, AppError> {
    let user = users::update_roles(&app_state.pool, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    tracing::info!(
        user_id = id,
        admin_id = admin.id,
        is_admin = user.is_admin,
        is_teacher = user.is_teacher,
        "user roles updated"
    );
    Ok(Json(user))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if admin.id == id {
        return Err(AppError::validation("You cannot delete your own account"));
    }
    let found = users::delete(&app_state.pool, id).await?;
    if found {
        tracing::info!(user_id = id, admin_id = admin.id, "user deleted");
    }
    deleted(found, "User")
}

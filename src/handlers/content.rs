use super::deleted;
use crate::{
    auth::AdminUser,
    db::content::{self, AttractionInput, ScheduleInput, StudioInput, TeacherInput},
    error::AppError,
    extract::AppJson,
    models::{Attraction, DanceStudio, ScheduleItem, Teacher},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherList {
    teachers: Vec<Teacher>,
    /// Placeholder cards to show after the announced teachers.
    #[serde(skip_serializing_if = "Option::is_none")]
    tba_count: Option<i64>,
}

pub async fn list_teachers(
    State(app_state): State<AppState>,
) -> Result<Json<TeacherList>, AppError> {
    let teachers = content::list_teachers(&app_state.pool).await?;
    let settings = app_state.settings.get().await?;
    let tba_count = settings
        .show_tba_teachers
        .then_some(settings.tba_teachers_count);
    Ok(Json(TeacherList {
        teachers,
        tba_count,
    }))
}

pub async fn create_teacher(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<TeacherInput>,
) -> Result<(StatusCode, Json<Teacher>), AppError> {
    let teacher = content::create_teacher(&app_state.pool, payload.validate()?).await?;
    tracing::info!(teacher_id = teacher.id, "teacher created");
    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update_teacher(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<TeacherInput>,
) -> Result<Json<Teacher>, AppError> {
    content::update_teacher(&app_state.pool, id, payload.validate()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Teacher not found"))
}

pub async fn delete_teacher(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(content::delete_teacher(&app_state.pool, id).await?, "Teacher")
}

pub async fn list_studios(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<DanceStudio>>, AppError> {
    content::list_studios(&app_state.pool).await.map(Json)
}

pub async fn create_studio(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<StudioInput>,
) -> Result<(StatusCode, Json<DanceStudio>), AppError> {
    let studio = content::create_studio(&app_state.pool, payload.validate()?).await?;
    tracing::info!(studio_id = studio.id, "dance studio created");
    Ok((StatusCode::CREATED, Json(studio)))
}

pub async fn update_studio(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<StudioInput>,
) -> Result<Json<DanceStudio>, AppError> {
    content::update_studio(&app_state.pool, id, payload.validate()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Dance studio not found"))
}

pub async fn delete_studio(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(content::delete_studio(&app_state.pool, id).await?, "Dance studio")
}

pub async fn list_attractions(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Attraction>>, AppError> {
    content::list_attractions(&app_state.pool).await.map(Json)
}

pub async fn create_attraction(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<AttractionInput>,
) -> Result<(StatusCode, Json<Attraction>), AppError> {
    let attraction = content::create_attraction(&app_state.pool, payload.validate()?).await?;
    tracing::info!(attraction_id = attraction.id, "attraction created");
    Ok((StatusCode::CREATED, Json(attraction)))
}

pub async fn update_attraction(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AttractionInput>,
) -> Result<Json<Attraction>, AppError> {
    content::update_attraction(&app_state.pool, id, payload.validate()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Attraction not found"))
}

pub async fn delete_attraction(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(content::delete_attraction(&app_state.pool, id).await?, "Attraction")
}

pub async fn list_schedule(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ScheduleItem>>, AppError> {
    content::list_schedule(&app_state.pool).await.map(Json)
}

pub async fn create_schedule_item(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<ScheduleInput>,
) -> Result<(StatusCode, Json<ScheduleItem>), AppError> {
    let item = content::create_schedule_item(&app_state.pool, payload.validate()?).await?;
    tracing::info!(schedule_item_id = item.id, day = %item.day, "schedule item created");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_schedule_item(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ScheduleInput>,
) -> Result<Json<ScheduleItem>, AppError> {
    content::update_schedule_item(&app_state.pool, id, payload.validate()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Schedule item not found"))
}

pub async fn delete_schedule_item(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(
        content::delete_schedule_item(&app_state.pool, id).await?,
        "Schedule item",
    )
}

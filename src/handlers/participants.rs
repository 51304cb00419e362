use super::deleted;
use crate::{
    auth::{AdminUser, CurrentUser},
    db::participants::{self, ParticipantChanges},
    error::AppError,
    extract::AppJson,
    models::{Participant, ParticipantRow},
    pricing::AddOns,
    registration::{self, BulkStudent, OnBehalfRegistration, can_manage},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

pub const PURGE_AFTER_DAYS: i64 = 7;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    include_deleted: bool,
}

pub async fn list_participants(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ParticipantRow>>, AppError> {
    let rows = participants::list(&app_state.pool, query.include_deleted).await?;
    Ok(Json(rows))
}

pub async fn my_registrations(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ParticipantRow>>, AppError> {
    let rows = participants::list_registered_by(&app_state.pool, user.id).await?;
    Ok(Json(rows))
}

pub async fn get_participant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ParticipantRow>, AppError> {
    let row = participants::find_row(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Participant not found"))?;
    if !can_manage(&user, &row.participant) {
        return Err(AppError::forbidden(
            "You do not have permission to view this participant",
        ));
    }
    Ok(Json(row))
}

pub async fn create_participant(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(payload): AppJson<BulkStudent>,
) -> Result<(StatusCode, Json<Participant>), AppError> {
    let entry = OnBehalfRegistration::from_student(payload)?;
    let (participant, email) = registration::register_on_behalf(&app_state, &admin, entry)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::conflict("This person is already registered"),
            other => other,
        })?;
    tracing::info!(
        participant_id = participant.id,
        admin_id = admin.id,
        %email,
        "participant created by admin"
    );
    Ok((StatusCode::CREATED, Json(participant)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceParticipant {
    #[serde(default)]
    registrant_first_name: String,
    #[serde(default)]
    registrant_last_name: String,
    phone: Option<String>,
    package_type: Option<String>,
    #[serde(default)]
    guinness_record_attempt: bool,
    #[serde(default)]
    greek_night: bool,
    total_price: Option<u32>,
    #[serde(default)]
    checked_in: bool,
}

fn non_blank(value: &str, message: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(value.to_string())
}

fn clean_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

async fn existing(app_state: &AppState, id: i64) -> Result<Participant, AppError> {
    participants::find_by_id(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Participant not found"))
}

async fn save(
    app_state: &AppState,
    id: i64,
    changes: ParticipantChanges,
) -> Result<Json<Participant>, AppError> {
    let participant = participants::update(&app_state.pool, id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Participant not found"))?;
    tracing::info!(
        participant_id = id,
        package = %participant.package_type,
        total_price = participant.total_price,
        "participant updated"
    );
    Ok(Json(participant))
}

pub async fn replace_participant(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ReplaceParticipant>,
) -> Result<Json<Participant>, AppError> {
    existing(&app_state, id).await?;
    let (package, add_ons, total_price) = registration::price_selection(
        payload.package_type.as_deref(),
        AddOns::new(payload.guinness_record_attempt, payload.greek_night),
        payload.total_price,
    )?;
    let changes = ParticipantChanges {
        first_name: non_blank(&payload.registrant_first_name, "First name is required")?,
        last_name: non_blank(&payload.registrant_last_name, "Last name is required")?,
        phone: clean_phone(payload.phone),
        package,
        add_ons,
        total_price,
        checked_in: payload.checked_in,
    };
    save(&app_state, id, changes).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchParticipant {
    registrant_first_name: Option<String>,
    registrant_last_name: Option<String>,
    phone: Option<String>,
    package_type: Option<String>,
    guinness_record_attempt: Option<bool>,
    greek_night: Option<bool>,
    total_price: Option<u32>,
    checked_in: Option<bool>,
}

impl PatchParticipant {
    fn touches_price(&self) -> bool {
        self.package_type.is_some()
            || self.guinness_record_attempt.is_some()
            || self.greek_night.is_some()
            || self.total_price.is_some()
    }
}

pub async fn patch_participant(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<PatchParticipant>,
) -> Result<Json<Participant>, AppError> {
    let current = existing(&app_state, id).await?;

    let (package, add_ons, total_price) = if payload.touches_price() {
        let package_type = payload
            .package_type
            .clone()
            .unwrap_or_else(|| current.package_type.to_string());
        let bought = current.package_type.purchased_add_ons(current.add_ons());
        registration::price_selection(
            Some(&package_type),
            AddOns::new(
                payload.guinness_record_attempt.unwrap_or(bought.guinness),
                payload.greek_night.unwrap_or(bought.greek_night),
            ),
            payload.total_price,
        )?
    } else {
        let total = u32::try_from(current.total_price)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        (current.package_type, current.add_ons(), total)
    };

    let first_name = match &payload.registrant_first_name {
        Some(name) => non_blank(name, "First name is required")?,
        None => current.registrant_first_name,
    };
    let last_name = match &payload.registrant_last_name {
        Some(name) => non_blank(name, "Last name is required")?,
        None => current.registrant_last_name,
    };
    let phone = match payload.phone {
        Some(phone) => clean_phone(Some(phone)),
        None => current.phone,
    };

    let changes = ParticipantChanges {
        first_name,
        last_name,
        phone,
        package,
        add_ons,
        total_price,
        checked_in: payload.checked_in.unwrap_or(current.checked_in),
    };
    save(&app_state, id, changes).await
}

/// Soft delete. The registrant, their registrar and admins may do this.
pub async fn delete_participant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let participant = existing(&app_state, id).await?;
    if !can_manage(&user, &participant) {
        return Err(AppError::forbidden(
            "You do not have permission to delete this registration",
        ));
    }
    let found = participants::soft_delete(&app_state.pool, id, user.id, Utc::now())
        .await?
        .is_some();
    if found {
        tracing::info!(participant_id = id, deleted_by = user.id, "participant soft-deleted");
    }
    deleted(found, "Participant")
}

pub async fn restore_participant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Participant>, AppError> {
    let participant = existing(&app_state, id).await?;
    if !can_manage(&user, &participant) {
        return Err(AppError::forbidden(
            "You do not have permission to restore this registration",
        ));
    }
    let restored = participants::restore(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Participant not found"))?;
    tracing::info!(participant_id = id, restored_by = user.id, "participant restored");
    Ok(Json(restored))
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    purged: usize,
    ids: Vec<i64>,
}

pub async fn cleanup_participants(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<CleanupResponse>, AppError> {
    let cutoff = Utc::now() - Duration::days(PURGE_AFTER_DAYS);
    let ids = participants::purge_deleted_before(&app_state.pool, cutoff).await?;
    tracing::info!(purged = ids.len(), ?ids, "purged soft-deleted participants");
    Ok(Json(CleanupResponse {
        purged: ids.len(),
        ids,
    }))
}

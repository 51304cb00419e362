use super::deleted;
use crate::{
    auth::AdminUser,
    booking::{BookingQuote, price_booking},
    db::hotels::{self, HotelInput},
    error::AppError,
    extract::AppJson,
    models::Hotel,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

pub async fn list_hotels(State(app_state): State<AppState>) -> Result<Json<Vec<Hotel>>, AppError> {
    Ok(Json(hotels::list(&app_state.pool).await?))
}

pub(crate) async fn find_hotel(app_state: &AppState, id: i64) -> Result<Hotel, AppError> {
    hotels::find_by_id(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel not found"))
}

pub async fn get_hotel(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Hotel>, AppError> {
    Ok(Json(find_hotel(&app_state, id).await?))
}

pub async fn create_hotel(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<HotelInput>,
) -> Result<(StatusCode, Json<Hotel>), AppError> {
    let hotel = hotels::create(&app_state.pool, payload.validate()?).await?;
    tracing::info!(hotel_id = hotel.id, name = %hotel.name, "hotel created");
    Ok((StatusCode::CREATED, Json(hotel)))
}

pub async fn update_hotel(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<HotelInput>,
) -> Result<Json<Hotel>, AppError> {
    hotels::update(&app_state.pool, id, payload.validate()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Hotel not found"))
}

pub async fn delete_hotel(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(hotels::delete(&app_state.pool, id).await?, "Hotel")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    room_type: Option<String>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

pub async fn quote(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<BookingQuote>, AppError> {
    let hotel = find_hotel(&app_state, id).await?;
    if let Some(room_type) = query.room_type.as_deref().filter(|r| !r.trim().is_empty()) {
        if !hotel.room_types.contains_key(room_type) {
            return Err(AppError::validation(format!(
                "Unknown room type for this hotel: {room_type}"
            )));
        }
    }
    Ok(Json(price_booking(
        &hotel,
        query.room_type.as_deref(),
        query.check_in,
        query.check_out,
    )))
}

use super::{deleted, hotels::find_hotel};
use crate::{
    auth::AdminUser,
    booking::{BookingDraft, BookingQuote, price_booking, validate_booking},
    db::hotels::{self, NewBooking},
    error::AppError,
    extract::AppJson,
    mailer::{self, send_best_effort},
    models::{BookingStatus, HotelBooking},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    hotel_id: i64,
    #[serde(default)]
    room_type: String,
    #[serde(default)]
    guest_names: Vec<String>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    special_requests: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    booking: HotelBooking,
    quote: BookingQuote,
}

pub async fn create_booking(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateBooking>,
) -> Result<(StatusCode, Json<BookingCreated>), AppError> {
    let hotel = find_hotel(&app_state, payload.hotel_id).await?;
    let room_type = payload.room_type.trim();
    if room_type.is_empty() {
        return Err(AppError::validation("Room type is required"));
    }
    if !hotel.room_types.contains_key(room_type) {
        return Err(AppError::validation(format!(
            "Unknown room type for this hotel: {room_type}"
        )));
    }
    let (Some(check_in), Some(check_out)) = (payload.check_in, payload.check_out) else {
        return Err(AppError::validation(
            "Check-in and check-out dates are required",
        ));
    };

    let guest_names: Vec<String> = payload
        .guest_names
        .iter()
        .map(|n| n.trim().to_string())
        .collect();
    validate_booking(
        &BookingDraft {
            room_type,
            guest_names: &guest_names,
            email: payload.email.trim(),
            phone: &payload.phone,
            check_in,
            check_out,
        },
        Utc::now().date_naive(),
    )?;

    let quote = price_booking(&hotel, Some(room_type), Some(check_in), Some(check_out));
    let booking = hotels::create_booking(
        &app_state.pool,
        NewBooking {
            hotel: &hotel,
            room_type,
            guest_names,
            email: &payload.email,
            phone: &payload.phone,
            check_in,
            check_out,
            special_requests: payload.special_requests.as_deref(),
        },
    )
    .await?;
    tracing::info!(
        booking_id = booking.id,
        hotel_id = hotel.id,
        nights = quote.nights,
        grand_total = quote.grand_total,
        "hotel booking received"
    );

    let mailer = app_state.mailer.as_ref();
    send_best_effort(mailer, mailer::booking_received(&booking)).await;
    if let Some(admin) = &app_state.admin_notify_email {
        send_best_effort(mailer, mailer::booking_admin_notice(&booking, admin)).await;
    }

    Ok((StatusCode::CREATED, Json(BookingCreated { booking, quote })))
}

pub async fn list_bookings(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<HotelBooking>>, AppError> {
    Ok(Json(hotels::list_bookings(&app_state.pool).await?))
}

async fn find_booking(app_state: &AppState, id: i64) -> Result<HotelBooking, AppError> {
    hotels::find_booking(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))
}

async fn set_status(
    app_state: &AppState,
    id: i64,
    status: BookingStatus,
) -> Result<HotelBooking, AppError> {
    let booking = hotels::set_booking_status(&app_state.pool, id, status)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    tracing::info!(booking_id = id, status = ?status, "booking status changed");
    Ok(booking)
}

pub async fn confirm_booking(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<HotelBooking>, AppError> {
    let current = find_booking(&app_state, id).await?;
    match current.status {
        BookingStatus::Cancelled => {
            return Err(AppError::validation("A cancelled booking cannot be confirmed"));
        }
        BookingStatus::Confirmed => return Ok(Json(current)),
        BookingStatus::Pending => {}
    }
    let booking = set_status(&app_state, id, BookingStatus::Confirmed).await?;
    send_best_effort(app_state.mailer.as_ref(), mailer::booking_confirmed(&booking)).await;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<HotelBooking>, AppError> {
    let current = find_booking(&app_state, id).await?;
    if current.status == BookingStatus::Cancelled {
        return Err(AppError::validation("Booking is already cancelled"));
    }
    Ok(Json(set_status(&app_state, id, BookingStatus::Cancelled).await?))
}

pub async fn delete_booking(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(hotels::delete_booking(&app_state.pool, id).await?, "Booking")
}

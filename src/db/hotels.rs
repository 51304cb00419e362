use crate::error::AppError;
use crate::models::{BookingStatus, Hotel, HotelBooking, RoomRate};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use sqlx::types::Json;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelInput {
    pub name: String,
    pub stars: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub room_types: HashMap<String, RoomRate>,
    #[serde(default)]
    pub room_type_order: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub breakfast_included: bool,
    pub city_tax: Option<f64>,
    #[serde(default)]
    pub display_order: i64,
}

impl HotelInput {
    pub fn validate(mut self) -> Result<Self, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Hotel name is required"));
        }
        if !(1..=5).contains(&self.stars) {
            return Err(AppError::validation("Star rating must be between 1 and 5"));
        }
        if self.room_types.values().any(|r| r.price < 0.0 || !r.price.is_finite()) {
            return Err(AppError::validation("Room prices cannot be negative"));
        }
        if self.city_tax.is_some_and(|t| t < 0.0 || !t.is_finite()) {
            return Err(AppError::validation("City tax cannot be negative"));
        }
        // Keep the explicit order for known labels, then append the rest.
        self.room_type_order.retain(|label| self.room_types.contains_key(label));
        let mut missing: Vec<String> = self
            .room_types
            .keys()
            .filter(|label| !self.room_type_order.contains(label))
            .cloned()
            .collect();
        missing.sort();
        self.room_type_order.extend(missing);
        Ok(self)
    }
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Hotel>, AppError> {
    sqlx::query_as("SELECT * FROM hotels ORDER BY display_order, name")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Hotel>, AppError> {
    sqlx::query_as("SELECT * FROM hotels WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create(pool: &SqlitePool, input: HotelInput) -> Result<Hotel, AppError> {
    sqlx::query_as(
        "INSERT INTO hotels
         (name, stars, location, description, images, room_types, room_type_order,
         amenities, breakfast_included, city_tax, display_order)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.stars)
    .bind(input.location)
    .bind(input.description)
    .bind(Json(input.images))
    .bind(Json(input.room_types))
    .bind(Json(input.room_type_order))
    .bind(Json(input.amenities))
    .bind(input.breakfast_included)
    .bind(input.city_tax)
    .bind(input.display_order)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: HotelInput,
) -> Result<Option<Hotel>, AppError> {
    sqlx::query_as(
        "UPDATE hotels
         SET name = ?, stars = ?, location = ?, description = ?, images = ?, room_types = ?,
         room_type_order = ?, amenities = ?, breakfast_included = ?, city_tax = ?, display_order = ?
         WHERE id = ? RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.stars)
    .bind(input.location)
    .bind(input.description)
    .bind(Json(input.images))
    .bind(Json(input.room_types))
    .bind(Json(input.room_type_order))
    .bind(Json(input.amenities))
    .bind(input.breakfast_included)
    .bind(input.city_tax)
    .bind(input.display_order)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM hotels WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub struct NewBooking<'a> {
    pub hotel: &'a Hotel,
    pub room_type: &'a str,
    pub guest_names: Vec<String>,
    pub email: &'a str,
    pub phone: &'a str,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub special_requests: Option<&'a str>,
}

pub async fn create_booking(
    pool: &SqlitePool,
    new: NewBooking<'_>,
) -> Result<HotelBooking, AppError> {
    sqlx::query_as(
        "INSERT INTO hotel_bookings (hotel_id, hotel_name, room_type, guest_names, email, phone,
         check_in, check_out, special_requests, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(new.hotel.id)
    .bind(&new.hotel.name)
    .bind(new.room_type)
    .bind(Json(new.guest_names))
    .bind(new.email.trim())
    .bind(new.phone.trim())
    .bind(new.check_in)
    .bind(new.check_out)
    .bind(new.special_requests.map(str::trim).filter(|s| !s.is_empty()))
    .bind(BookingStatus::Pending)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn list_bookings(pool: &SqlitePool) -> Result<Vec<HotelBooking>, AppError> {
    sqlx::query_as("SELECT * FROM hotel_bookings ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn find_booking(pool: &SqlitePool, id: i64) -> Result<Option<HotelBooking>, AppError> {
    sqlx::query_as("SELECT * FROM hotel_bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn set_booking_status(
    pool: &SqlitePool,
    id: i64,
    status: BookingStatus,
) -> Result<Option<HotelBooking>, AppError> {
    sqlx::query_as("UPDATE hotel_bookings SET status = ? WHERE id = ? RETURNING *")
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn delete_booking(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM hotel_bookings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> HotelInput {
        let mut room_types = HashMap::new();
        room_types.insert("Single Room".to_string(), RoomRate { price: 60.0, info: None });
        room_types.insert("Double Room".to_string(), RoomRate { price: 90.0, info: None });
        HotelInput {
            name: "Olympia".into(),
            stars: 4,
            location: String::new(),
            description: String::new(),
            images: vec![],
            room_types,
            room_type_order: vec!["Double Room".into(), "Penthouse".into()],
            amenities: vec![],
            breakfast_included: true,
            city_tax: Some(2.5),
            display_order: 0,
        }
    }

    #[test]
    fn room_order_drops_unknown_labels_and_appends_missing() {
        let validated = input().validate().unwrap();
        assert_eq!(validated.room_type_order, vec!["Double Room", "Single Room"]);
    }

    #[test]
    fn rejects_bad_star_rating_and_negative_prices() {
        let mut bad = input();
        bad.stars = 6;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.city_tax = Some(-1.0);
        assert!(bad.validate().is_err());
    }
}

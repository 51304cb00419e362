use crate::pricing::{AddOns, Package};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub is_teacher: bool,
    pub studio_name: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub registrant_first_name: String,
    pub registrant_last_name: String,
    pub phone: Option<String>,
    pub package_type: Package,
    pub guinness_record_attempt: bool,
    pub greek_night: bool,
    pub total_price: i64,
    pub checked_in: bool,
    pub registered_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn add_ons(&self) -> AddOns {
        AddOns::new(self.guinness_record_attempt, self.greek_night)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.registrant_first_name, self.registrant_last_name)
    }
}

/// Participant joined with its owning account, for admin listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub participant: Participant,
    pub user_email: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRate {
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: i64,
    pub name: String,
    pub stars: i64,
    pub location: String,
    pub description: String,
    pub images: Json<Vec<String>>,
    pub room_types: Json<HashMap<String, RoomRate>>,
    pub room_type_order: Json<Vec<String>>,
    pub amenities: Json<Vec<String>>,
    pub breakfast_included: bool,
    pub city_tax: Option<f64>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HotelBooking {
    pub id: i64,
    pub hotel_id: Option<i64>,
    pub hotel_name: String,
    pub room_type: String,
    pub guest_names: Json<Vec<String>>,
    pub email: String,
    pub phone: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub photo: String,
    pub teaching_style: String,
    pub country: String,
    pub country_code: String,
    pub image_offset_y: i64,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DanceStudio {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
    pub country: String,
    pub country_code: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub badge: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: i64,
    pub day: String,
    pub date_label: String,
    pub start_time: String,
    pub end_time: String,
    pub lecturer: String,
    pub dance_style: String,
    pub level: String,
    pub hall: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub registration_open: bool,
    pub registration_message: String,
    pub show_tba_teachers: bool,
    pub tba_teachers_count: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registration_open: true,
            registration_message: "Registration is currently closed. Please check back soon."
                .to_string(),
            show_tba_teachers: false,
            tba_teachers_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: i64,
    pub session_id: String,
    pub user_id: Option<i64>,
    pub event_type: String,
    pub event_name: Option<String>,
    pub page_path: Option<String>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

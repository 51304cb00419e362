//! Hotel booking quotes and submission checks.

use crate::error::AppError;
use crate::models::Hotel;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Number of guests a room type sleeps, read off its label.
pub fn guest_count_for_room_type(label: &str) -> usize {
    let label = label.to_lowercase();
    [("single", 1), ("double", 2), ("triple", 3), ("quadruple", 4)]
        .into_iter()
        .find(|(needle, _)| label.contains(needle))
        .map_or(1, |(_, count)| count)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuote {
    pub nights: i64,
    pub room_price: f64,
    pub total_room_cost: f64,
    pub city_tax: f64,
    pub grand_total: f64,
}

pub fn price_booking(
    hotel: &Hotel,
    room_type: Option<&str>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
) -> BookingQuote {
    let (Some(room_type), Some(check_in), Some(check_out)) = (room_type, check_in, check_out)
    else {
        return BookingQuote::default();
    };
    if room_type.trim().is_empty() {
        return BookingQuote::default();
    }

    let nights = (check_out - check_in).num_days();
    let room_price = hotel
        .room_types
        .get(room_type)
        .map_or(0.0, |rate| rate.price);
    let total_room_cost = room_price * nights as f64;
    let city_tax = hotel.city_tax.unwrap_or(0.0) * nights as f64;

    BookingQuote {
        nights,
        room_price,
        total_room_cost,
        city_tax,
        grand_total: total_room_cost + city_tax,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Expected {expected} guest name(s) for this room type, got {got}")]
    GuestNameMismatch { expected: usize, got: usize },
    #[error("All guest names are required")]
    BlankGuestName,
    #[error("Check-in date cannot be in the past")]
    CheckInInPast,
    #[error("Check-out date must be after check-in date")]
    CheckOutNotAfterCheckIn,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Phone number is required")]
    MissingPhone,
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// The guest-supplied part of a booking, checked before it is stored.
#[derive(Debug, Clone, Copy)]
pub struct BookingDraft<'a> {
    pub room_type: &'a str,
    pub guest_names: &'a [String],
    pub email: &'a str,
    pub phone: &'a str,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

pub fn validate_guest_names(room_type: &str, names: &[String]) -> Result<(), BookingError> {
    let expected = guest_count_for_room_type(room_type);
    if names.len() != expected {
        return Err(BookingError::GuestNameMismatch {
            expected,
            got: names.len(),
        });
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(BookingError::BlankGuestName);
    }
    Ok(())
}

pub fn validate_booking(draft: &BookingDraft<'_>, today: NaiveDate) -> Result<(), BookingError> {
    if draft.check_in < today {
        return Err(BookingError::CheckInInPast);
    }
    if draft.check_out <= draft.check_in {
        return Err(BookingError::CheckOutNotAfterCheckIn);
    }
    if !is_valid_email(draft.email) {
        return Err(BookingError::InvalidEmail);
    }
    validate_guest_names(draft.room_type, draft.guest_names)?;
    if draft.phone.trim().is_empty() {
        return Err(BookingError::MissingPhone);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomRate;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hotel(city_tax: Option<f64>) -> Hotel {
        let mut rooms = HashMap::new();
        rooms.insert(
            "Deluxe Double Room".to_string(),
            RoomRate {
                price: 100.0,
                info: None,
            },
        );
        Hotel {
            city_tax,
            room_types: sqlx::types::Json(rooms),
            ..Hotel::default()
        }
    }

    #[test]
    fn guest_count_follows_label() {
        assert_eq!(guest_count_for_room_type("Deluxe Double Room"), 2);
        assert_eq!(guest_count_for_room_type("SINGLE"), 1);
        assert_eq!(guest_count_for_room_type("Family Triple"), 3);
        assert_eq!(guest_count_for_room_type("quadruple sea view"), 4);
        assert_eq!(guest_count_for_room_type("Suite"), 1);
    }

    #[test]
    fn quote_adds_city_tax_per_night() {
        let quote = price_booking(
            &hotel(Some(5.0)),
            Some("Deluxe Double Room"),
            Some(date(2026, 6, 10)),
            Some(date(2026, 6, 13)),
        );
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.room_price, 100.0);
        assert_eq!(quote.total_room_cost, 300.0);
        assert_eq!(quote.city_tax, 15.0);
        assert_eq!(quote.grand_total, 315.0);
    }

    #[test]
    fn quote_without_city_tax() {
        let quote = price_booking(
            &hotel(None),
            Some("Deluxe Double Room"),
            Some(date(2026, 6, 10)),
            Some(date(2026, 6, 12)),
        );
        assert_eq!(quote.city_tax, 0.0);
        assert_eq!(quote.grand_total, 200.0);
    }

    #[test]
    fn quote_is_zero_until_every_input_is_set() {
        let h = hotel(Some(5.0));
        let zero = BookingQuote::default();
        let room = Some("Deluxe Double Room");
        let (check_in, check_out) = (Some(date(2026, 6, 10)), Some(date(2026, 6, 13)));
        assert_eq!(price_booking(&h, None, check_in, check_out), zero);
        assert_eq!(price_booking(&h, room, None, check_out), zero);
        assert_eq!(price_booking(&h, room, check_in, None), zero);
    }

    fn draft<'a>(
        names: &'a [String],
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> BookingDraft<'a> {
        BookingDraft {
            room_type: "Deluxe Double Room",
            guest_names: names,
            email: "guest@example.com",
            phone: "+30 123",
            check_in,
            check_out,
        }
    }

    #[test]
    fn booking_checks_dates_against_today() {
        let names = vec!["Ann Smith".to_string(), "Bob Smith".to_string()];
        let today = date(2026, 6, 10);
        assert_eq!(validate_booking(&draft(&names, today, date(2026, 6, 11)), today), Ok(()));
        assert_eq!(
            validate_booking(&draft(&names, date(2026, 6, 9), date(2026, 6, 11)), today),
            Err(BookingError::CheckInInPast)
        );
        assert_eq!(
            validate_booking(&draft(&names, today, today), today),
            Err(BookingError::CheckOutNotAfterCheckIn)
        );
    }

    #[test]
    fn booking_requires_one_name_per_guest() {
        let today = date(2026, 6, 10);
        let one = vec!["Ann Smith".to_string()];
        assert_eq!(
            validate_booking(&draft(&one, today, date(2026, 6, 12)), today),
            Err(BookingError::GuestNameMismatch { expected: 2, got: 1 })
        );
        let blank = vec!["Ann Smith".to_string(), "  ".to_string()];
        assert_eq!(
            validate_booking(&draft(&blank, today, date(2026, 6, 12)), today),
            Err(BookingError::BlankGuestName)
        );
    }

    #[test]
    fn booking_requires_contact_details() {
        let today = date(2026, 6, 10);
        let names = vec!["Ann Smith".to_string(), "Bob Smith".to_string()];
        let mut d = draft(&names, today, date(2026, 6, 12));
        d.email = "not-an-email";
        assert_eq!(validate_booking(&d, today), Err(BookingError::InvalidEmail));
        d.email = "guest@example.com";
        d.phone = " ";
        assert_eq!(validate_booking(&d, today), Err(BookingError::MissingPhone));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.gr"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
    }
}

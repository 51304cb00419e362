pub mod analytics;
pub mod auth;
pub mod bookings;
pub mod content;
pub mod hotels;
pub mod participants;
pub mod registration;
pub mod settings;
pub mod users;

use crate::error::AppError;
use axum::http::StatusCode;

/// Maps the "deleted anything?" flag of a delete query to a response.
pub(crate) fn deleted(found: bool, what: &str) -> Result<StatusCode, AppError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("{what} not found")))
    }
}

use crate::error::AppError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections come back as `{"error": ...}` 400s like
/// every other client error.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

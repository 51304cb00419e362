pub mod analytics;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod pricing;
pub mod registration;
pub mod settings;
pub mod state;
pub mod wizard;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use handlers::{bookings, content, hotels, participants, users};
use state::AppState;
use std::path::Path;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// JSON API routes only; no static files or tracing.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/packages", get(handlers::registration::get_packages))
        .route(
            "/api/register",
            post(handlers::registration::register).get(handlers::registration::my_registration),
        )
        .route(
            "/api/register/bulk",
            post(handlers::registration::register_bulk),
        )
        .route(
            "/api/participants",
            get(participants::list_participants).post(participants::create_participant),
        )
        .route(
            "/api/participants/mine",
            get(participants::my_registrations),
        )
        .route(
            "/api/participants/cleanup",
            post(participants::cleanup_participants),
        )
        .route(
            "/api/participants/{id}",
            get(participants::get_participant)
                .put(participants::replace_participant)
                .patch(participants::patch_participant)
                .delete(participants::delete_participant),
        )
        .route(
            "/api/participants/{id}/restore",
            post(participants::restore_participant),
        )
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/{id}",
            patch(users::update_user).delete(users::delete_user),
        )
        .route(
            "/api/hotels",
            get(hotels::list_hotels).post(hotels::create_hotel),
        )
        .route(
            "/api/hotels/{id}",
            get(hotels::get_hotel)
                .put(hotels::update_hotel)
                .delete(hotels::delete_hotel),
        )
        .route("/api/hotels/{id}/quote", get(hotels::quote))
        .route(
            "/api/hotel-bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/hotel-bookings/{id}", delete(bookings::delete_booking))
        .route(
            "/api/hotel-bookings/{id}/confirm",
            post(bookings::confirm_booking),
        )
        .route(
            "/api/hotel-bookings/{id}/cancel",
            post(bookings::cancel_booking),
        )
        .route(
            "/api/teachers",
            get(content::list_teachers).post(content::create_teacher),
        )
        .route(
            "/api/teachers/{id}",
            put(content::update_teacher).delete(content::delete_teacher),
        )
        .route(
            "/api/studios",
            get(content::list_studios).post(content::create_studio),
        )
        .route(
            "/api/studios/{id}",
            put(content::update_studio).delete(content::delete_studio),
        )
        .route(
            "/api/attractions",
            get(content::list_attractions).post(content::create_attraction),
        )
        .route(
            "/api/attractions/{id}",
            put(content::update_attraction).delete(content::delete_attraction),
        )
        .route(
            "/api/schedule",
            get(content::list_schedule).post(content::create_schedule_item),
        )
        .route(
            "/api/schedule/{id}",
            put(content::update_schedule_item).delete(content::delete_schedule_item),
        )
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/api/analytics",
            get(handlers::analytics::get_stats).post(handlers::analytics::track_event),
        )
}

/// The full application: API, the front-end bundle under `assets_dir` (with
/// `index.html` for client-side routes) and request tracing.
pub fn build_app(app_state: AppState, assets_dir: impl AsRef<Path>) -> Router {
    let assets_dir = assets_dir.as_ref();
    let front_end =
        ServeDir::new(assets_dir).fallback(ServeFile::new(assets_dir.join("index.html")));

    api_router()
        .nest_service("/assets", ServeDir::new(assets_dir))
        .fallback_service(front_end)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

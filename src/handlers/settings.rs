use crate::{
    auth::AdminUser, error::AppError, extract::AppJson, models::Settings,
    settings::SettingsPatch, state::AppState,
};
use axum::{Json, extract::State};

pub async fn get_settings(State(app_state): State<AppState>) -> Result<Json<Settings>, AppError> {
    app_state.settings.get().await.map(Json)
}

pub async fn update_settings(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(patch): AppJson<SettingsPatch>,
) -> Result<Json<Settings>, AppError> {
    let settings = app_state.settings.update(patch).await?;
    tracing::info!(
        admin_id = admin.id,
        registration_open = settings.registration_open,
        show_tba_teachers = settings.show_tba_teachers,
        "settings updated"
    );
    Ok(Json(settings))
}

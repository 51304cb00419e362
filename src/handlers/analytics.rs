use crate::{
    analytics::{self, AnalyticsStats},
    auth::{AdminUser, MaybeUser},
    db::analytics::{self as events, NewEvent},
    error::{AppError, is_missing_schema},
    state::AppState,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, header},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

const DEFAULT_DAYS: i64 = 30;
const MAX_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    event_type: String,
    event_name: Option<String>,
    page_path: Option<String>,
    metadata: Option<Value>,
    #[serde(default)]
    is_admin: bool,
}

fn header_str<'h>(headers: &'h HeaderMap, name: impl header::AsHeaderName) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First hop of `x-forwarded-for`, falling back to `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
}

/// Always answers `{success: true}`. The body is read as JSON whatever its
/// content type (`sendBeacon` posts `text/plain`); unreadable bodies and
/// storage problems are only logged.
pub async fn track_event(
    State(app_state): State<AppState>,
    caller: MaybeUser,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let ok = Json(json!({ "success": true }));
    let payload: TrackEvent = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable analytics event ignored");
            return ok;
        }
    };
    if payload.is_admin || caller.is_admin() || !app_state.capabilities.analytics() {
        return ok;
    }
    if payload.session_id.trim().is_empty() || payload.event_type.trim().is_empty() {
        tracing::debug!("analytics event without session or type ignored");
        return ok;
    }

    let event = NewEvent {
        session_id: payload.session_id.trim(),
        user_id: caller.0.as_ref().map(|u| u.id),
        event_type: payload.event_type.trim(),
        event_name: payload.event_name.as_deref(),
        page_path: payload.page_path.as_deref(),
        metadata: payload.metadata,
        ip_address: client_ip(&headers),
        user_agent: header_str(&headers, header::USER_AGENT),
        referrer: header_str(&headers, header::REFERER),
    };
    if let Err(e) = events::insert_event(&app_state.pool, event).await {
        if is_missing_schema(&e) {
            app_state.capabilities.mark_analytics_missing();
            tracing::warn!("analytics table missing, event tracking disabled");
        } else {
            tracing::warn!(error = %e, "failed to record analytics event");
        }
    }
    ok
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    days: Option<i64>,
}

pub async fn get_stats(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<AnalyticsStats>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    if !app_state.capabilities.analytics() {
        return Ok(Json(AnalyticsStats::unavailable(days)));
    }

    let since = Utc::now() - Duration::days(days);
    match events::events_since(&app_state.pool, since).await {
        Ok(list) => Ok(Json(analytics::aggregate(&list, days))),
        Err(e) if is_missing_schema(&e) => {
            app_state.capabilities.mark_analytics_missing();
            tracing::warn!("analytics table missing, returning empty stats");
            Ok(Json(AnalyticsStats::unavailable(days)))
        }
        Err(e) => Err(e.into()),
    }
}

use crate::models::AnalyticsEvent;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::types::Json;

pub struct NewEvent<'a> {
    pub session_id: &'a str,
    pub user_id: Option<i64>,
    pub event_type: &'a str,
    pub event_name: Option<&'a str>,
    pub page_path: Option<&'a str>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub referrer: Option<&'a str>,
}

// Errors are returned raw so callers can tell a missing table apart.
pub async fn insert_event(pool: &SqlitePool, event: NewEvent<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO analytics_events
         (session_id, user_id, event_type, event_name, page_path, metadata,
         ip_address, user_agent, referrer, is_admin, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(event.session_id)
    .bind(event.user_id)
    .bind(event.event_type)
    .bind(event.event_name)
    .bind(event.page_path)
    .bind(event.metadata.map(Json))
    .bind(event.ip_address)
    .bind(event.user_agent)
    .bind(event.referrer)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn events_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<AnalyticsEvent>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM analytics_events WHERE is_admin = 0 AND created_at >= ? ORDER BY created_at",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

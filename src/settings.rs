//! Festival-wide settings, stored as a single row keyed by id 1.
//!
//! Older databases may lack the TBA-teacher columns or the analytics table.
//! What the store supports is probed once per process into
//! [`SchemaCapabilities`]; reads and writes consult it instead of guessing,
//! and a write that still trips over a missing column downgrades it.

use crate::error::{AppError, is_missing_schema};
use crate::models::Settings;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;

const SETTINGS_ID: i64 = 1;

#[derive(Debug)]
pub struct SchemaCapabilities {
    settings_tba: AtomicBool,
    analytics: AtomicBool,
}

impl SchemaCapabilities {
    /// Assumes the latest schema without asking the store.
    pub fn full() -> Self {
        Self {
            settings_tba: AtomicBool::new(true),
            analytics: AtomicBool::new(true),
        }
    }

    pub async fn probe(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('settings')")
                .fetch_all(pool)
                .await?;
        let has_column = |name: &str| columns.iter().any(|(c,)| c == name);
        let settings_tba = has_column("show_tba_teachers") && has_column("tba_teachers_count");

        let analytics: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'analytics_events'",
        )
        .fetch_optional(pool)
        .await?;

        let caps = Self {
            settings_tba: AtomicBool::new(settings_tba),
            analytics: AtomicBool::new(analytics.is_some()),
        };
        if !caps.settings_tba() || !caps.analytics() {
            tracing::warn!(
                settings_tba,
                analytics = caps.analytics(),
                "database schema is behind; running in compatibility mode"
            );
        }
        Ok(caps)
    }

    pub fn settings_tba(&self) -> bool {
        self.settings_tba.load(Ordering::Relaxed)
    }

    pub fn analytics(&self) -> bool {
        self.analytics.load(Ordering::Relaxed)
    }

    pub fn mark_settings_tba_missing(&self) {
        self.settings_tba.store(false, Ordering::Relaxed);
    }

    pub fn mark_analytics_missing(&self) {
        self.analytics.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub registration_open: Option<bool>,
    pub registration_message: Option<String>,
    pub show_tba_teachers: Option<bool>,
    pub tba_teachers_count: Option<i64>,
}

impl SettingsPatch {
    fn apply(self, mut current: Settings) -> Settings {
        if let Some(v) = self.registration_open {
            current.registration_open = v;
        }
        if let Some(v) = self.registration_message {
            current.registration_message = v;
        }
        if let Some(v) = self.show_tba_teachers {
            current.show_tba_teachers = v;
        }
        if let Some(v) = self.tba_teachers_count {
            current.tba_teachers_count = v;
        }
        current
    }
}

#[derive(Clone)]
pub struct SettingsService {
    pool: SqlitePool,
    caps: Arc<SchemaCapabilities>,
    row_ready: Arc<OnceCell<()>>,
}

impl SettingsService {
    pub fn new(pool: SqlitePool, caps: Arc<SchemaCapabilities>) -> Self {
        Self {
            pool,
            caps,
            row_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn insert_defaults(&self) -> Result<(), AppError> {
        let defaults = Settings::default();
        sqlx::query(
            "INSERT OR IGNORE INTO settings (id, registration_open, registration_message)
             VALUES (?, ?, ?)",
        )
        .bind(SETTINGS_ID)
        .bind(defaults.registration_open)
        .bind(&defaults.registration_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the settings. The first call per process creates the row with
    /// defaults; later calls only read. Fields the store cannot hold, or a
    /// missing row, come back with their default values.
    pub async fn get(&self) -> Result<Settings, AppError> {
        self.row_ready
            .get_or_try_init(|| self.insert_defaults())
            .await?;

        if self.caps.settings_tba() {
            let full: Result<Option<(bool, String, bool, i64)>, sqlx::Error> = sqlx::query_as(
                "SELECT registration_open, registration_message, show_tba_teachers,
                 tba_teachers_count FROM settings WHERE id = ?",
            )
            .bind(SETTINGS_ID)
            .fetch_optional(&self.pool)
            .await;
            match full {
                Ok(row) => {
                    return Ok(row.map_or_else(Settings::default, |row| Settings {
                        registration_open: row.0,
                        registration_message: row.1,
                        show_tba_teachers: row.2,
                        tba_teachers_count: row.3,
                    }));
                }
                Err(e) if is_missing_schema(&e) => {
                    tracing::warn!(error = %e, "settings table lacks TBA columns");
                    self.caps.mark_settings_tba_missing();
                }
                Err(e) => return Err(e.into()),
            }
        }

        let row: Option<(bool, String)> = sqlx::query_as(
            "SELECT registration_open, registration_message FROM settings WHERE id = ?",
        )
        .bind(SETTINGS_ID)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map_or_else(Settings::default, |(registration_open, registration_message)| {
            Settings {
                registration_open,
                registration_message,
                ..Settings::default()
            }
        }))
    }

    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        if patch.tba_teachers_count.is_some_and(|c| c < 0) {
            return Err(AppError::validation("TBA teachers count cannot be negative"));
        }
        self.insert_defaults().await?;
        let next = patch.apply(self.get().await?);

        if self.caps.settings_tba() {
            let full = sqlx::query(
                "UPDATE settings SET registration_open = ?, registration_message = ?,
                 show_tba_teachers = ?, tba_teachers_count = ? WHERE id = ?",
            )
            .bind(next.registration_open)
            .bind(&next.registration_message)
            .bind(next.show_tba_teachers)
            .bind(next.tba_teachers_count)
            .bind(SETTINGS_ID)
            .execute(&self.pool)
            .await;
            match full {
                Ok(_) => return self.get().await,
                Err(e) if is_missing_schema(&e) => {
                    tracing::warn!(error = %e, "retrying settings update without TBA columns");
                    self.caps.mark_settings_tba_missing();
                }
                Err(e) => return Err(e.into()),
            }
        }

        sqlx::query(
            "UPDATE settings SET registration_open = ?, registration_message = ? WHERE id = ?",
        )
        .bind(next.registration_open)
        .bind(&next.registration_message)
        .bind(SETTINGS_ID)
        .execute(&self.pool)
        .await?;
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn legacy_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE settings (
                id INTEGER PRIMARY KEY,
                registration_open BOOLEAN NOT NULL DEFAULT 1,
                registration_message TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    async fn migrated_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn first_read_creates_defaults() {
        let pool = migrated_pool().await;
        let caps = Arc::new(SchemaCapabilities::probe(&pool).await.unwrap());
        assert!(caps.settings_tba());
        assert!(caps.analytics());

        let service = SettingsService::new(pool, caps);
        assert_eq!(service.get().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn update_round_trips_all_fields() {
        let pool = migrated_pool().await;
        let caps = Arc::new(SchemaCapabilities::probe(&pool).await.unwrap());
        let service = SettingsService::new(pool, caps);

        let updated = service
            .update(SettingsPatch {
                registration_open: Some(false),
                show_tba_teachers: Some(true),
                tba_teachers_count: Some(3),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert!(!updated.registration_open);
        assert!(updated.show_tba_teachers);
        assert_eq!(updated.tba_teachers_count, 3);
        assert_eq!(service.get().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn probe_detects_legacy_settings_table() {
        let pool = legacy_pool().await;
        let caps = SchemaCapabilities::probe(&pool).await.unwrap();
        assert!(!caps.settings_tba());
        assert!(!caps.analytics());
    }

    #[tokio::test]
    async fn stale_capability_falls_back_and_merges_defaults() {
        let pool = legacy_pool().await;
        // Capabilities claim full support; the first statement naming the
        // TBA columns fails and the service downgrades itself.
        let caps = Arc::new(SchemaCapabilities::full());
        let service = SettingsService::new(pool, caps.clone());

        let updated = service
            .update(SettingsPatch {
                registration_open: Some(false),
                registration_message: Some("See you next year".into()),
                show_tba_teachers: Some(true),
                tba_teachers_count: Some(4),
            })
            .await
            .unwrap();

        assert!(!caps.settings_tba());
        assert!(!updated.registration_open);
        assert_eq!(updated.registration_message, "See you next year");
        assert!(!updated.show_tba_teachers);
        assert_eq!(updated.tba_teachers_count, 0);
    }

    #[tokio::test]
    async fn only_the_first_read_writes() {
        let pool = migrated_pool().await;
        let caps = Arc::new(SchemaCapabilities::probe(&pool).await.unwrap());
        let service = SettingsService::new(pool.clone(), caps);
        service.get().await.unwrap();

        sqlx::query("DELETE FROM settings").execute(&pool).await.unwrap();
        assert_eq!(service.get().await.unwrap(), Settings::default());
        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);

        let updated = service
            .update(SettingsPatch {
                registration_open: Some(false),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert!(!updated.registration_open);
    }

    #[tokio::test]
    async fn negative_tba_count_is_rejected() {
        let pool = migrated_pool().await;
        let service = SettingsService::new(pool, Arc::new(SchemaCapabilities::full()));
        let err = service
            .update(SettingsPatch {
                tba_teachers_count: Some(-1),
                ..SettingsPatch::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

use crate::mailer::Mailer;
use crate::settings::{SchemaCapabilities, SettingsService};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub settings: SettingsService,
    pub capabilities: Arc<SchemaCapabilities>,
    pub mailer: Arc<dyn Mailer>,
    pub admin_notify_email: Option<String>,
    pub password_cost: u32,
}

impl AppState {
    /// Probes the schema once and wires the services around `pool`.
    pub async fn new(
        pool: SqlitePool,
        mailer: Arc<dyn Mailer>,
        admin_notify_email: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let capabilities = Arc::new(SchemaCapabilities::probe(&pool).await?);
        Ok(Self {
            settings: SettingsService::new(pool.clone(), capabilities.clone()),
            pool,
            capabilities,
            mailer,
            admin_notify_email,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

use festival::{
    auth, build_app,
    config::Config,
    db,
    mailer::{LogMailer, Mailer, SmtpMailer},
    state::AppState,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("festival=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("invalid configuration");

    let pool = db::connect(&config.database_url)
        .await
        .expect("failed to open database");
    db::migrate(&pool).await.expect("failed to run migrations");

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "sending email over SMTP");
            Arc::new(
                SmtpMailer::new(smtp, config.mail_from.clone()).expect("invalid SMTP settings"),
            )
        }
        None => {
            tracing::info!("SMTP not configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let app_state = AppState::new(pool, mailer, config.admin_notify_email.clone())
        .await
        .expect("failed to inspect database schema");

    if let Some((email, password)) = &config.bootstrap_admin {
        auth::bootstrap_admin(&app_state, email, password)
            .await
            .expect("failed to bootstrap admin account");
    }
    app_state
        .settings
        .get()
        .await
        .expect("failed to initialise settings");

    let app = build_app(app_state, &config.assets_dir);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.expect("server error");
}

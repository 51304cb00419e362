use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub assets_dir: String,
    pub mail_from: String,
    pub admin_notify_email: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub bootstrap_admin: Option<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://festival.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            assets_dir: "assets".to_string(),
            mail_from: "Festival <noreply@festival.local>".to_string(),
            admin_notify_email: None,
            smtp: None,
            bootstrap_admin: None,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match var("PORT") {
            Some(v) => parse_port("PORT", v)?,
            None => defaults.port,
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: match var("SMTP_PORT") {
                    Some(v) => parse_port("SMTP_PORT", v)?,
                    None => 587,
                },
                username: var("SMTP_USERNAME").unwrap_or_default(),
                password: var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            None => None,
        };

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_EMAIL"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: var("HOST").unwrap_or(defaults.host),
            port,
            assets_dir: var("ASSETS_DIR").unwrap_or(defaults.assets_dir),
            mail_from: var("MAIL_FROM").unwrap_or(defaults.mail_from),
            admin_notify_email: var("ADMIN_NOTIFY_EMAIL"),
            smtp,
            bootstrap_admin,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_numeric_port() {
        let err = parse_port("PORT", "eighty".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value: eighty");
    }

    #[test]
    fn default_bind_addr() {
        assert_eq!(Config::default().bind_addr(), "0.0.0.0:3000");
    }
}

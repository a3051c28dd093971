use serde::Deserialize;

/// Runtime configuration, sourced from the environment at startup.
///
/// The two secrets are deliberately separate values on separate credential
/// paths: `webhook_secret` authenticates the external intake caller,
/// `staff_session_key` authenticates dashboard staff. Either being unset is
/// an explicit state that the corresponding endpoint fails closed on, rather
/// than a missing-optional that would accept all callers.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub webhook_secret: Option<String>,
    pub staff_session_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            webhook_secret: std::env::var("SELECT_THERAPY_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            staff_session_key: std::env::var("STAFF_SESSION_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log configuration state without the secret values themselves
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        if config.webhook_secret.is_none() {
            tracing::warn!(
                "SELECT_THERAPY_WEBHOOK_SECRET not set: all intake requests will be rejected"
            );
        }
        if config.staff_session_key.is_none() {
            tracing::warn!("STAFF_SESSION_KEY not set: all dashboard requests will be rejected");
        }

        Ok(config)
    }
}

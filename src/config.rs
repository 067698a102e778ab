//! Configuration, built from environment variables.

/// Site identity used to seed the fixed placeholder keys.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub admin_email: String,
    pub site_title: String,
    pub site_url: String,
}

impl SiteConfig {
    /// Build from `ADMIN_EMAIL`, `SITE_TITLE` and `SITE_URL`.
    /// Absent variables fall back to empty strings.
    pub fn from_env() -> Self {
        Self {
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_default(),
            site_title: std::env::var("SITE_TITLE").unwrap_or_default(),
            site_url: std::env::var("SITE_URL").unwrap_or_default(),
        }
    }
}

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (outbound mail disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from_address = std::env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}

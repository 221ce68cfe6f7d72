use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Whether changing the password also ends the active session.
    pub revoke_session_on_password_change: bool,
    pub media_endpoint: String,
    pub media_bucket: String,
    pub media_access_key: String,
    pub media_secret_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            access_secret: std::env::var("ACCESS_TOKEN_SECRET")?,
            refresh_secret: std::env::var("REFRESH_TOKEN_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "vidnest".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "vidnest-users".into()),
            access_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_days: std::env::var("REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
        };
        anyhow::ensure!(
            jwt.access_secret != jwt.refresh_secret,
            "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
        );
        let revoke_session_on_password_change = std::env::var("REVOKE_SESSION_ON_PASSWORD_CHANGE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            database_url,
            jwt,
            revoke_session_on_password_change,
            media_endpoint: std::env::var("MEDIA_ENDPOINT")?,
            media_bucket: std::env::var("MEDIA_BUCKET")?,
            media_access_key: std::env::var("MEDIA_ACCESS_KEY")?,
            media_secret_key: std::env::var("MEDIA_SECRET_KEY")?,
        })
    }
}

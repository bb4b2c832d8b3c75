use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hospital_api_url: String,
    pub jwt_secret: String,
    pub request_timeout_secs: u64,
    pub bind_address: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            hospital_api_url: env::var("HOSPITAL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_API_URL not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("HOSPITAL_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            request_timeout_secs: env::var("HOSPITAL_API_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_else(|| {
                    warn!("HOSPITAL_API_TIMEOUT_SECS not set or invalid, using default");
                    DEFAULT_TIMEOUT_SECS
                }),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.hospital_api_url.is_empty() && !self.jwt_secret.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

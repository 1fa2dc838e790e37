use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub auth_secret: String,
    pub channel_ticket_ttl_secs: i64,
    pub channel_buffer_size: usize,
    pub cors_allow_any: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let auth_secret = env::var("AUTH_SECRET")
            .map_err(|_| AppError::Internal("AUTH_SECRET must be set".to_string()))?;
        if auth_secret.len() < 16 {
            return Err(AppError::Internal(
                "AUTH_SECRET must be at least 16 bytes".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            auth_secret,
            channel_ticket_ttl_secs: parse_or_default("CHANNEL_TICKET_TTL_SECS", 1800)?,
            channel_buffer_size: parse_or_default("CHANNEL_BUFFER_SIZE", 256)?,
            cors_allow_any: parse_or_default("CORS_ALLOW_ANY", true)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

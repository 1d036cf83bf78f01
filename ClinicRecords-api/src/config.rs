//! Application configuration loaded from the environment

use std::env;

use clinic_records_domain::database::{DatabaseConfig, DatabaseError};
use thiserror::Error;
use tracing::warn;

/// Secret used by debug builds when `JWT_SECRET` is unset
const DEVELOPMENT_JWT_SECRET: &str = "clinic-records-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),

    #[error("JWT_SECRET environment variable not found")]
    MissingJwtSecret,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => 3000,
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => {
                warn!("JWT_SECRET not set, using the development secret. Do not run like this in production.");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
            _ => return Err(ConfigError::MissingJwtSecret),
        };

        Ok(Self {
            port,
            database: DatabaseConfig::from_env()?,
            jwt_secret,
        })
    }
}

pub mod handlers;
pub mod routes;


use std::sync::Arc;

use axum::Router;
use tracing::info;

use clinic_records_domain::auth::token::TokenValidator;
use clinic_records_domain::database::{get_connection_info, initialize_database_pool, DatabaseError};
use clinic_records_domain::health::DatabaseHealthService;
use clinic_records_domain::services::create_default_health_metrics_service;

use crate::config::AppConfig;
pub use routes::{create_app, AppState};

/// Create the application router backed by the configured database
pub fn create_application(config: &AppConfig) -> Result<Router, DatabaseError> {
    let pool = initialize_database_pool(&config.database)?;
    info!("Database ready: {}", get_connection_info(&pool)?);

    let state = AppState {
        health_metrics: Arc::new(create_default_health_metrics_service(pool.clone())),
        health: Arc::new(DatabaseHealthService::new(pool, config.database.db_type)),
        token_validator: Arc::new(TokenValidator::new(&config.jwt_secret)),
    };

    Ok(create_app(state))
}

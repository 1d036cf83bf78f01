//! Domain layer health check functionality
//! This module provides health check services for the application

use std::collections::HashMap;

use async_trait::async_trait;
use clinic_records_data::database::{get_connection_info, DatabasePool, DatabaseType};
use tracing::{debug, warn};

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    ///
    /// - Ok(true) if the database is fully operational
    /// - Ok(false) if it runs in a degraded mode (in-memory fallback)
    /// - Err if it is unavailable
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Health service backed by the connection pool
#[derive(Debug, Clone)]
pub struct DatabaseHealthService {
    pool: DatabasePool,
    configured_type: DatabaseType,
}

impl DatabaseHealthService {
    /// `configured_type` is what was asked for, so a fallback can be told apart
    pub fn new(pool: DatabasePool, configured_type: DatabaseType) -> Self {
        Self { pool, configured_type }
    }
}

#[async_trait]
impl HealthServiceTrait for DatabaseHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let db_component = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: get_connection_info(&self.pool).ok(),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Running on the in-memory fallback database".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        let overall_status = match db_component.status {
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Healthy => SystemStatus::Healthy,
        };

        SystemHealth {
            status: overall_status,
            components: vec![("database".to_string(), db_component)].into_iter().collect(),
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let conn = self.pool.get().map_err(|e| {
            warn!("Database health check failed: {}", e);
            format!("Database connection error: {}", e)
        })?;

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| format!("Database query error: {}", e))?;

        let fallback = self.pool.is_in_memory() && self.configured_type != DatabaseType::Memory;
        debug!("Database health check passed (fallback: {})", fallback);
        Ok(!fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_records_data::database::{initialize_database_pool, DatabaseConfig};

    #[tokio::test]
    async fn test_in_memory_database_is_healthy_when_configured() {
        let pool = DatabasePool::in_memory().unwrap();
        let service = DatabaseHealthService::new(pool, DatabaseType::Memory);

        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Healthy);
        assert!(health.components.contains_key("database"));
    }

    #[tokio::test]
    async fn test_fallback_database_is_degraded() {
        let pool = DatabasePool::in_memory().unwrap();
        let service = DatabaseHealthService::new(pool, DatabaseType::Sqlite);

        assert_eq!(service.check_database_status().await, Ok(false));
        assert_eq!(service.get_system_health().await.status, SystemStatus::Degraded);
    }

    #[test]
    fn test_file_database_is_healthy() {
        let path = std::env::temp_dir().join(format!("clinic_records_health_{}.db", std::process::id()));
        let config = DatabaseConfig {
            sqlite_path: path.to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        };
        let pool = initialize_database_pool(&config).unwrap();
        let service = DatabaseHealthService::new(pool, DatabaseType::Sqlite);

        let health = tokio_test::block_on(service.get_system_health());
        assert_eq!(health.status, SystemStatus::Healthy);
        let details = health.components["database"].details.clone().unwrap_or_default();
        assert!(details.starts_with("SQLite database at"));

        let _ = std::fs::remove_file(&path);
    }
}

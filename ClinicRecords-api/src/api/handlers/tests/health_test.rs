use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, Extension};

use clinic_records_domain::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};

use crate::api::handlers::health::{health_check, HealthResponse, HealthService};

// Health service reporting a fixed database status
#[derive(Debug)]
struct FixedHealthService {
    database: ComponentStatus,
}

#[async_trait]
impl HealthServiceTrait for FixedHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let status = match self.database {
            ComponentStatus::Healthy => SystemStatus::Healthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        };

        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database.clone(),
                details: Some("fixed".to_string()),
            },
        );

        SystemHealth { status, components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("down".to_string()),
        }
    }
}

async fn check(database: ComponentStatus) -> (StatusCode, HealthResponse) {
    let service: HealthService = Arc::new(FixedHealthService { database });
    let response = health_check(Extension(service)).await.into_response();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_healthy_database() {
    let (status, body) = check(ComponentStatus::Healthy).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "ok");
    assert_eq!(body.components.database.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_degraded_database_still_serves() {
    let (status, body) = check(ComponentStatus::Degraded).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "degraded");
    assert_eq!(body.components.database.status, "degraded");
}

#[test]
fn test_unhealthy_database_is_unavailable() {
    let (status, body) = tokio_test::block_on(check(ComponentStatus::Unhealthy));

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.status, "error");
    assert_eq!(body.components.database.message.as_deref(), Some("fixed"));
}

pub mod analytics;
pub mod health_metrics;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use health_metrics::{
    create_default_health_metrics_service, HealthMetricsService, HealthMetricsServiceError,
    HealthMetricsServiceTrait,
};

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the bearer scheme the protected paths refer to
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Health metrics endpoints
        crate::api::handlers::health_metrics::record_reading,
        crate::api::handlers::health_metrics::list_readings,
        crate::api::handlers::health_metrics::get_statistics,
        crate::api::handlers::health_metrics::get_trends,
        crate::api::handlers::health_metrics::get_alerts,
        crate::api::handlers::health_metrics::list_thresholds,
        crate::api::handlers::health_metrics::upsert_threshold,
    ),
    components(
        schemas(
            // Envelopes
            crate::entities::common::ErrorResponse,
            crate::entities::common::ReadingsPage,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Domain payloads
            clinic_records_domain::entities::ParameterType,
            clinic_records_domain::entities::Period,
            clinic_records_domain::entities::Reading,
            clinic_records_domain::entities::CreateReadingRequest,
            clinic_records_domain::entities::Threshold,
            clinic_records_domain::entities::UpsertThresholdRequest,
            clinic_records_domain::entities::ParameterStatistics,
            clinic_records_domain::entities::StatisticsReport,
            clinic_records_domain::entities::TrendPoint,
            clinic_records_domain::entities::TrendDirection,
            clinic_records_domain::entities::TrendSummary,
            clinic_records_domain::entities::TrendAnalysis,
            clinic_records_domain::entities::AlertLevel,
            clinic_records_domain::entities::BandSource,
            clinic_records_domain::entities::Band,
            clinic_records_domain::entities::HealthAlert,
            clinic_records_domain::entities::AlertsReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "health_metrics", description = "Health readings, statistics, trends and alerts")
    ),
    info(
        title = "ClinicRecords Health Metrics API",
        version = "0.1.0",
        description = "API for recording health readings and analysing them",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

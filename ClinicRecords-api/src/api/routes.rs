use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use clinic_records_domain::auth::auth_middleware;
use clinic_records_domain::auth::token::TokenValidator;

use crate::api::handlers::health::{self, HealthService};
use crate::api::handlers::health_metrics::{self, HealthMetricsService};
use crate::openapi::configure_swagger_routes;

/// Everything the router needs, injected by the caller
#[derive(Clone)]
pub struct AppState {
    pub health_metrics: HealthMetricsService,
    pub health: HealthService,
    pub token_validator: Arc<TokenValidator>,
}

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    // Set up API routes that require authentication
    let api_routes = Router::new()
        .route(
            "/health-metrics",
            get(health_metrics::list_readings).post(health_metrics::record_reading),
        )
        .route("/health-metrics/statistics", get(health_metrics::get_statistics))
        .route("/health-metrics/trends", get(health_metrics::get_trends))
        .route("/health-metrics/alerts", get(health_metrics::get_alerts))
        .route(
            "/health-metrics/thresholds",
            get(health_metrics::list_thresholds).put(health_metrics::upsert_threshold),
        )
        .layer(middleware::from_fn_with_state(state.token_validator.clone(), auth_middleware))
        .with_state(state.health_metrics.clone());

    debug!("API routes configured");

    // Set up public routes that don't require authentication
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(state.health.clone()));

    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .merge(configure_swagger_routes())
        .layer(TraceLayer::new_for_http());

    configure_security(app)
}

/// Apply CORS and security headers to the whole application
pub fn configure_security(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    app.layer(cors).layer(security_headers)
}

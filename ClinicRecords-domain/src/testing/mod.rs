// Testing utilities for the domain layer and its dependents
// This module is only available in tests or when the "mock" feature is enabled

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

pub use clinic_records_data::repository::InMemoryHealthMetricsRepository;

use crate::auth::{Claims, Role, UserInfo};
use crate::entities::health_metric::{CreateReadingRequest, ParameterType};
use crate::services::health_metrics::HealthMetricsService;

/// Service over an empty in-memory repository
pub fn in_memory_health_metrics_service() -> HealthMetricsService<InMemoryHealthMetricsRepository> {
    HealthMetricsService::new(InMemoryHealthMetricsRepository::new())
}

pub fn patient_user(user_id: i64) -> UserInfo {
    UserInfo::new(user_id, Role::Patient)
}

pub fn doctor_user(user_id: i64) -> UserInfo {
    UserInfo::new(user_id, Role::Doctor)
}

/// Request for a reading taken at `recorded_at`, for the caller themselves
pub fn reading_request(
    parameter_type: ParameterType,
    value: &str,
    recorded_at: DateTime<Utc>,
) -> CreateReadingRequest {
    CreateReadingRequest {
        patient_id: None,
        parameter_type,
        value: value.to_string(),
        unit: None,
        recorded_at: Some(recorded_at),
        notes: None,
    }
}

/// Sign an HS256 token for `user`, valid for an hour
pub fn mint_token(secret: &str, user: &UserInfo) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.user_id.to_string(),
        role: user.role,
        iat: now,
        exp: now + 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .unwrap_or_default()
}

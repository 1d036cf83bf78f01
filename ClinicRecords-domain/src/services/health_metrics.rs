use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::Validate;

use clinic_records_data::database::DatabasePool;
use clinic_records_data::models::{format_timestamp, ReadingRecord};
use clinic_records_data::repository::{
    HealthMetricsRepository, HealthMetricsRepositoryTrait, RepositoryError,
};

use crate::auth::authorize::{ensure_role, resolve_patient_scope, resolve_write_target, AccessError};
use crate::auth::{Role, UserInfo};
use crate::entities::conversions;
use crate::entities::health_metric::{
    AlertsReport, CreateReadingRequest, MetricValue, ParameterType, Period, Reading,
    StatisticsReport, Threshold, TrendAnalysis, UpsertThresholdRequest,
};
use crate::services::analytics;

/// Page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Largest page a caller may ask for
pub const MAX_PAGE_SIZE: usize = 1000;
/// How far in the future a reading may be dated, to absorb clock skew
const MAX_FUTURE_SKEW_MINUTES: i64 = 5;

/// Health metrics service errors
#[derive(Debug, Error)]
pub enum HealthMetricsServiceError {
    /// A non-patient caller did not name the patient
    #[error("patient_id is required")]
    MissingPatientIdentifier,

    /// A filter the operation needs was not supplied
    #[error("{0} is required")]
    MissingRequiredFilter(String),

    /// Reading value does not parse for its parameter type
    #[error("Malformed reading value: {0}")]
    MalformedReadingValue(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller role may not perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage could not be read or written
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl HealthMetricsServiceError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            HealthMetricsServiceError::MissingPatientIdentifier => "missing_patient_id",
            HealthMetricsServiceError::MissingRequiredFilter(_) => "missing_parameter_type",
            HealthMetricsServiceError::MalformedReadingValue(_) => "malformed_value",
            HealthMetricsServiceError::ValidationError(_) => "validation_error",
            HealthMetricsServiceError::Forbidden(_) => "forbidden",
            HealthMetricsServiceError::StorageFailure(_) => "storage_failure",
        }
    }
}

impl From<AccessError> for HealthMetricsServiceError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::MissingPatientIdentifier => HealthMetricsServiceError::MissingPatientIdentifier,
            AccessError::Forbidden(reason) => HealthMetricsServiceError::Forbidden(reason),
        }
    }
}

/// Trait for health metrics service operations
///
/// Every operation is scoped by the caller identity.
#[async_trait]
pub trait HealthMetricsServiceTrait: Send + Sync {
    /// Record a new reading
    async fn record_reading(
        &self,
        user: &UserInfo,
        request: CreateReadingRequest,
    ) -> Result<Reading, HealthMetricsServiceError>;

    /// A page of readings, newest first, with the total count
    async fn list_readings(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<(Vec<Reading>, usize), HealthMetricsServiceError>;

    /// Create or replace the caller's own threshold
    async fn upsert_threshold(
        &self,
        user: &UserInfo,
        request: UpsertThresholdRequest,
    ) -> Result<Threshold, HealthMetricsServiceError>;

    /// Thresholds of a patient
    async fn list_thresholds(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
    ) -> Result<Vec<Threshold>, HealthMetricsServiceError>;

    /// Count/average/min/max per parameter type over the period
    async fn get_statistics(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        period: Option<Period>,
    ) -> Result<StatisticsReport, HealthMetricsServiceError>;

    /// Bucketed series and direction for one parameter type
    async fn get_trend(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        period: Option<Period>,
    ) -> Result<TrendAnalysis, HealthMetricsServiceError>;

    /// Latest readings outside their band
    async fn get_alerts(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
    ) -> Result<AlertsReport, HealthMetricsServiceError>;
}

/// Health metrics service for domain logic
pub struct HealthMetricsService<R: HealthMetricsRepositoryTrait> {
    repository: R,
}

impl<R: HealthMetricsRepositoryTrait> HealthMetricsService<R> {
    /// Create a new health metrics service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> HealthMetricsServiceError {
        match err {
            RepositoryError::Constraint(msg) => HealthMetricsServiceError::ValidationError(msg),
            other => {
                error!("Repository error: {}", other);
                HealthMetricsServiceError::StorageFailure(other.to_string())
            }
        }
    }

    /// Convert stored rows, dropping the ones that no longer decode
    fn convert_rows(&self, records: Vec<ReadingRecord>) -> Vec<Reading> {
        records
            .into_iter()
            .filter_map(|record| {
                let id = record.id;
                conversions::convert_to_domain_reading(record)
                    .map_err(|e| warn!(reading_id = id, "Skipping undecodable reading row: {}", e))
                    .ok()
            })
            .collect()
    }

    async fn readings_in_window(
        &self,
        patient_id: i64,
        parameter_type: Option<ParameterType>,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reading>, HealthMetricsServiceError> {
        let since = format_timestamp(&period.window_start(now));
        let records = self
            .repository
            .get_readings_since(patient_id, parameter_type.map(|t| t.as_str().to_string()), since)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(self.convert_rows(records))
    }

    async fn thresholds_of(&self, patient_id: i64) -> Result<Vec<Threshold>, HealthMetricsServiceError> {
        let records = self
            .repository
            .get_thresholds(patient_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                conversions::convert_to_domain_threshold(record)
                    .map_err(|e| warn!("Skipping undecodable threshold row: {}", e))
                    .ok()
            })
            .collect())
    }
}

/// Flatten validator errors into one message
fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ")
}

#[async_trait]
impl<R: HealthMetricsRepositoryTrait> HealthMetricsServiceTrait for HealthMetricsService<R> {
    async fn record_reading(
        &self,
        user: &UserInfo,
        request: CreateReadingRequest,
    ) -> Result<Reading, HealthMetricsServiceError> {
        request
            .validate()
            .map_err(|e| HealthMetricsServiceError::ValidationError(validation_message(&e)))?;

        let patient_id = resolve_write_target(user, request.patient_id)?;

        MetricValue::parse(request.parameter_type, &request.value)
            .map_err(|e| HealthMetricsServiceError::MalformedReadingValue(e.to_string()))?;

        let now = Utc::now();
        let recorded_at = request.recorded_at.unwrap_or(now);
        if recorded_at > now + Duration::minutes(MAX_FUTURE_SKEW_MINUTES) {
            return Err(HealthMetricsServiceError::ValidationError(
                "recorded_at cannot be in the future".to_string(),
            ));
        }

        let unit = request
            .unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| request.parameter_type.default_unit().to_string());

        let record = conversions::convert_to_data_new_reading(
            patient_id,
            request.parameter_type,
            request.value.trim().to_string(),
            Some(unit),
            &recorded_at,
            request.notes,
            user.user_id,
        );

        let stored = self
            .repository
            .insert_reading(record)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let reading = conversions::convert_to_domain_reading(stored)
            .map_err(HealthMetricsServiceError::StorageFailure)?;

        info!(
            reading_id = reading.id,
            patient_id,
            parameter_type = %reading.parameter_type,
            recorded_by = user.user_id,
            "Recorded health reading"
        );
        Ok(reading)
    }

    async fn list_readings(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<(Vec<Reading>, usize), HealthMetricsServiceError> {
        let patient_id = resolve_patient_scope(user, patient_id)?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);

        let (records, total) = self
            .repository
            .get_readings_page(patient_id, parameter_type.map(|t| t.as_str().to_string()), limit, offset)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok((self.convert_rows(records), total))
    }

    async fn upsert_threshold(
        &self,
        user: &UserInfo,
        request: UpsertThresholdRequest,
    ) -> Result<Threshold, HealthMetricsServiceError> {
        ensure_role(user, &[Role::Patient], "thresholds")?;

        if !request.min_value.is_finite() || !request.max_value.is_finite() {
            return Err(HealthMetricsServiceError::ValidationError(
                "min_value and max_value must be finite numbers".to_string(),
            ));
        }
        if request.min_value >= request.max_value {
            return Err(HealthMetricsServiceError::ValidationError(
                "min_value must be less than max_value".to_string(),
            ));
        }

        let record = conversions::convert_to_data_threshold(
            user.user_id,
            request.parameter_type,
            request.min_value,
            request.max_value,
        );
        let stored = self
            .repository
            .upsert_threshold(record)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(patient_id = user.user_id, parameter_type = %request.parameter_type, "Threshold saved");
        conversions::convert_to_domain_threshold(stored).map_err(HealthMetricsServiceError::StorageFailure)
    }

    async fn list_thresholds(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
    ) -> Result<Vec<Threshold>, HealthMetricsServiceError> {
        let patient_id = resolve_patient_scope(user, patient_id)?;
        self.thresholds_of(patient_id).await
    }

    async fn get_statistics(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        period: Option<Period>,
    ) -> Result<StatisticsReport, HealthMetricsServiceError> {
        let patient_id = resolve_patient_scope(user, patient_id)?;
        let period = period.unwrap_or_default();

        let readings = self.readings_in_window(patient_id, parameter_type, period, Utc::now()).await?;
        debug!("Computing statistics over {} readings for patient {}", readings.len(), patient_id);

        Ok(StatisticsReport {
            patient_id,
            period,
            statistics: analytics::compute_statistics(&readings),
        })
    }

    async fn get_trend(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
        parameter_type: Option<ParameterType>,
        period: Option<Period>,
    ) -> Result<TrendAnalysis, HealthMetricsServiceError> {
        let patient_id = resolve_patient_scope(user, patient_id)?;
        let parameter_type = parameter_type
            .ok_or_else(|| HealthMetricsServiceError::MissingRequiredFilter("parameter_type".to_string()))?;
        let period = period.unwrap_or_default();

        let readings = self
            .readings_in_window(patient_id, Some(parameter_type), period, Utc::now())
            .await?;
        let data = analytics::bucket_readings(&readings, period);
        let trend = analytics::classify_trend(&data);

        Ok(TrendAnalysis { patient_id, parameter_type, period, data, trend })
    }

    async fn get_alerts(
        &self,
        user: &UserInfo,
        patient_id: Option<i64>,
    ) -> Result<AlertsReport, HealthMetricsServiceError> {
        let patient_id = resolve_patient_scope(user, patient_id)?;

        let latest = self
            .repository
            .get_latest_per_type(patient_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        let thresholds = self.thresholds_of(patient_id).await?;

        let alerts = analytics::evaluate_alerts(self.convert_rows(latest), &thresholds);
        if !alerts.is_empty() {
            info!(patient_id, count = alerts.len(), "Health alerts raised");
        }

        Ok(AlertsReport { patient_id, count: alerts.len(), alerts })
    }
}

/// Create the default health metrics service over a database pool
pub fn create_default_health_metrics_service(
    pool: DatabasePool,
) -> HealthMetricsService<HealthMetricsRepository> {
    HealthMetricsService::new(HealthMetricsRepository::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_records_data::models::{NewReadingRecord, NewThresholdRecord, ThresholdRecord};
    use clinic_records_data::repository::InMemoryHealthMetricsRepository;
    use crate::entities::health_metric::{AlertLevel, BandSource, TrendDirection};
    use mockall::mock;

    mock! {
        pub Repo {}

        #[async_trait]
        impl HealthMetricsRepositoryTrait for Repo {
            async fn insert_reading(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError>;
            async fn get_readings_since(
                &self,
                patient_id: i64,
                parameter_type: Option<String>,
                since: String,
            ) -> Result<Vec<ReadingRecord>, RepositoryError>;
            async fn get_latest_per_type(&self, patient_id: i64) -> Result<Vec<ReadingRecord>, RepositoryError>;
            async fn get_readings_page(
                &self,
                patient_id: i64,
                parameter_type: Option<String>,
                limit: usize,
                offset: usize,
            ) -> Result<(Vec<ReadingRecord>, usize), RepositoryError>;
            async fn upsert_threshold(&self, threshold: NewThresholdRecord) -> Result<ThresholdRecord, RepositoryError>;
            async fn get_thresholds(&self, patient_id: i64) -> Result<Vec<ThresholdRecord>, RepositoryError>;
        }
    }

    fn patient(id: i64) -> UserInfo {
        UserInfo::new(id, Role::Patient)
    }

    fn doctor() -> UserInfo {
        UserInfo::new(900, Role::Doctor)
    }

    fn service() -> HealthMetricsService<InMemoryHealthMetricsRepository> {
        HealthMetricsService::new(InMemoryHealthMetricsRepository::new())
    }

    fn request(parameter_type: ParameterType, value: &str, hours_ago: i64) -> CreateReadingRequest {
        CreateReadingRequest {
            patient_id: None,
            parameter_type,
            value: value.to_string(),
            unit: None,
            recorded_at: Some(Utc::now() - Duration::hours(hours_ago)),
            notes: None,
        }
    }

    fn pool_error() -> RepositoryError {
        RepositoryError::Lock("connection lost".to_string())
    }

    #[tokio::test]
    async fn test_record_reading_for_self() {
        let service = service();
        let reading = service
            .record_reading(&patient(1), request(ParameterType::HeartRate, "72", 1))
            .await
            .unwrap();

        assert_eq!(reading.patient_id, 1);
        assert_eq!(reading.recorded_by, Some(1));
        assert_eq!(reading.unit.as_deref(), Some("bpm"));
    }

    #[tokio::test]
    async fn test_patient_cannot_record_for_someone_else() {
        let service = service();
        let mut req = request(ParameterType::HeartRate, "72", 1);
        req.patient_id = Some(2);

        let reading = service.record_reading(&patient(1), req).await.unwrap();
        assert_eq!(reading.patient_id, 1);
    }

    #[tokio::test]
    async fn test_doctor_records_for_named_patient() {
        let service = service();
        let mut req = request(ParameterType::BloodSugar, "95", 1);

        let missing = service.record_reading(&doctor(), req.clone()).await.unwrap_err();
        assert!(matches!(missing, HealthMetricsServiceError::MissingPatientIdentifier));

        req.patient_id = Some(4);
        let reading = service.record_reading(&doctor(), req).await.unwrap();
        assert_eq!(reading.patient_id, 4);
        assert_eq!(reading.recorded_by, Some(900));
    }

    #[tokio::test]
    async fn test_admin_cannot_record() {
        let service = service();
        let mut req = request(ParameterType::Weight, "70", 1);
        req.patient_id = Some(4);

        let err = service.record_reading(&UserInfo::new(3, Role::Admin), req).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn test_record_rejects_malformed_value() {
        let service = service();
        let err = service
            .record_reading(&patient(1), request(ParameterType::BloodPressure, "120", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, HealthMetricsServiceError::MalformedReadingValue(_)));
        assert_eq!(err.code(), "malformed_value");
    }

    #[tokio::test]
    async fn test_record_rejects_future_reading() {
        let service = service();
        let err = service
            .record_reading(&patient(1), request(ParameterType::Weight, "70", -2))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn test_statistics_requires_patient_for_doctor() {
        let service = service();
        let err = service.get_statistics(&doctor(), None, None, None).await.unwrap_err();
        assert_eq!(err.code(), "missing_patient_id");
    }

    #[tokio::test]
    async fn test_statistics_over_window() {
        let service = service();
        let user = patient(1);
        for (value, hours_ago) in [("70", 1), ("80", 30), ("90", 24 * 10)] {
            service
                .record_reading(&user, request(ParameterType::HeartRate, value, hours_ago))
                .await
                .unwrap();
        }
        service
            .record_reading(&user, request(ParameterType::BloodPressure, "120/80", 2))
            .await
            .unwrap();

        let week = service.get_statistics(&user, None, None, Some(Period::Week)).await.unwrap();
        assert_eq!(week.period, Period::Week);
        assert_eq!(week.statistics.len(), 2);
        assert_eq!(week.statistics[0].parameter_type, ParameterType::BloodPressure);
        assert_eq!(week.statistics[1].count, 2);
        assert_eq!(week.statistics[1].average, 75.0);

        let month = service
            .get_statistics(&user, None, Some(ParameterType::HeartRate), None)
            .await
            .unwrap();
        assert_eq!(month.period, Period::Month);
        assert_eq!(month.statistics.len(), 1);
        assert_eq!(month.statistics[0].count, 3);
    }

    #[tokio::test]
    async fn test_statistics_only_see_own_readings() {
        let service = service();
        service
            .record_reading(&patient(2), request(ParameterType::HeartRate, "72", 1))
            .await
            .unwrap();

        let report = service.get_statistics(&patient(1), Some(2), None, None).await.unwrap();
        assert_eq!(report.patient_id, 1);
        assert!(report.statistics.is_empty());
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let service = service();
        let user = patient(1);

        assert!(service.get_statistics(&user, None, None, None).await.unwrap().statistics.is_empty());

        let trend = service
            .get_trend(&user, None, Some(ParameterType::Weight), None)
            .await
            .unwrap();
        assert!(trend.data.is_empty());
        assert_eq!(trend.trend.direction, TrendDirection::InsufficientData);

        let alerts = service.get_alerts(&user, None).await.unwrap();
        assert_eq!(alerts.count, 0);
        assert!(alerts.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_trend_requires_parameter_type() {
        let service = service();
        let err = service.get_trend(&patient(1), None, None, None).await.unwrap_err();
        assert!(matches!(err, HealthMetricsServiceError::MissingRequiredFilter(_)));
        assert_eq!(err.code(), "missing_parameter_type");
    }

    #[tokio::test]
    async fn test_trend_increasing_over_days() {
        let service = service();
        let user = patient(1);
        for (value, days_ago) in [("80", 3), ("84", 2), ("90", 1)] {
            service
                .record_reading(&user, request(ParameterType::Weight, value, days_ago * 24))
                .await
                .unwrap();
        }

        let trend = service
            .get_trend(&user, None, Some(ParameterType::Weight), Some(Period::Week))
            .await
            .unwrap();
        assert_eq!(trend.data.len(), 3);
        assert_eq!(trend.trend.direction, TrendDirection::Increasing);
        assert_eq!(trend.trend.change_percentage, 12.5);
    }

    #[tokio::test]
    async fn test_alerts_use_latest_reading_per_type() {
        let service = service();
        let user = patient(1);
        service
            .record_reading(&user, request(ParameterType::HeartRate, "120", 5))
            .await
            .unwrap();
        service
            .record_reading(&user, request(ParameterType::HeartRate, "72", 1))
            .await
            .unwrap();
        service
            .record_reading(&user, request(ParameterType::BloodPressure, "150/95", 1))
            .await
            .unwrap();

        let report = service.get_alerts(&user, None).await.unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.alerts[0].reading.parameter_type, ParameterType::BloodPressure);
        assert_eq!(report.alerts[0].status, AlertLevel::High);
    }

    #[tokio::test]
    async fn test_alerts_consult_patient_threshold() {
        let service = service();
        let user = patient(1);
        service
            .upsert_threshold(&user, UpsertThresholdRequest {
                parameter_type: ParameterType::Temperature,
                min_value: 36.0,
                max_value: 37.5,
            })
            .await
            .unwrap();
        service
            .record_reading(&user, request(ParameterType::Temperature, "38.2", 1))
            .await
            .unwrap();

        let report = service.get_alerts(&user, None).await.unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.alerts[0].band.source, BandSource::Threshold);
    }

    #[tokio::test]
    async fn test_threshold_rules() {
        let service = service();
        let bad_range = UpsertThresholdRequest {
            parameter_type: ParameterType::HeartRate,
            min_value: 100.0,
            max_value: 60.0,
        };
        let err = service.upsert_threshold(&patient(1), bad_range.clone()).await.unwrap_err();
        assert_eq!(err.code(), "validation_error");

        let err = service
            .upsert_threshold(&doctor(), UpsertThresholdRequest { min_value: 50.0, max_value: 110.0, ..bad_range })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn test_list_readings_paging() {
        let service = service();
        let user = patient(1);
        for hours_ago in 1..=5 {
            service
                .record_reading(&user, request(ParameterType::HeartRate, "70", hours_ago))
                .await
                .unwrap();
        }

        let (page, total) = service.list_readings(&user, None, None, Some(2), Some(1)).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert!(page[0].recorded_at > page[1].recorded_at);
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let mut repo = MockRepo::new();
        repo.expect_get_readings_since().returning(|_, _, _| Err(pool_error()));
        repo.expect_get_latest_per_type().returning(|_| Err(pool_error()));
        let service = HealthMetricsService::new(repo);

        let err = service.get_statistics(&patient(1), None, None, None).await.unwrap_err();
        assert!(matches!(err, HealthMetricsServiceError::StorageFailure(_)));
        assert_eq!(err.code(), "storage_failure");

        let err = service.get_alerts(&patient(1), None).await.unwrap_err();
        assert_eq!(err.code(), "storage_failure");
    }

    #[tokio::test]
    async fn test_statistics_query_uses_window_and_type() {
        let mut repo = MockRepo::new();
        repo.expect_get_readings_since()
            .withf(|patient_id, parameter_type, since| {
                *patient_id == 7
                    && parameter_type.as_deref() == Some("blood_sugar")
                    && since.ends_with('Z')
            })
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        let service = HealthMetricsService::new(repo);

        let report = service
            .get_statistics(&doctor(), Some(7), Some(ParameterType::BloodSugar), Some(Period::Day))
            .await
            .unwrap();
        assert!(report.statistics.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_rows_are_skipped() {
        let now = format_timestamp(&Utc::now());
        let rows = vec![
            ReadingRecord {
                id: 1,
                patient_id: 1,
                parameter_type: "heart_rate".to_string(),
                value: "fast".to_string(),
                unit: None,
                recorded_at: now.clone(),
                notes: None,
                recorded_by: None,
                created_at: now.clone(),
            },
            ReadingRecord {
                id: 2,
                patient_id: 1,
                parameter_type: "heart_rate".to_string(),
                value: "80".to_string(),
                unit: None,
                recorded_at: now.clone(),
                notes: None,
                recorded_by: None,
                created_at: now,
            },
        ];
        let service = HealthMetricsService::new(InMemoryHealthMetricsRepository::with_readings(rows));

        let report = service.get_statistics(&patient(1), None, None, Some(Period::Day)).await.unwrap();
        assert_eq!(report.statistics[0].count, 1);
        assert_eq!(report.statistics[0].average, 80.0);
    }
}

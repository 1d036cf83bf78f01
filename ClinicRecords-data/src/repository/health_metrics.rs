use async_trait::async_trait;
use tracing::{debug, error};

use crate::database::DatabasePool;
use crate::models::health_metric::{NewReadingRecord, NewThresholdRecord, ReadingRecord, ThresholdRecord};
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for health readings and thresholds
///
/// Every read is scoped to a single patient.
#[async_trait]
pub trait HealthMetricsRepositoryTrait: Send + Sync {
    /// Insert a new reading
    async fn insert_reading(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError>;

    /// Readings recorded on/after `since` (RFC 3339, UTC), oldest first
    async fn get_readings_since(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        since: String,
    ) -> Result<Vec<ReadingRecord>, RepositoryError>;

    /// The single most recent reading of each parameter type
    async fn get_latest_per_type(&self, patient_id: i64) -> Result<Vec<ReadingRecord>, RepositoryError>;

    /// A page of readings, newest first, together with the total count
    async fn get_readings_page(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<ReadingRecord>, usize), RepositoryError>;

    /// Create or replace the threshold for (patient, parameter type)
    async fn upsert_threshold(&self, threshold: NewThresholdRecord) -> Result<ThresholdRecord, RepositoryError>;

    /// All thresholds of a patient
    async fn get_thresholds(&self, patient_id: i64) -> Result<Vec<ThresholdRecord>, RepositoryError>;
}

/// SQLite-backed repository for health metrics
#[derive(Debug, Clone)]
pub struct HealthMetricsRepository {
    pool: DatabasePool,
}

impl HealthMetricsRepository {
    /// Create a new repository over an initialized pool
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthMetricsRepositoryTrait for HealthMetricsRepository {
    async fn insert_reading(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::insert_reading(&conn, &reading).map_err(|e| {
            error!("Failed to store reading in database: {}", e);
            e
        })
    }

    async fn get_readings_since(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        since: String,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        debug!("Getting readings for patient {} since {}", patient_id, since);
        let conn = self.pool.get()?;
        DatabaseStorage::readings_since(&conn, patient_id, parameter_type.as_deref(), &since)
    }

    async fn get_latest_per_type(&self, patient_id: i64) -> Result<Vec<ReadingRecord>, RepositoryError> {
        debug!("Getting latest reading per type for patient {}", patient_id);
        let conn = self.pool.get()?;
        DatabaseStorage::latest_per_type(&conn, patient_id)
    }

    async fn get_readings_page(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<ReadingRecord>, usize), RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::readings_page(&conn, patient_id, parameter_type.as_deref(), limit, offset)
    }

    async fn upsert_threshold(&self, threshold: NewThresholdRecord) -> Result<ThresholdRecord, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::upsert_threshold(&conn, &threshold)
    }

    async fn get_thresholds(&self, patient_id: i64) -> Result<Vec<ThresholdRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::thresholds(&conn, patient_id)
    }
}

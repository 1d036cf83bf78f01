use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::health_metric::{
    format_timestamp, NewReadingRecord, NewThresholdRecord, ReadingRecord, ThresholdRecord,
};
use super::errors::RepositoryError;
use super::health_metrics::HealthMetricsRepositoryTrait;

#[derive(Debug, Default)]
struct Tables {
    readings: Vec<ReadingRecord>,
    thresholds: Vec<ThresholdRecord>,
    next_reading_id: i64,
    next_threshold_id: i64,
}

/// In-memory repository with the same ordering rules as the SQLite one
#[derive(Debug, Clone, Default)]
pub struct InMemoryHealthMetricsRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryHealthMetricsRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with predefined readings, ids are kept as given
    pub fn with_readings(readings: Vec<ReadingRecord>) -> Self {
        let next_reading_id = readings.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            tables: Arc::new(Mutex::new(Tables {
                readings,
                next_reading_id,
                ..Tables::default()
            })),
        }
    }
}

#[async_trait]
impl HealthMetricsRepositoryTrait for InMemoryHealthMetricsRepository {
    async fn insert_reading(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        let mut tables = self.tables.lock()?;
        tables.next_reading_id += 1;

        let record = ReadingRecord {
            id: tables.next_reading_id,
            patient_id: reading.patient_id,
            parameter_type: reading.parameter_type,
            value: reading.value,
            unit: reading.unit,
            recorded_at: reading.recorded_at,
            notes: reading.notes,
            recorded_by: reading.recorded_by,
            created_at: format_timestamp(&Utc::now()),
        };
        tables.readings.push(record.clone());
        Ok(record)
    }

    async fn get_readings_since(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        since: String,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let tables = self.tables.lock()?;
        let mut readings: Vec<ReadingRecord> = tables
            .readings
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .filter(|r| parameter_type.as_ref().map_or(true, |t| &r.parameter_type == t))
            .filter(|r| r.recorded_at >= since)
            .cloned()
            .collect();

        readings.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
        Ok(readings)
    }

    async fn get_latest_per_type(&self, patient_id: i64) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let tables = self.tables.lock()?;
        let mut latest: Vec<ReadingRecord> = Vec::new();

        for reading in tables.readings.iter().filter(|r| r.patient_id == patient_id) {
            match latest.iter_mut().find(|l| l.parameter_type == reading.parameter_type) {
                Some(current) => {
                    let newer = (&reading.recorded_at, reading.id) > (&current.recorded_at, current.id);
                    if newer {
                        *current = reading.clone();
                    }
                }
                None => latest.push(reading.clone()),
            }
        }

        latest.sort_by(|a, b| a.parameter_type.cmp(&b.parameter_type));
        Ok(latest)
    }

    async fn get_readings_page(
        &self,
        patient_id: i64,
        parameter_type: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<ReadingRecord>, usize), RepositoryError> {
        let tables = self.tables.lock()?;
        let mut readings: Vec<ReadingRecord> = tables
            .readings
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .filter(|r| parameter_type.as_ref().map_or(true, |t| &r.parameter_type == t))
            .cloned()
            .collect();

        readings.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));

        let total = readings.len();
        let page = readings.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn upsert_threshold(&self, threshold: NewThresholdRecord) -> Result<ThresholdRecord, RepositoryError> {
        if threshold.min_value >= threshold.max_value {
            return Err(RepositoryError::Constraint(format!(
                "min_value {} must be below max_value {}",
                threshold.min_value, threshold.max_value
            )));
        }

        let mut tables = self.tables.lock()?;
        let updated_at = format_timestamp(&Utc::now());

        let existing = tables
            .thresholds
            .iter_mut()
            .find(|t| t.patient_id == threshold.patient_id && t.parameter_type == threshold.parameter_type);

        if let Some(existing) = existing {
            existing.min_value = threshold.min_value;
            existing.max_value = threshold.max_value;
            existing.updated_at = updated_at;
            return Ok(existing.clone());
        }

        tables.next_threshold_id += 1;
        let record = ThresholdRecord {
            id: tables.next_threshold_id,
            patient_id: threshold.patient_id,
            parameter_type: threshold.parameter_type,
            min_value: threshold.min_value,
            max_value: threshold.max_value,
            updated_at,
        };
        tables.thresholds.push(record.clone());
        Ok(record)
    }

    async fn get_thresholds(&self, patient_id: i64) -> Result<Vec<ThresholdRecord>, RepositoryError> {
        let tables = self.tables.lock()?;
        let mut thresholds: Vec<ThresholdRecord> = tables
            .thresholds
            .iter()
            .filter(|t| t.patient_id == patient_id)
            .cloned()
            .collect();
        thresholds.sort_by(|a, b| a.parameter_type.cmp(&b.parameter_type));
        Ok(thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    fn record(id: i64, parameter_type: &str, value: &str, recorded_at: &str) -> ReadingRecord {
        ReadingRecord {
            id,
            patient_id: 1,
            parameter_type: parameter_type.to_string(),
            value: value.to_string(),
            unit: None,
            recorded_at: recorded_at.to_string(),
            notes: None,
            recorded_by: Some(1),
            created_at: recorded_at.to_string(),
        }
    }

    #[test]
    fn test_latest_per_type_matches_sqlite_ordering() {
        let repo = InMemoryHealthMetricsRepository::with_readings(vec![
            record(1, "heart_rate", "70", "2024-05-01T08:00:00.000Z"),
            record(2, "heart_rate", "90", "2024-05-02T08:00:00.000Z"),
            record(3, "heart_rate", "95", "2024-05-02T08:00:00.000Z"),
            record(4, "blood_pressure", "120/80", "2024-05-01T08:00:00.000Z"),
        ]);

        let latest = block_on(repo.get_latest_per_type(1)).unwrap();
        let ids: Vec<i64> = latest.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_inserted_ids_continue_after_seeded_rows() {
        let repo = InMemoryHealthMetricsRepository::with_readings(vec![record(
            10,
            "weight",
            "70",
            "2024-05-01T08:00:00.000Z",
        )]);

        let inserted = block_on(repo.insert_reading(NewReadingRecord {
            patient_id: 1,
            parameter_type: "weight".to_string(),
            value: "71".to_string(),
            unit: Some("kg".to_string()),
            recorded_at: "2024-05-02T08:00:00.000Z".to_string(),
            notes: None,
            recorded_by: Some(1),
        }))
        .unwrap();
        assert_eq!(inserted.id, 11);

        let since = block_on(repo.get_readings_since(1, None, "2024-05-02T00:00:00.000Z".to_string())).unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].id, 11);
    }

    #[test]
    fn test_inverted_threshold_is_rejected() {
        let repo = InMemoryHealthMetricsRepository::new();
        let result = block_on(repo.upsert_threshold(NewThresholdRecord {
            patient_id: 1,
            parameter_type: "heart_rate".to_string(),
            min_value: 100.0,
            max_value: 100.0,
        }));

        assert!(matches!(result, Err(RepositoryError::Constraint(_))));
    }
}

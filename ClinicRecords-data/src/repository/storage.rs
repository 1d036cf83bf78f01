use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::models::health_metric::{
    format_timestamp, NewReadingRecord, NewThresholdRecord, ReadingRecord, ThresholdRecord,
};
use super::errors::RepositoryError;

/// Read queries over `health_readings`.
///
/// Every variant maps to one fixed, parameterized statement. Callers pick a
/// variant; they never assemble SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingQuery {
    /// ?1 patient, ?2 lower bound on recorded_at; oldest first
    Since,
    /// ?1 patient, ?2 parameter type, ?3 lower bound on recorded_at; oldest first
    SinceByType,
    /// ?1 patient; one row per parameter type, highest id wins ties
    LatestPerType,
    /// ?1 patient, ?2 limit, ?3 offset; newest first
    Page,
    /// ?1 patient, ?2 parameter type, ?3 limit, ?4 offset; newest first
    PageByType,
    /// ?1 patient
    Count,
    /// ?1 patient, ?2 parameter type
    CountByType,
}

impl ReadingQuery {
    /// SQL text for this query
    pub const fn sql(self) -> &'static str {
        match self {
            ReadingQuery::Since => {
                "SELECT id, patient_id, parameter_type, value, unit, recorded_at, notes, recorded_by, created_at
                 FROM health_readings
                 WHERE patient_id = ?1 AND recorded_at >= ?2
                 ORDER BY recorded_at ASC, id ASC"
            }
            ReadingQuery::SinceByType => {
                "SELECT id, patient_id, parameter_type, value, unit, recorded_at, notes, recorded_by, created_at
                 FROM health_readings
                 WHERE patient_id = ?1 AND parameter_type = ?2 AND recorded_at >= ?3
                 ORDER BY recorded_at ASC, id ASC"
            }
            ReadingQuery::LatestPerType => {
                "SELECT r.id, r.patient_id, r.parameter_type, r.value, r.unit, r.recorded_at, r.notes, r.recorded_by, r.created_at
                 FROM health_readings r
                 WHERE r.patient_id = ?1
                   AND r.id = (
                       SELECT l.id FROM health_readings l
                       WHERE l.patient_id = r.patient_id AND l.parameter_type = r.parameter_type
                       ORDER BY l.recorded_at DESC, l.id DESC
                       LIMIT 1
                   )
                 ORDER BY r.parameter_type ASC"
            }
            ReadingQuery::Page => {
                "SELECT id, patient_id, parameter_type, value, unit, recorded_at, notes, recorded_by, created_at
                 FROM health_readings
                 WHERE patient_id = ?1
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            }
            ReadingQuery::PageByType => {
                "SELECT id, patient_id, parameter_type, value, unit, recorded_at, notes, recorded_by, created_at
                 FROM health_readings
                 WHERE patient_id = ?1 AND parameter_type = ?2
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT ?3 OFFSET ?4"
            }
            ReadingQuery::Count => "SELECT COUNT(*) FROM health_readings WHERE patient_id = ?1",
            ReadingQuery::CountByType => {
                "SELECT COUNT(*) FROM health_readings WHERE patient_id = ?1 AND parameter_type = ?2"
            }
        }
    }
}

const INSERT_READING: &str = "INSERT INTO health_readings
    (patient_id, parameter_type, value, unit, recorded_at, notes, recorded_by, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const UPSERT_THRESHOLD: &str = "INSERT INTO health_thresholds
    (patient_id, parameter_type, min_value, max_value, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (patient_id, parameter_type) DO UPDATE SET
        min_value = excluded.min_value,
        max_value = excluded.max_value,
        updated_at = excluded.updated_at";

const SELECT_THRESHOLD: &str = "SELECT id, patient_id, parameter_type, min_value, max_value, updated_at
    FROM health_thresholds WHERE patient_id = ?1 AND parameter_type = ?2";

const SELECT_THRESHOLDS: &str = "SELECT id, patient_id, parameter_type, min_value, max_value, updated_at
    FROM health_thresholds WHERE patient_id = ?1 ORDER BY parameter_type ASC";

fn map_reading(row: &Row<'_>) -> rusqlite::Result<ReadingRecord> {
    Ok(ReadingRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        parameter_type: row.get(2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        recorded_at: row.get(5)?,
        notes: row.get(6)?,
        recorded_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn map_threshold(row: &Row<'_>) -> rusqlite::Result<ThresholdRecord> {
    Ok(ThresholdRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        parameter_type: row.get(2)?,
        min_value: row.get(3)?,
        max_value: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Database storage operations for health readings and thresholds
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a reading and return the stored row
    pub fn insert_reading(conn: &Connection, reading: &NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        debug!(
            "Storing {} reading for patient {}",
            reading.parameter_type, reading.patient_id
        );

        let created_at = format_timestamp(&Utc::now());
        let mut stmt = conn.prepare_cached(INSERT_READING)?;
        stmt.execute(params![
            reading.patient_id,
            &reading.parameter_type,
            &reading.value,
            &reading.unit,
            &reading.recorded_at,
            &reading.notes,
            reading.recorded_by,
            &created_at,
        ])?;

        Ok(ReadingRecord {
            id: conn.last_insert_rowid(),
            patient_id: reading.patient_id,
            parameter_type: reading.parameter_type.clone(),
            value: reading.value.clone(),
            unit: reading.unit.clone(),
            recorded_at: reading.recorded_at.clone(),
            notes: reading.notes.clone(),
            recorded_by: reading.recorded_by,
            created_at,
        })
    }

    /// Readings recorded on/after `since`, oldest first
    pub fn readings_since(
        conn: &Connection,
        patient_id: i64,
        parameter_type: Option<&str>,
        since: &str,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let rows = match parameter_type {
            Some(parameter_type) => {
                let mut stmt = conn.prepare_cached(ReadingQuery::SinceByType.sql())?;
                let rows = stmt.query_map(params![patient_id, parameter_type, since], map_reading)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare_cached(ReadingQuery::Since.sql())?;
                let rows = stmt.query_map(params![patient_id, since], map_reading)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        debug!("Fetched {} readings for patient {} since {}", rows.len(), patient_id, since);
        Ok(rows)
    }

    /// The most recent reading of each parameter type
    pub fn latest_per_type(conn: &Connection, patient_id: i64) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let mut stmt = conn.prepare_cached(ReadingQuery::LatestPerType.sql())?;
        let rows = stmt.query_map(params![patient_id], map_reading)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// A page of readings, newest first, with the total count
    pub fn readings_page(
        conn: &Connection,
        patient_id: i64,
        parameter_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<ReadingRecord>, usize), RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let (page, total): (Vec<ReadingRecord>, i64) = match parameter_type {
            Some(parameter_type) => {
                let mut stmt = conn.prepare_cached(ReadingQuery::PageByType.sql())?;
                let page = stmt
                    .query_map(params![patient_id, parameter_type, limit, offset], map_reading)?
                    .collect::<Result<Vec<_>, _>>()?;
                let total = conn.query_row(
                    ReadingQuery::CountByType.sql(),
                    params![patient_id, parameter_type],
                    |row| row.get(0),
                )?;
                (page, total)
            }
            None => {
                let mut stmt = conn.prepare_cached(ReadingQuery::Page.sql())?;
                let page = stmt
                    .query_map(params![patient_id, limit, offset], map_reading)?
                    .collect::<Result<Vec<_>, _>>()?;
                let total = conn.query_row(ReadingQuery::Count.sql(), params![patient_id], |row| row.get(0))?;
                (page, total)
            }
        };

        Ok((page, usize::try_from(total).unwrap_or(0)))
    }

    /// Create or replace the threshold for (patient, parameter type)
    pub fn upsert_threshold(conn: &Connection, threshold: &NewThresholdRecord) -> Result<ThresholdRecord, RepositoryError> {
        debug!(
            "Upserting {} threshold for patient {}",
            threshold.parameter_type, threshold.patient_id
        );

        let updated_at = format_timestamp(&Utc::now());
        let mut stmt = conn.prepare_cached(UPSERT_THRESHOLD)?;
        stmt.execute(params![
            threshold.patient_id,
            &threshold.parameter_type,
            threshold.min_value,
            threshold.max_value,
            &updated_at,
        ])?;

        conn.query_row(
            SELECT_THRESHOLD,
            params![threshold.patient_id, &threshold.parameter_type],
            map_threshold,
        )
        .optional()?
        .ok_or_else(|| {
            RepositoryError::NotFound(format!(
                "threshold {} for patient {}",
                threshold.parameter_type, threshold.patient_id
            ))
        })
    }

    /// All thresholds of a patient
    pub fn thresholds(conn: &Connection, patient_id: i64) -> Result<Vec<ThresholdRecord>, RepositoryError> {
        let mut stmt = conn.prepare_cached(SELECT_THRESHOLDS)?;
        let rows = stmt.query_map(params![patient_id], map_threshold)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

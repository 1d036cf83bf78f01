use chrono::{DateTime, Utc};
use clinic_records_data::models::{
    format_timestamp, NewReadingRecord, NewThresholdRecord, ReadingRecord, ThresholdRecord,
};

use crate::entities::health_metric::{ParameterType, Reading, Threshold};

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Parse a stored RFC 3339 timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp '{}': {}", value, e))
}

/// Convert from data model to domain entity for a reading
///
/// Fails when the stored row carries an unknown type or a bad timestamp.
pub fn convert_to_domain_reading(record: ReadingRecord) -> Result<Reading, String> {
    Ok(Reading {
        id: record.id,
        patient_id: record.patient_id,
        parameter_type: record.parameter_type.parse::<ParameterType>()?,
        value: record.value,
        unit: record.unit,
        recorded_at: parse_timestamp(&record.recorded_at)?,
        notes: record.notes,
        recorded_by: record.recorded_by,
        created_at: parse_timestamp(&record.created_at)?,
    })
}

/// Convert validated reading fields to a data model for insertion
pub fn convert_to_data_new_reading(
    patient_id: i64,
    parameter_type: ParameterType,
    value: String,
    unit: Option<String>,
    recorded_at: &DateTime<Utc>,
    notes: Option<String>,
    recorded_by: i64,
) -> NewReadingRecord {
    NewReadingRecord {
        patient_id,
        parameter_type: parameter_type.as_str().to_string(),
        value,
        unit,
        recorded_at: format_timestamp(recorded_at),
        notes,
        recorded_by: Some(recorded_by),
    }
}

/// Convert from data model to domain entity for a threshold
pub fn convert_to_domain_threshold(record: ThresholdRecord) -> Result<Threshold, String> {
    Ok(Threshold {
        patient_id: record.patient_id,
        parameter_type: record.parameter_type.parse::<ParameterType>()?,
        min_value: record.min_value,
        max_value: record.max_value,
        updated_at: parse_timestamp(&record.updated_at)?,
    })
}

/// Convert a threshold band to a data model for upsert
pub fn convert_to_data_threshold(
    patient_id: i64,
    parameter_type: ParameterType,
    min_value: f64,
    max_value: f64,
) -> NewThresholdRecord {
    NewThresholdRecord {
        patient_id,
        parameter_type: parameter_type.as_str().to_string(),
        min_value,
        max_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(parameter_type: &str, recorded_at: &str) -> ReadingRecord {
        ReadingRecord {
            id: 7,
            patient_id: 3,
            parameter_type: parameter_type.to_string(),
            value: "120/80".to_string(),
            unit: Some("mmHg".to_string()),
            recorded_at: recorded_at.to_string(),
            notes: None,
            recorded_by: Some(3),
            created_at: "2024-05-01T08:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_convert_to_domain_reading() {
        let reading = convert_to_domain_reading(record("blood_pressure", "2024-05-01T07:30:00.000Z")).unwrap();
        assert_eq!(reading.parameter_type, ParameterType::BloodPressure);
        assert_eq!(reading.recorded_at, Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap());
        assert_eq!(reading.id, 7);
    }

    #[test]
    fn test_convert_rejects_bad_rows() {
        assert!(convert_to_domain_reading(record("cholesterol", "2024-05-01T07:30:00.000Z")).is_err());
        assert!(convert_to_domain_reading(record("heart_rate", "yesterday")).is_err());
    }

    #[test]
    fn test_convert_to_data_new_reading_formats_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap();
        let record = convert_to_data_new_reading(
            3, ParameterType::HeartRate, "72".to_string(), None, &at, None, 9,
        );
        assert_eq!(record.parameter_type, "heart_rate");
        assert_eq!(record.recorded_at, "2024-05-01T07:30:00.000Z");
        assert_eq!(record.recorded_by, Some(9));
    }
}

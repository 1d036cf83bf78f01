use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Format a timestamp the way it is stored.
///
/// Fixed-width UTC with millisecond precision, so string order is time order.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Storage model for a health parameter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Row identifier, increasing with insertion order
    pub id: i64,

    /// Patient the reading belongs to
    pub patient_id: i64,

    /// Parameter type name (e.g. "heart_rate")
    pub parameter_type: String,

    /// Raw value as recorded, e.g. "72" or "120/80"
    pub value: String,

    /// Optional unit of measurement
    pub unit: Option<String>,

    /// When the reading was taken (RFC 3339, UTC)
    pub recorded_at: String,

    /// Optional notes about the reading
    pub notes: Option<String>,

    /// User who recorded the reading
    pub recorded_by: Option<i64>,

    /// When the row was written (RFC 3339, UTC)
    pub created_at: String,
}

/// Input data for inserting a new reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReadingRecord {
    pub patient_id: i64,
    pub parameter_type: String,
    pub value: String,
    pub unit: Option<String>,
    pub recorded_at: String,
    pub notes: Option<String>,
    pub recorded_by: Option<i64>,
}

/// Storage model for a patient-specific threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub id: i64,
    pub patient_id: i64,
    pub parameter_type: String,
    pub min_value: f64,
    pub max_value: f64,
    pub updated_at: String,
}

/// Input data for creating or replacing a threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThresholdRecord {
    pub patient_id: i64,
    pub parameter_type: String,
    pub min_value: f64,
    pub max_value: f64,
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Health parameter a reading measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Stored as "systolic/diastolic"
    BloodPressure,
    HeartRate,
    BloodSugar,
    Temperature,
    Weight,
}

impl ParameterType {
    /// Every parameter type, in declaration order
    pub const ALL: [ParameterType; 5] = [
        ParameterType::BloodPressure,
        ParameterType::HeartRate,
        ParameterType::BloodSugar,
        ParameterType::Temperature,
        ParameterType::Weight,
    ];

    /// Name used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::BloodPressure => "blood_pressure",
            ParameterType::HeartRate => "heart_rate",
            ParameterType::BloodSugar => "blood_sugar",
            ParameterType::Temperature => "temperature",
            ParameterType::Weight => "weight",
        }
    }

    /// Unit assumed when a reading is recorded without one
    pub fn default_unit(&self) -> &'static str {
        match self {
            ParameterType::BloodPressure => "mmHg",
            ParameterType::HeartRate => "bpm",
            ParameterType::BloodSugar => "mg/dL",
            ParameterType::Temperature => "°C",
            ParameterType::Weight => "kg",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown parameter type: {}", s))
    }
}

/// Lookback window for statistics and trends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Earliest `recorded_at` included in the window ending at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Day => now - Duration::days(1),
            Period::Week => now - Duration::days(7),
            Period::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now - Duration::days(30)),
            Period::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now - Duration::days(365)),
        }
    }

    /// strftime pattern of the trend bucket key
    ///
    /// Keys sort lexicographically in time order.
    pub fn bucket_format(&self) -> &'static str {
        match self {
            Period::Day => "%Y-%m-%d %H:00",
            Period::Week | Period::Month => "%Y-%m-%d",
            Period::Year => "%Y-%m",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

/// Why a raw reading value could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricValueError {
    #[error("blood pressure must be written as systolic/diastolic, got '{0}'")]
    MissingSeparator(String),

    #[error("'{0}' is not a valid number")]
    NotANumber(String),
}

/// Parsed reading value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    BloodPressure { systolic: u16, diastolic: u16 },
}

impl MetricValue {
    /// Parse a stored value according to its parameter type
    pub fn parse(parameter_type: ParameterType, raw: &str) -> Result<Self, MetricValueError> {
        let raw = raw.trim();

        if parameter_type == ParameterType::BloodPressure {
            let (systolic, diastolic) = raw
                .split_once('/')
                .ok_or_else(|| MetricValueError::MissingSeparator(raw.to_string()))?;
            let systolic = systolic
                .trim()
                .parse::<u16>()
                .map_err(|_| MetricValueError::NotANumber(systolic.trim().to_string()))?;
            let diastolic = diastolic
                .trim()
                .parse::<u16>()
                .map_err(|_| MetricValueError::NotANumber(diastolic.trim().to_string()))?;
            return Ok(MetricValue::BloodPressure { systolic, diastolic });
        }

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(MetricValue::Scalar(value)),
            _ => Err(MetricValueError::NotANumber(raw.to_string())),
        }
    }

    /// Number used for aggregation and band checks; systolic for blood pressure
    pub fn primary(&self) -> f64 {
        match self {
            MetricValue::Scalar(value) => *value,
            MetricValue::BloodPressure { systolic, .. } => f64::from(*systolic),
        }
    }
}

/// Domain model for a health parameter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Reading {
    pub id: i64,
    pub patient_id: i64,
    pub parameter_type: ParameterType,
    /// Raw value, e.g. "72" or "120/80"
    pub value: String,
    pub unit: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    /// User who recorded the reading (the patient or their doctor)
    pub recorded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Reading {
    /// Parsed value of this reading
    pub fn metric_value(&self) -> Result<MetricValue, MetricValueError> {
        MetricValue::parse(self.parameter_type, &self.value)
    }
}

/// Request payload for recording a new reading
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateReadingRequest {
    /// Target patient; required for doctors, ignored for patients
    pub patient_id: Option<i64>,

    pub parameter_type: ParameterType,

    /// Number, or "systolic/diastolic" for blood pressure
    #[validate(length(min = 1, max = 32, message = "Value must be between 1 and 32 characters"))]
    pub value: String,

    /// Defaults to the parameter type's usual unit
    #[validate(length(max = 20, message = "Unit cannot exceed 20 characters"))]
    pub unit: Option<String>,

    /// When the reading was taken. Defaults to current time if not provided.
    pub recorded_at: Option<DateTime<Utc>>,

    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

/// Patient-specific normal range for a parameter type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Threshold {
    pub patient_id: i64,
    pub parameter_type: ParameterType,
    pub min_value: f64,
    pub max_value: f64,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating or replacing a threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpsertThresholdRequest {
    pub parameter_type: ParameterType,
    pub min_value: f64,
    pub max_value: f64,
}

/// Summary of one parameter type over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ParameterStatistics {
    pub parameter_type: ParameterType,
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics for every parameter type present in the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct StatisticsReport {
    pub patient_id: i64,
    pub period: Period,
    /// One row per parameter type, ordered by type name
    pub statistics: Vec<ParameterStatistics>,
}

/// Aggregate of the readings in one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TrendPoint {
    /// Hour, day or month key depending on the period
    pub time_bucket: String,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// Overall direction of a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TrendSummary {
    pub direction: TrendDirection,
    /// Change from first to last bucket average, in percent, 2 decimals
    pub change_percentage: f64,
    pub message: String,
}

/// Trend series plus its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TrendAnalysis {
    pub patient_id: i64,
    pub parameter_type: ParameterType,
    pub period: Period,
    pub data: Vec<TrendPoint>,
    pub trend: TrendSummary,
}

/// Classification of a value against a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum AlertLevel {
    High,
    Low,
    Normal,
}

/// Where a band came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BandSource {
    /// The patient's own threshold
    Threshold,
    /// The built-in normal range
    Default,
}

/// Normal range applied to a reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub source: BandSource,
}

/// Latest reading of a type that falls outside its band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct HealthAlert {
    pub reading: Reading,
    pub status: AlertLevel,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AlertsReport {
    pub patient_id: i64,
    pub alerts: Vec<HealthAlert>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parameter_type_round_trips_through_str() {
        for parameter_type in ParameterType::ALL {
            assert_eq!(parameter_type.as_str().parse::<ParameterType>().unwrap(), parameter_type);
        }
        assert!("cholesterol".parse::<ParameterType>().is_err());
    }

    #[test]
    fn test_parameter_type_serializes_snake_case() {
        let json = serde_json::to_string(&ParameterType::BloodSugar).unwrap();
        assert_eq!(json, "\"blood_sugar\"");
    }

    #[test]
    fn test_period_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        assert_eq!(Period::Day.window_start(now), Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap());
        assert_eq!(Period::Week.window_start(now), Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap());
        // Calendar month, clamped to the last day of February
        assert_eq!(Period::Month.window_start(now), Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(Period::Year.window_start(now), Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_period_defaults_to_month() {
        assert_eq!(Period::default(), Period::Month);
    }

    #[test]
    fn test_parse_blood_pressure() {
        let value = MetricValue::parse(ParameterType::BloodPressure, "150/95").unwrap();
        assert_eq!(value, MetricValue::BloodPressure { systolic: 150, diastolic: 95 });
        assert_eq!(value.primary(), 150.0);

        let spaced = MetricValue::parse(ParameterType::BloodPressure, " 120 / 80 ").unwrap();
        assert_eq!(spaced.primary(), 120.0);
    }

    #[test]
    fn test_parse_blood_pressure_malformed() {
        assert_eq!(
            MetricValue::parse(ParameterType::BloodPressure, "120"),
            Err(MetricValueError::MissingSeparator("120".to_string()))
        );
        assert!(matches!(
            MetricValue::parse(ParameterType::BloodPressure, "abc/80"),
            Err(MetricValueError::NotANumber(_))
        ));
        assert!(MetricValue::parse(ParameterType::BloodPressure, "120.5/80").is_err());
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(MetricValue::parse(ParameterType::Temperature, "36.6").unwrap().primary(), 36.6);
        assert!(MetricValue::parse(ParameterType::HeartRate, "fast").is_err());
        assert!(MetricValue::parse(ParameterType::Weight, "NaN").is_err());
        assert!(MetricValue::parse(ParameterType::Weight, "inf").is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateReadingRequest {
            patient_id: None,
            parameter_type: ParameterType::HeartRate,
            value: "72".to_string(),
            unit: None,
            recorded_at: None,
            notes: Some("x".repeat(1001)),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("notes"));

        let empty_value = CreateReadingRequest {
            value: String::new(),
            notes: None,
            ..request
        };
        assert!(empty_value.validate().is_err());
    }
}

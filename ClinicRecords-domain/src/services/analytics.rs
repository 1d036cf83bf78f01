use std::collections::BTreeMap;

use tracing::warn;

use crate::entities::health_metric::{
    AlertLevel, Band, BandSource, HealthAlert, ParameterStatistics, ParameterType, Period, Reading,
    Threshold, TrendDirection, TrendPoint, TrendSummary,
};

/// Percentage change beyond which a trend is no longer stable
pub const TREND_CHANGE_LIMIT: f64 = 5.0;

const MESSAGE_INSUFFICIENT: &str = "Not enough data to determine a trend. Keep recording readings regularly.";
const MESSAGE_INCREASING: &str = "Values are rising. Consider discussing this trend with your doctor.";
const MESSAGE_DECREASING: &str = "Values are falling. Consider discussing this trend with your doctor.";
const MESSAGE_STABLE: &str = "Values are stable. Keep up your current routine.";

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running count/sum/min/max of a group of values
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self { count: 0, sum: 0.0, min: f64::INFINITY, max: f64::NEG_INFINITY }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Numeric value of a reading, or None (with a warning) when it cannot be parsed
fn numeric_value(reading: &Reading) -> Option<f64> {
    match reading.metric_value() {
        Ok(value) => Some(value.primary()),
        Err(e) => {
            warn!(
                reading_id = reading.id,
                parameter_type = %reading.parameter_type,
                "Skipping reading with unparsable value: {}", e
            );
            None
        }
    }
}

/// Count, average, min and max per parameter type, ordered by type name
pub fn compute_statistics(readings: &[Reading]) -> Vec<ParameterStatistics> {
    let mut groups: BTreeMap<&'static str, (ParameterType, Accumulator)> = BTreeMap::new();

    for reading in readings {
        let Some(value) = numeric_value(reading) else { continue };
        groups
            .entry(reading.parameter_type.as_str())
            .or_insert_with(|| (reading.parameter_type, Accumulator::new()))
            .1
            .push(value);
    }

    groups
        .into_values()
        .map(|(parameter_type, acc)| ParameterStatistics {
            parameter_type,
            count: acc.count,
            average: round2(acc.average()),
            min: acc.min,
            max: acc.max,
        })
        .collect()
}

/// Group readings into UTC time buckets for the period, ascending by key
pub fn bucket_readings(readings: &[Reading], period: Period) -> Vec<TrendPoint> {
    let format = period.bucket_format();
    let mut buckets: BTreeMap<String, Accumulator> = BTreeMap::new();

    for reading in readings {
        let Some(value) = numeric_value(reading) else { continue };
        buckets
            .entry(reading.recorded_at.format(format).to_string())
            .or_insert_with(Accumulator::new)
            .push(value);
    }

    buckets
        .into_iter()
        .map(|(time_bucket, acc)| TrendPoint {
            time_bucket,
            average: round2(acc.average()),
            min: acc.min,
            max: acc.max,
            count: acc.count,
        })
        .collect()
}

fn summary(direction: TrendDirection, change_percentage: f64) -> TrendSummary {
    let message = match direction {
        TrendDirection::Increasing => MESSAGE_INCREASING,
        TrendDirection::Decreasing => MESSAGE_DECREASING,
        TrendDirection::Stable => MESSAGE_STABLE,
        TrendDirection::InsufficientData => MESSAGE_INSUFFICIENT,
    };
    TrendSummary { direction, change_percentage, message: message.to_string() }
}

/// Classify a bucket series by the change from its first to its last average
pub fn classify_trend(points: &[TrendPoint]) -> TrendSummary {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return summary(TrendDirection::InsufficientData, 0.0);
    };
    if points.len() < 2 || first.average == 0.0 {
        return summary(TrendDirection::InsufficientData, 0.0);
    }

    let change = round2((last.average - first.average) / first.average * 100.0);
    if !change.is_finite() {
        return summary(TrendDirection::InsufficientData, 0.0);
    }

    let direction = if change > TREND_CHANGE_LIMIT {
        TrendDirection::Increasing
    } else if change < -TREND_CHANGE_LIMIT {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    summary(direction, change)
}

/// Built-in normal range for a parameter type, if it has one
pub fn default_band(parameter_type: ParameterType) -> Option<Band> {
    let (min, max) = match parameter_type {
        ParameterType::BloodPressure => (90.0, 140.0),
        ParameterType::HeartRate => (60.0, 100.0),
        ParameterType::BloodSugar => (70.0, 140.0),
        ParameterType::Temperature | ParameterType::Weight => return None,
    };
    Some(Band { min, max, source: BandSource::Default })
}

/// The patient's threshold for the type, falling back to the default band
pub fn resolve_band(parameter_type: ParameterType, thresholds: &[Threshold]) -> Option<Band> {
    thresholds
        .iter()
        .find(|t| t.parameter_type == parameter_type)
        .map(|t| Band { min: t.min_value, max: t.max_value, source: BandSource::Threshold })
        .or_else(|| default_band(parameter_type))
}

/// Strictly above the band is High, strictly below is Low
pub fn classify_value(value: f64, band: &Band) -> AlertLevel {
    if value > band.max {
        AlertLevel::High
    } else if value < band.min {
        AlertLevel::Low
    } else {
        AlertLevel::Normal
    }
}

/// Alerts for the latest readings that fall outside their band
pub fn evaluate_alerts(latest: Vec<Reading>, thresholds: &[Threshold]) -> Vec<HealthAlert> {
    latest
        .into_iter()
        .filter_map(|reading| {
            let band = resolve_band(reading.parameter_type, thresholds)?;
            let value = numeric_value(&reading)?;
            match classify_value(value, &band) {
                AlertLevel::Normal => None,
                status => Some(HealthAlert { reading, status, band }),
            }
        })
        .collect()
}

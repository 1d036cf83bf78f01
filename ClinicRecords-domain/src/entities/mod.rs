// Domain entities and value objects
pub mod health_metric;
pub mod conversions;

// Re-export common types for easier imports
pub use health_metric::{
    AlertLevel, AlertsReport, Band, BandSource, CreateReadingRequest, HealthAlert, MetricValue,
    MetricValueError, ParameterStatistics, ParameterType, Period, Reading, StatisticsReport,
    Threshold, TrendAnalysis, TrendDirection, TrendPoint, TrendSummary, UpsertThresholdRequest,
};

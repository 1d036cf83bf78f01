// Storage models
pub mod health_metric;

pub use health_metric::{
    format_timestamp, NewReadingRecord, NewThresholdRecord, ReadingRecord, ThresholdRecord,
};

pub mod health;
pub mod health_metrics;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use health::health_check;
pub use health_metrics::{
    get_alerts, get_statistics, get_trends, list_readings, list_thresholds, record_reading,
    upsert_threshold,
};

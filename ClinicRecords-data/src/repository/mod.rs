// Repository module structure
pub mod errors;
mod health_metrics;
mod storage;

#[cfg(any(test, feature = "mock"))]
mod in_memory;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use health_metrics::{HealthMetricsRepository, HealthMetricsRepositoryTrait};
pub use storage::ReadingQuery;

// In-memory double for tests, also exported when the mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use in_memory::InMemoryHealthMetricsRepository;

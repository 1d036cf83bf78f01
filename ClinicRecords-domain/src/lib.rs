// ClinicRecords Domain
// This crate contains the business logic for the health metrics service

// Services that implement business logic
pub mod services;

// Authentication and caller identity
pub mod auth;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data layer for convenience
pub use clinic_records_data::database;

// Testing utilities - only available in tests or with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;

// ClinicRecords Data
// This crate handles data access for health metric readings and thresholds

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;

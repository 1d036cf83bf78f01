// ClinicRecords-api lib.rs
//
// HTTP surface of the health metrics service: routes, handlers, configuration
// and the OpenAPI document.

pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;

pub use api::{create_app, create_application, AppState};
pub use config::AppConfig;

// Public entities for the ClinicRecords API
// Response envelopes shared by the handlers; payload types come from the domain crate

// Common entities for error handling and pagination
pub mod common;

pub use common::{ErrorResponse, PaginatedResponse, ReadingsPage};

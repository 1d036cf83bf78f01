use thiserror::Error;
use tracing::debug;

use crate::auth::logging::log_access_denied;
use crate::auth::{Role, UserInfo};

/// Why a caller may not act on a patient's records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// A non-patient caller did not say which patient they mean
    #[error("patient_id is required")]
    MissingPatientIdentifier,

    #[error("{0}")]
    Forbidden(String),
}

/// Patient whose records a read operation may see
///
/// Patients always see themselves, whatever id they pass. Every other role
/// must name the patient.
pub fn resolve_patient_scope(user: &UserInfo, requested: Option<i64>) -> Result<i64, AccessError> {
    if user.is_patient() {
        if let Some(other) = requested.filter(|id| *id != user.user_id) {
            debug!("Patient {} asked for patient {}, scoping to self", user.user_id, other);
        }
        return Ok(user.user_id);
    }

    requested.ok_or(AccessError::MissingPatientIdentifier)
}

/// Patient a new reading is recorded for
///
/// Patients record for themselves and doctors for a named patient.
pub fn resolve_write_target(user: &UserInfo, requested: Option<i64>) -> Result<i64, AccessError> {
    match user.role {
        Role::Patient => Ok(user.user_id),
        Role::Doctor => requested.ok_or(AccessError::MissingPatientIdentifier),
        role => {
            let reason = format!("Role '{}' may not record readings", role);
            log_access_denied(user, "record_reading", &reason);
            Err(AccessError::Forbidden(reason))
        }
    }
}

/// Fail unless the caller holds one of the allowed roles
pub fn ensure_role(user: &UserInfo, allowed: &[Role], resource: &str) -> Result<(), AccessError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    let reason = format!("Role '{}' may not access {}", user.role, resource);
    log_access_denied(user, resource, &reason);
    Err(AccessError::Forbidden(reason))
}

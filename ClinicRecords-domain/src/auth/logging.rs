use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{Role, UserInfo};

/// Security-relevant things that happen to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthEventType {
    /// Bearer token checked by the middleware
    TokenValidation,
    /// Authenticated caller refused by a scope or role rule
    AccessDenied,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
            AuthEventType::AccessDenied => write!(f, "ACCESS_DENIED"),
        }
    }
}

/// One audit record. The caller is unknown until a token has been accepted.
#[derive(Debug, Clone, Serialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    pub user_id: Option<i64>,
    pub role: Option<Role>,
    pub success: bool,
    /// Request path or operation name
    pub resource: Option<String>,
    pub details: Option<String>,
    pub duration_ms: Option<u64>,
}

impl AuthEvent {
    pub fn success(event_type: AuthEventType, user: &UserInfo) -> Self {
        Self {
            event_type,
            user_id: Some(user.user_id),
            role: Some(user.role),
            success: true,
            resource: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn failure(event_type: AuthEventType, user: Option<&UserInfo>) -> Self {
        Self {
            event_type,
            user_id: user.map(|u| u.user_id),
            role: user.map(|u| u.role),
            success: false,
            resource: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Time spent since `started`
    pub fn timed(mut self, started: Instant) -> Self {
        self.duration_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// Emit an audit record; failures go out at warn level
pub fn log_auth_event(event: AuthEvent) {
    let role = event.role.map(|r| r.as_str());
    let resource = event.resource.as_deref().unwrap_or("");
    let details = event.details.as_deref().unwrap_or("");

    if event.success {
        info!(
            event = %event.event_type,
            user_id = event.user_id,
            role,
            duration_ms = event.duration_ms,
            "auth ok {}",
            resource
        );
    } else {
        warn!(
            event = %event.event_type,
            user_id = event.user_id,
            role,
            duration_ms = event.duration_ms,
            "auth failed {} {}",
            resource,
            details
        );
    }
}

/// Record that `user` was refused `resource`
pub fn log_access_denied(user: &UserInfo, resource: &str, reason: &str) {
    let event = AuthEvent::failure(AuthEventType::AccessDenied, Some(user))
        .with_resource(resource)
        .with_details(reason);

    log_auth_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_event_carries_caller() {
        let user = UserInfo::new(12, Role::Doctor);
        let event = AuthEvent::success(AuthEventType::TokenValidation, &user)
            .with_resource("/api/v1/health-metrics")
            .timed(Instant::now());

        assert!(event.success);
        assert_eq!(event.user_id, Some(12));
        assert_eq!(event.role, Some(Role::Doctor));
        assert_eq!(event.resource.as_deref(), Some("/api/v1/health-metrics"));
        assert!(event.duration_ms.is_some());
    }

    #[test]
    fn test_failure_before_authentication_is_anonymous() {
        let event = AuthEvent::failure(AuthEventType::TokenValidation, None).with_details("expired");

        assert!(!event.success);
        assert_eq!(event.user_id, None);
        assert_eq!(event.role, None);
        assert_eq!(event.details.as_deref(), Some("expired"));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::TokenValidation.to_string(), "TOKEN_VALIDATION");
        assert_eq!(AuthEventType::AccessDenied.to_string(), "ACCESS_DENIED");
    }
}

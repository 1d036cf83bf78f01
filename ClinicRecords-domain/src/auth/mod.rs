//! Authentication module for ClinicRecords API
//!
//! Verifies bearer tokens and exposes the caller identity to handlers

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::auth::token::TokenValidator;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

// JWT verification
pub mod token;

// Patient scoping and role checks
pub mod authorize;

// Structured auth event logging
pub mod logging;

/// Role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
    Biologist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
            Role::Biologist => "biologist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            "biologist" => Ok(Role::Biologist),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (numeric user ID as a string)
    pub sub: String,
    /// Caller role
    pub role: Role,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// User information extracted from authenticated requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserInfo {
    pub user_id: i64,
    pub role: Role,
}

impl UserInfo {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }
}

fn unauthorized() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Body::empty())
        .unwrap_or_default()
}

/// Authentication middleware for protected routes
///
/// Inserts `UserInfo` and `Claims` into the request extensions, or answers 401.
pub async fn auth_middleware(
    State(validator): State<Arc<TokenValidator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = Instant::now();

    let failure = |details: String| {
        let event = AuthEvent::failure(AuthEventType::TokenValidation, None)
            .with_details(details)
            .with_resource(request_path.clone())
            .timed(start_time);
        log_auth_event(event);
        unauthorized()
    };

    let token = match req.headers().get(header::AUTHORIZATION) {
        None => {
            debug!("Missing Authorization header");
            return failure("Missing Authorization header".to_string());
        }
        Some(value) => match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) => token.trim().to_string(),
            None => {
                warn!("Authorization header does not contain Bearer token");
                return failure("Authorization header does not contain Bearer token".to_string());
            }
        },
    };

    match validator.authenticate(&token) {
        Ok((user_info, claims)) => {
            debug!("Token validated for user {} ({})", user_info.user_id, user_info.role);

            let event = AuthEvent::success(AuthEventType::TokenValidation, &user_info)
                .with_resource(request_path.clone())
                .timed(start_time);
            log_auth_event(event);

            req.extensions_mut().insert(user_info);
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!("Token rejected: {}", e);
            failure(e.to_string())
        }
    }
}

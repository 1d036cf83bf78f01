use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;
use tracing::debug;

use crate::auth::{Claims, UserInfo};

/// Security errors for token verification
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Subject is not a numeric user id
    #[error("Invalid token subject: {0}")]
    InvalidSubject(String),
}

/// Verifies HS256 bearer tokens against a shared secret
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator").finish_non_exhaustive()
    }
}

impl TokenValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a JWT token and return the decoded claims
    pub fn validate(&self, token: &str) -> Result<Claims, SecurityError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    SecurityError::TokenValidation("Invalid signature".to_string())
                }
                _ => SecurityError::TokenValidation(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate a token and derive the caller identity from it
    pub fn authenticate(&self, token: &str) -> Result<(UserInfo, Claims), SecurityError> {
        let claims = self.validate(token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| SecurityError::InvalidSubject(claims.sub.clone()))?;

        debug!("Authenticated user {} with role {}", user_id, claims.role);
        Ok((UserInfo::new(user_id, claims.role), claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_testing_only";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(sub: &str, exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims { sub: sub.to_string(), role: Role::Patient, iat: now, exp: now + exp_offset }
    }

    #[test]
    fn test_authenticate_valid_token() {
        let validator = TokenValidator::new(SECRET);
        let (user, claims) = validator.authenticate(&sign(&claims("17", 3600), SECRET)).unwrap();
        assert_eq!(user, UserInfo::new(17, Role::Patient));
        assert_eq!(claims.sub, "17");
    }

    #[test]
    fn test_token_expiration() {
        let validator = TokenValidator::new(SECRET);
        // Well past the default leeway
        let result = validator.validate(&sign(&claims("17", -3600), SECRET));
        match result {
            Err(SecurityError::TokenExpired) => {}
            err => panic!("Expected TokenExpired error but got: {:?}", err),
        }
    }

    #[test]
    fn test_wrong_secret() {
        let validator = TokenValidator::new(SECRET);
        let result = validator.validate(&sign(&claims("17", 3600), "another_secret"));
        assert!(matches!(result, Err(SecurityError::TokenValidation(_))));
    }

    #[test]
    fn test_invalid_token() {
        let validator = TokenValidator::new(SECRET);
        match validator.validate("invalid.token.format") {
            Err(SecurityError::InvalidToken) | Err(SecurityError::TokenValidation(_)) => {}
            other => panic!("Expected InvalidToken or TokenValidation error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_subject() {
        let validator = TokenValidator::new(SECRET);
        let result = validator.authenticate(&sign(&claims("alice", 3600), SECRET));
        assert!(matches!(result, Err(SecurityError::InvalidSubject(_))));
    }
}

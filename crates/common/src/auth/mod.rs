//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT validation for parent and kid sessions issued by the identity service
//! - Caller context extraction with role/admin checks
//! - Device API key generation and hashing

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Who a session token speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Kid,
}

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Parent account id or kid profile id, depending on `role`
    pub subject_id: i32,

    pub role: Role,

    /// Admin flag carried by the token
    pub is_admin: bool,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// The calling parent's account id
    pub fn require_parent(&self) -> Result<i32> {
        match self.role {
            Role::Parent => Ok(self.subject_id),
            Role::Kid => Err(AppError::forbidden("Parent access required")),
        }
    }

    /// The calling admin's account id
    pub fn require_admin(&self) -> Result<i32> {
        let parent_id = self.require_parent()?;
        if self.is_admin {
            Ok(parent_id)
        } else {
            Err(AppError::forbidden("Admin privileges required"))
        }
    }

    /// Kid sessions may only act on their own profile.
    /// Returns the parent id to check ownership against, if the caller is a parent.
    pub fn require_kid_or_parent(&self, kid_profile_id: i32) -> Result<Option<i32>> {
        match self.role {
            Role::Parent => Ok(Some(self.subject_id)),
            Role::Kid if self.subject_id == kid_profile_id => Ok(None),
            Role::Kid => Err(AppError::forbidden(format!(
                "Kid session cannot act for profile {}",
                kid_profile_id
            ))),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (parent id or kid profile id)
    pub sub: String,

    pub role: Role,

    #[serde(default)]
    pub is_admin: bool,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, subject_id: i32, role: Role, is_admin: bool) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: subject_id.to_string(),
            role,
            is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e)
            })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::ExpiredToken
                    }
                    _ => AppError::Unauthorized {
                        message: "Could not validate credentials".to_string(),
                    },
                }
            })
    }

    /// Validate a token and turn it into a caller context
    pub fn authenticate(&self, token: &str, request_id: String) -> Result<AuthContext> {
        let claims = self.validate_token(token)?;
        let subject_id = claims.sub.parse::<i32>().map_err(|_| AppError::Unauthorized {
            message: "Invalid subject in token".to_string(),
        })?;

        Ok(AuthContext {
            subject_id,
            role: claims.role,
            // only parent accounts can hold admin rights
            is_admin: claims.is_admin && claims.role == Role::Parent,
            request_id,
        })
    }
}

/// Hash a device API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate an API key against a stored hash
pub fn validate_api_key(api_key: &str, stored_hash: &str) -> bool {
    hash_api_key(api_key) == stored_hash
}

/// Generate a new device API key
pub fn generate_api_key() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("dk_{}", hex::encode(random_bytes))
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a Bearer token".to_string(),
        })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        jwt.authenticate(token, request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_api_key() {
        let key = "dk_test_12345";
        let hash = hash_api_key(key);
        assert!(validate_api_key(key, &hash));
        assert!(!validate_api_key("wrong_key", &hash));
    }

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with("dk_"));
        assert_eq!(key.len(), 3 + 64);
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let token = manager.generate_token(12, Role::Parent, true).unwrap();
        let ctx = manager.authenticate(&token, "req-1".into()).unwrap();

        assert_eq!(ctx.subject_id, 12);
        assert_eq!(ctx.role, Role::Parent);
        assert_eq!(ctx.require_admin().unwrap(), 12);
    }

    #[test]
    fn test_kid_token_never_admin() {
        let manager = JwtManager::new("test_secret", 3600);
        let token = manager.generate_token(4, Role::Kid, true).unwrap();
        let ctx = manager.authenticate(&token, "req-2".into()).unwrap();

        assert!(!ctx.is_admin);
        assert!(matches!(ctx.require_parent(), Err(AppError::Forbidden { .. })));
        assert_eq!(ctx.require_kid_or_parent(4).unwrap(), None);
        assert!(ctx.require_kid_or_parent(5).is_err());
    }

    #[test]
    fn test_non_admin_parent_rejected() {
        let ctx = AuthContext {
            subject_id: 3,
            role: Role::Parent,
            is_admin: false,
            request_id: "r".into(),
        };
        assert!(matches!(ctx.require_admin(), Err(AppError::Forbidden { .. })));
        assert_eq!(ctx.require_kid_or_parent(99).unwrap(), Some(3));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer.generate_token(1, Role::Parent, false).unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(AppError::Unauthorized { .. })
        ));
    }
}

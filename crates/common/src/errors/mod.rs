//! Error types for Safeview services
//!
//! Every store operation returns [`AppError`]. The gateway renders it as a
//! JSON envelope `{"error": {"code", "message", "field"?}}` whose `code` is
//! stable for clients (the parent app shows "already reviewed" on
//! `INVALID_TRANSITION`, for instance).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Kinds of record an operation can fail to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    KidProfile,
    Title,
    Episode,
    Tag,
    Policy,
    Package,
    PackageApplication,
    PackageItem,
    PackageUpdate,
    Report,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::KidProfile => "kid profile",
            Resource::Title => "title",
            Resource::Episode => "episode",
            Resource::Tag => "content tag",
            Resource::Policy => "policy",
            Resource::Package => "content package",
            Resource::PackageApplication => "package application",
            Resource::PackageItem => "package item",
            Resource::PackageUpdate => "package update",
            Resource::Report => "content report",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rejected input
    ValidationError,
    MissingField,

    // Credentials
    Unauthorized,
    InvalidApiKey,
    ExpiredToken,

    // Ownership and admin checks
    Forbidden,

    NotFound,

    // State conflicts
    Duplicate,
    InvalidTransition,

    RateLimited,

    // Store
    DatabaseError,
    ConnectionError,

    InternalError,
    SerializationError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    /// Missing or unreadable session credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid device credentials")]
    InvalidApiKey,

    #[error("Token expired")]
    ExpiredToken,

    /// The caller does not own the kid profile, or is not an admin
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    #[error("Already exists: {message}")]
    Duplicate { message: String },

    /// A state machine refused the move, e.g. reviewing a reviewed report
    #[error("Invalid transition: {message}")]
    InvalidTransition { message: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for a field-level validation failure
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden { message: message.into() }
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        AppError::InvalidTransition { message: message.into() }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidApiKey => ErrorCode::InvalidApiKey,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Duplicate { .. } => ErrorCode::Duplicate,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } | AppError::Other(_) => ErrorCode::InternalError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::ValidationError | ErrorCode::MissingField => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized | ErrorCode::InvalidApiKey | ErrorCode::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate | ErrorCode::InvalidTransition => StatusCode::CONFLICT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::ConnectionError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::InternalError | ErrorCode::SerializationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn field(&self) -> Option<String> {
        match self {
            AppError::Validation { field, .. } => field.clone(),
            AppError::MissingField { field } => Some(field.clone()),
            _ => None,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(error = %message, code = ?code, status = status.as_u16(), "Server error");
        } else {
            tracing::warn!(error = %message, code = ?code, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                field: self.field(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|k| k.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

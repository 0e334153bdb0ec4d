//! Safeview Common Library
//!
//! Shared code for the Safeview services including:
//! - Database models, schema and the transactional repository
//! - Access rules (launch checks, limits, packages, moderation)
//! - Catalog taxonomy and streaming service catalogue
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod access;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

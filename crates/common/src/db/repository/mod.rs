//! Repository pattern for database operations
//!
//! Every store operation lives here, grouped by area. Mutating operations
//! run inside a single transaction and verify that the calling parent owns
//! the kid profile (or policy) they touch.

mod catalog;
mod kids;
mod launch;
mod packages;
mod policies;
mod reports;
mod services;
mod usage;

pub use catalog::{EpisodeInput, TagInput, TitleInput};
pub use launch::{EpisodeRef, LaunchRequest};
pub use packages::{
    AppliedPackage, ApplyOutcome, PackageDetail, PackageInput, PackagePatch, PackageSummary,
    PackageTitle, PendingUpdate, UpdateAction,
};
pub use policies::{
    AllowedTitle, BlockOutcome, EpisodeState, PolicyWithTitle, SetPolicyInput, TitleStatus,
};
pub use reports::ReportInput;
pub use usage::{DeviceRegistration, UsageSummary};

use crate::config::LaunchConfig;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Resource, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, SqlErr};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
    launch: LaunchConfig,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool, launch: LaunchConfig) -> Self {
        Self { pool, launch }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    pub fn launch_config(&self) -> &LaunchConfig {
        &self.launch
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

/// Turn a unique-index violation into `Duplicate`; other errors pass through.
/// Covers writers that lose a race after their existence check.
pub(crate) fn duplicate_on_conflict(err: DbErr, message: impl FnOnce() -> String) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate { message: message() },
        _ => AppError::Database(err),
    }
}

// ============================================================================
// Ownership checks
// ============================================================================

/// Load a kid profile and check it belongs to `parent_id`
pub(crate) async fn ensure_kid_owned<C>(conn: &C, parent_id: i32, kid_profile_id: i32) -> Result<KidProfile>
where
    C: ConnectionTrait,
{
    let kid = find_kid(conn, kid_profile_id).await?;
    if kid.parent_id != parent_id {
        return Err(AppError::forbidden(format!(
            "Kid profile {} does not belong to caller",
            kid_profile_id
        )));
    }
    Ok(kid)
}

pub(crate) async fn find_kid<C>(conn: &C, kid_profile_id: i32) -> Result<KidProfile>
where
    C: ConnectionTrait,
{
    KidProfileEntity::find_by_id(kid_profile_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::KidProfile, kid_profile_id))
}

/// Load a policy and check its kid belongs to `parent_id`
pub(crate) async fn ensure_policy_owned<C>(conn: &C, parent_id: i32, policy_id: i32) -> Result<Policy>
where
    C: ConnectionTrait,
{
    let policy = PolicyEntity::find_by_id(policy_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Policy, policy_id))?;
    ensure_kid_owned(conn, parent_id, policy.kid_profile_id).await?;
    Ok(policy)
}

pub(crate) async fn find_title<C>(conn: &C, title_id: i32) -> Result<Title>
where
    C: ConnectionTrait,
{
    TitleEntity::find_by_id(title_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Title, title_id))
}

pub(crate) async fn find_tag<C>(conn: &C, tag_id: i32) -> Result<ContentTag>
where
    C: ConnectionTrait,
{
    ContentTagEntity::find_by_id(tag_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Tag, tag_id))
}

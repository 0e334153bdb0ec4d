//! Kid profiles

use super::{ensure_kid_owned, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

/// Oldest age a kid profile can have
pub const MAX_KID_AGE: i32 = 17;

impl Repository {
    // ========================================================================
    // Kid Profile Operations
    // ========================================================================

    /// Create a kid profile under a parent account
    pub async fn create_kid_profile(&self, parent_id: i32, name: &str, age: i32) -> Result<KidProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "name cannot be empty"));
        }
        if !(0..=MAX_KID_AGE).contains(&age) {
            return Err(AppError::validation(
                "age",
                format!("age must be between 0 and {}", MAX_KID_AGE),
            ));
        }

        let kid = KidProfileActiveModel {
            parent_id: Set(parent_id),
            name: Set(name.to_string()),
            age: Set(age),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        info!(parent_id, kid_profile_id = kid.id, "Kid profile created");
        Ok(kid)
    }

    /// List a parent's kid profiles, oldest first
    pub async fn list_kid_profiles(&self, parent_id: i32) -> Result<Vec<KidProfile>> {
        KidProfileEntity::find()
            .filter(KidProfileColumn::ParentId.eq(parent_id))
            .order_by_asc(KidProfileColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Fetch one of the caller's kid profiles
    pub async fn get_kid_profile(&self, parent_id: i32, kid_profile_id: i32) -> Result<KidProfile> {
        ensure_kid_owned(self.read_conn(), parent_id, kid_profile_id).await
    }
}

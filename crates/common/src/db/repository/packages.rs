//! Content package engine

use super::policies::{find_policy, insert_package_policy, policy_title_ids};
use super::{duplicate_on_conflict, ensure_kid_owned, Repository};
use crate::access::packages::{available_for_age, plan_application, update_candidates, validate_package_fields};
use crate::db::models::*;
use crate::errors::{AppError, Resource, Result};
use crate::metrics;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age_min: Option<i32>,
    #[serde(default)]
    pub age_max: Option<i32>,
    pub category: PackageCategory,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Partial package update; absent fields are left alone.
/// An age bound sent as `null` is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackagePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub age_min: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub age_max: Option<Option<i32>>,
    pub category: Option<PackageCategory>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

fn already_applied(package_id: i32, kid_profile_id: i32) -> String {
    format!("package {} is already applied to kid profile {}", package_id, kid_profile_id)
}

/// A field that appears in the body, `null` included, is `Some`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    #[serde(flatten)]
    pub package: ContentPackage,
    pub title_count: u64,
    /// Number of kids the package is applied to (admin listing only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageTitle {
    pub title_id: i32,
    pub name: String,
    pub media_type: String,
    pub poster_ref: Option<String>,
    /// Whether the kid already has a policy for the title (only when a kid is given)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_policy: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageDetail {
    #[serde(flatten)]
    pub package: ContentPackage,
    pub titles: Vec<PackageTitle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub package_id: i32,
    pub kid_profile_id: i32,
    pub created_count: usize,
    pub skipped_count: usize,
    pub excluded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedPackage {
    #[serde(flatten)]
    pub package: ContentPackage,
    pub applied_at: DateTimeWithTimeZone,
    pub excluded_title_ids: Vec<i32>,
}

/// A pending update with the names the parent needs to decide on it
#[derive(Debug, Clone, Serialize)]
pub struct PendingUpdate {
    #[serde(flatten)]
    pub update: PackageUpdate,
    pub package_name: String,
    pub title_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    Accept,
    Dismiss,
}

async fn find_package<C>(conn: &C, package_id: i32) -> Result<ContentPackage>
where
    C: ConnectionTrait,
{
    ContentPackageEntity::find_by_id(package_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Package, package_id))
}

async fn member_title_ids<C>(conn: &C, package_id: i32) -> Result<Vec<i32>>
where
    C: ConnectionTrait,
{
    PackageItemEntity::find()
        .select_only()
        .column(PackageItemColumn::TitleId)
        .filter(PackageItemColumn::PackageId.eq(package_id))
        .order_by_asc(PackageItemColumn::Id)
        .into_tuple()
        .all(conn)
        .await
        .map_err(Into::into)
}

async fn find_application<C>(conn: &C, kid_profile_id: i32, package_id: i32) -> Result<Option<PackageApplication>>
where
    C: ConnectionTrait,
{
    PackageApplicationEntity::find()
        .filter(PackageApplicationColumn::KidProfileId.eq(kid_profile_id))
        .filter(PackageApplicationColumn::PackageId.eq(package_id))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Titles already offered to a kid for a package, whatever the update's status
async fn offered_title_ids<C>(conn: &C, kid_profile_id: i32, package_id: i32) -> Result<HashSet<i32>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = PackageUpdateEntity::find()
        .select_only()
        .column(PackageUpdateColumn::TitleId)
        .filter(PackageUpdateColumn::KidProfileId.eq(kid_profile_id))
        .filter(PackageUpdateColumn::PackageId.eq(package_id))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Create pending updates for `new_members` on one application; returns the rows created
async fn emit_updates<C>(conn: &C, application: &PackageApplication, new_members: &[i32]) -> Result<Vec<PackageUpdate>>
where
    C: ConnectionTrait,
{
    let excluded: HashSet<i32> = application.excluded().into_iter().collect();
    let existing: HashSet<i32> = policy_title_ids(conn, application.kid_profile_id).await?.into_iter().collect();
    let offered = offered_title_ids(conn, application.kid_profile_id, application.package_id).await?;

    let now = Utc::now();
    let mut created = Vec::new();
    for title_id in update_candidates(new_members, &excluded, &existing, &offered) {
        let update = PackageUpdateActiveModel {
            kid_profile_id: Set(application.kid_profile_id),
            package_id: Set(application.package_id),
            title_id: Set(title_id),
            status: Set(UpdateStatus::Pending.as_str().to_string()),
            created_at: Set(now.into()),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        created.push(update);
    }
    Ok(created)
}

async fn summarize<C>(conn: &C, package: ContentPackage, with_applied: bool) -> Result<PackageSummary>
where
    C: ConnectionTrait,
{
    let title_count = PackageItemEntity::find()
        .filter(PackageItemColumn::PackageId.eq(package.id))
        .count(conn)
        .await?;
    let applied_count = if with_applied {
        Some(
            PackageApplicationEntity::find()
                .filter(PackageApplicationColumn::PackageId.eq(package.id))
                .count(conn)
                .await?,
        )
    } else {
        None
    };
    Ok(PackageSummary { package, title_count, applied_count })
}

impl Repository {
    // ========================================================================
    // Package Catalogue (parents)
    // ========================================================================

    /// Active packages, optionally restricted to those admitting `kid_age`
    pub async fn list_available_packages(&self, kid_age: Option<i32>) -> Result<Vec<PackageSummary>> {
        let conn = self.read_conn();
        let packages = ContentPackageEntity::find()
            .filter(ContentPackageColumn::IsActive.eq(true))
            .order_by_asc(ContentPackageColumn::Id)
            .all(conn)
            .await?;

        let mut summaries = Vec::new();
        for package in available_for_age(packages, kid_age) {
            summaries.push(summarize(conn, package, false).await?);
        }
        Ok(summaries)
    }

    /// Packages suitable for one of the caller's kids, by the kid's age
    pub async fn list_packages_for_kid(&self, parent_id: i32, kid_profile_id: i32) -> Result<Vec<PackageSummary>> {
        let kid = ensure_kid_owned(self.read_conn(), parent_id, kid_profile_id).await?;
        self.list_available_packages(Some(kid.age)).await
    }

    /// Package members; with a kid, also whether it is applied and which titles are already covered
    pub async fn package_detail(
        &self,
        parent_id: i32,
        package_id: i32,
        kid_profile_id: Option<i32>,
    ) -> Result<PackageDetail> {
        let conn = self.read_conn();
        let package = find_package(conn, package_id).await?;

        let (applied, covered) = match kid_profile_id {
            Some(kid_id) => {
                ensure_kid_owned(conn, parent_id, kid_id).await?;
                let applied = find_application(conn, kid_id, package_id).await?.is_some();
                let covered: HashSet<i32> = policy_title_ids(conn, kid_id).await?.into_iter().collect();
                (Some(applied), Some(covered))
            }
            None => (None, None),
        };

        let items = PackageItemEntity::find()
            .filter(PackageItemColumn::PackageId.eq(package_id))
            .find_also_related(TitleEntity)
            .order_by_asc(PackageItemColumn::Id)
            .all(conn)
            .await?;

        let titles = items
            .into_iter()
            .filter_map(|(_, title)| title)
            .map(|title| PackageTitle {
                has_policy: covered.as_ref().map(|c| c.contains(&title.id)),
                title_id: title.id,
                name: title.name,
                media_type: title.media_type,
                poster_ref: title.poster_ref,
            })
            .collect();

        Ok(PackageDetail { package, titles, applied })
    }

    // ========================================================================
    // Package Application
    // ========================================================================

    /// Apply a package to a kid. Existing policies are skipped, never overwritten.
    pub async fn apply_package(
        &self,
        parent_id: i32,
        package_id: i32,
        kid_profile_id: i32,
        excluded_title_ids: Vec<i32>,
    ) -> Result<ApplyOutcome> {
        let txn = self.write_conn().begin().await?;
        ensure_kid_owned(&txn, parent_id, kid_profile_id).await?;

        let package = find_package(&txn, package_id).await?;
        if !package.is_active {
            return Err(AppError::not_found(Resource::Package, package_id));
        }
        if find_application(&txn, kid_profile_id, package_id).await?.is_some() {
            return Err(AppError::Duplicate { message: already_applied(package_id, kid_profile_id) });
        }

        let members = member_title_ids(&txn, package_id).await?;
        let excluded: BTreeSet<i32> = excluded_title_ids.into_iter().collect();
        let excluded_set: HashSet<i32> = excluded.iter().copied().collect();
        let existing: HashSet<i32> = policy_title_ids(&txn, kid_profile_id).await?.into_iter().collect();

        let plan = plan_application(&members, &excluded_set, &existing);
        for &title_id in &plan.create {
            insert_package_policy(&txn, kid_profile_id, title_id, package_id).await?;
        }

        PackageApplicationActiveModel {
            kid_profile_id: Set(kid_profile_id),
            package_id: Set(package_id),
            applied_at: Set(Utc::now().into()),
            excluded_title_ids: Set(serde_json::to_value(&excluded)?),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| duplicate_on_conflict(e, || already_applied(package_id, kid_profile_id)))?;

        txn.commit().await?;

        metrics::record_package_application(plan.created_count(), plan.skipped_count());
        metrics::record_policy_write("package", plan.created_count());
        info!(
            package_id,
            kid_profile_id,
            created = plan.created_count(),
            skipped = plan.skipped_count(),
            excluded = plan.excluded.len(),
            "Package applied"
        );

        Ok(ApplyOutcome {
            package_id,
            kid_profile_id,
            created_count: plan.created_count(),
            skipped_count: plan.skipped_count(),
            excluded_count: plan.excluded.len(),
        })
    }

    /// Remove a package from a kid, deleting only the policies it created and nobody edited since.
    /// Returns the number of policies removed.
    pub async fn unapply_package(&self, parent_id: i32, package_id: i32, kid_profile_id: i32) -> Result<u64> {
        let txn = self.write_conn().begin().await?;
        ensure_kid_owned(&txn, parent_id, kid_profile_id).await?;

        let application = find_application(&txn, kid_profile_id, package_id)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::PackageApplication, format!("{}/{}", kid_profile_id, package_id)))?;

        let owned_policy_ids: Vec<i32> = PolicyEntity::find()
            .filter(PolicyColumn::KidProfileId.eq(kid_profile_id))
            .filter(PolicyColumn::SourcePackageId.eq(package_id))
            .filter(PolicyColumn::ManuallyModified.eq(false))
            .all(&txn)
            .await?
            .into_iter()
            .filter(|p| p.owned_by_package(package_id))
            .map(|p| p.id)
            .collect();

        EpisodePolicyEntity::delete_many()
            .filter(EpisodePolicyColumn::PolicyId.is_in(owned_policy_ids.clone()))
            .exec(&txn)
            .await?;
        let removed = PolicyEntity::delete_many()
            .filter(PolicyColumn::Id.is_in(owned_policy_ids))
            .exec(&txn)
            .await?
            .rows_affected;

        PackageUpdateEntity::delete_many()
            .filter(PackageUpdateColumn::KidProfileId.eq(kid_profile_id))
            .filter(PackageUpdateColumn::PackageId.eq(package_id))
            .filter(PackageUpdateColumn::Status.eq(UpdateStatus::Pending.as_str()))
            .exec(&txn)
            .await?;

        PackageApplicationEntity::delete_by_id(application.id).exec(&txn).await?;

        txn.commit().await?;

        info!(package_id, kid_profile_id, policies_removed = removed, "Package unapplied");
        Ok(removed)
    }

    /// Packages currently applied to a kid
    pub async fn list_applied_packages(&self, parent_id: i32, kid_profile_id: i32) -> Result<Vec<AppliedPackage>> {
        let conn = self.read_conn();
        ensure_kid_owned(conn, parent_id, kid_profile_id).await?;

        let rows = PackageApplicationEntity::find()
            .filter(PackageApplicationColumn::KidProfileId.eq(kid_profile_id))
            .find_also_related(ContentPackageEntity)
            .order_by_asc(PackageApplicationColumn::AppliedAt)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, package)| {
                Some(AppliedPackage {
                    excluded_title_ids: application.excluded(),
                    applied_at: application.applied_at,
                    package: package?,
                })
            })
            .collect())
    }

    // ========================================================================
    // Package Updates
    // ========================================================================

    /// Offer titles added to a kid's applied packages since they were applied.
    /// Returns only the updates created by this call.
    pub async fn check_for_updates(&self, parent_id: i32, kid_profile_id: i32) -> Result<Vec<PackageUpdate>> {
        let txn = self.write_conn().begin().await?;
        ensure_kid_owned(&txn, parent_id, kid_profile_id).await?;

        let applications = PackageApplicationEntity::find()
            .filter(PackageApplicationColumn::KidProfileId.eq(kid_profile_id))
            .find_also_related(ContentPackageEntity)
            .all(&txn)
            .await?;

        let mut created = Vec::new();
        for (application, package) in applications {
            if !package.is_some_and(|p| p.is_active) {
                continue;
            }

            let new_members: Vec<i32> = PackageItemEntity::find()
                .filter(PackageItemColumn::PackageId.eq(application.package_id))
                .order_by_asc(PackageItemColumn::Id)
                .all(&txn)
                .await?
                .into_iter()
                .filter(|item| item.added_at > application.applied_at)
                .map(|item| item.title_id)
                .collect();

            if new_members.is_empty() {
                continue;
            }
            created.extend(emit_updates(&txn, &application, &new_members).await?);
        }

        txn.commit().await?;

        debug!(kid_profile_id, created = created.len(), "Checked package updates");
        Ok(created)
    }

    /// Pending updates across all of a parent's kids
    pub async fn list_pending_updates(&self, parent_id: i32) -> Result<Vec<PendingUpdate>> {
        let conn = self.read_conn();
        let kid_ids: Vec<i32> = KidProfileEntity::find()
            .select_only()
            .column(KidProfileColumn::Id)
            .filter(KidProfileColumn::ParentId.eq(parent_id))
            .into_tuple()
            .all(conn)
            .await?;

        let updates = PackageUpdateEntity::find()
            .filter(PackageUpdateColumn::KidProfileId.is_in(kid_ids))
            .filter(PackageUpdateColumn::Status.eq(UpdateStatus::Pending.as_str()))
            .order_by_asc(PackageUpdateColumn::CreatedAt)
            .order_by_asc(PackageUpdateColumn::Id)
            .all(conn)
            .await?;

        let package_ids: BTreeSet<i32> = updates.iter().map(|u| u.package_id).collect();
        let title_ids: BTreeSet<i32> = updates.iter().map(|u| u.title_id).collect();

        let package_names: HashMap<i32, String> = ContentPackageEntity::find()
            .filter(ContentPackageColumn::Id.is_in(package_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let title_names: HashMap<i32, String> = TitleEntity::find()
            .filter(TitleColumn::Id.is_in(title_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        Ok(updates
            .into_iter()
            .map(|update| PendingUpdate {
                package_name: package_names.get(&update.package_id).cloned().unwrap_or_default(),
                title_name: title_names.get(&update.title_id).cloned().unwrap_or_default(),
                update,
            })
            .collect())
    }

    /// Accept or dismiss a pending update. Accepting creates the policy unless one exists.
    pub async fn resolve_update(&self, parent_id: i32, update_id: i32, action: UpdateAction) -> Result<PackageUpdate> {
        let txn = self.write_conn().begin().await?;

        let update = PackageUpdateEntity::find_by_id(update_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::PackageUpdate, update_id))?;
        ensure_kid_owned(&txn, parent_id, update.kid_profile_id).await?;

        let target = match action {
            UpdateAction::Accept => UpdateStatus::Accepted,
            UpdateAction::Dismiss => UpdateStatus::Dismissed,
        };

        let resolved_at: DateTimeWithTimeZone = Utc::now().into();
        let claimed = PackageUpdateEntity::update_many()
            .col_expr(PackageUpdateColumn::Status, Expr::value(target.as_str()))
            .col_expr(PackageUpdateColumn::ResolvedAt, Expr::value(resolved_at))
            .filter(PackageUpdateColumn::Id.eq(update_id))
            .filter(PackageUpdateColumn::Status.eq(UpdateStatus::Pending.as_str()))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::invalid_transition(format!("package update {} is already {}", update_id, update.status)));
        }

        let mut created_policy = false;
        if target == UpdateStatus::Accepted
            && find_policy(&txn, update.kid_profile_id, update.title_id).await?.is_none()
        {
            insert_package_policy(&txn, update.kid_profile_id, update.title_id, update.package_id).await?;
            created_policy = true;
        }

        let resolved = PackageUpdateEntity::find_by_id(update_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::PackageUpdate, update_id))?;

        txn.commit().await?;

        if created_policy {
            metrics::record_policy_write("update", 1);
        }
        info!(update_id, status = target.as_str(), created_policy, "Package update resolved");
        Ok(resolved)
    }

    // ========================================================================
    // Package Administration
    // ========================================================================

    pub async fn create_package(&self, admin_id: i32, input: PackageInput) -> Result<ContentPackage> {
        validate_package_fields(Some(&input.name), input.age_min, input.age_max)?;

        let now = Utc::now();
        let package = ContentPackageActiveModel {
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            age_min: Set(input.age_min),
            age_max: Set(input.age_max),
            category: Set(input.category.as_str().to_string()),
            icon: Set(input.icon),
            is_active: Set(true),
            created_by: Set(Some(admin_id)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        info!(package_id = package.id, admin_id, "Package created");
        Ok(package)
    }

    pub async fn update_package(&self, package_id: i32, patch: PackagePatch) -> Result<ContentPackage> {
        let txn = self.write_conn().begin().await?;
        let package = find_package(&txn, package_id).await?;

        let age_min = patch.age_min.unwrap_or(package.age_min);
        let age_max = patch.age_max.unwrap_or(package.age_max);
        validate_package_fields(patch.name.as_deref(), age_min, age_max)?;

        let mut active: ContentPackageActiveModel = package.into();
        if let Some(name) = patch.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = patch.category {
            active.category = Set(category.as_str().to_string());
        }
        if let Some(icon) = patch.icon {
            active.icon = Set(Some(icon));
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.age_min = Set(age_min);
        active.age_max = Set(age_max);
        active.updated_at = Set(Utc::now().into());

        let package = active.update(&txn).await?;
        txn.commit().await?;

        info!(package_id, "Package updated");
        Ok(package)
    }

    /// Soft delete. Existing applications and their policies stay.
    pub async fn deactivate_package(&self, package_id: i32) -> Result<ContentPackage> {
        self.update_package(package_id, PackagePatch { is_active: Some(false), ..Default::default() })
            .await
    }

    /// Add titles to a package, skipping unknown titles and existing members.
    /// While the package is active, kids who have it applied are offered each
    /// new title straight away.
    pub async fn add_package_items(&self, package_id: i32, title_ids: Vec<i32>) -> Result<usize> {
        let txn = self.write_conn().begin().await?;
        let package = find_package(&txn, package_id).await?;

        let mut members: HashSet<i32> = member_title_ids(&txn, package_id).await?.into_iter().collect();
        let requested: BTreeSet<i32> = title_ids.into_iter().collect();
        let known: HashSet<i32> = TitleEntity::find()
            .select_only()
            .column(TitleColumn::Id)
            .filter(TitleColumn::Id.is_in(requested.iter().copied()))
            .into_tuple::<i32>()
            .all(&txn)
            .await?
            .into_iter()
            .collect();

        let now = Utc::now();
        let mut added = Vec::new();
        for title_id in requested {
            if !known.contains(&title_id) || !members.insert(title_id) {
                continue;
            }
            PackageItemActiveModel {
                package_id: Set(package_id),
                title_id: Set(title_id),
                added_at: Set(now.into()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            added.push(title_id);
        }

        let mut offered = 0;
        if package.is_active && !added.is_empty() {
            let applications = PackageApplicationEntity::find()
                .filter(PackageApplicationColumn::PackageId.eq(package_id))
                .all(&txn)
                .await?;
            for application in &applications {
                offered += emit_updates(&txn, application, &added).await?.len();
            }
        }

        txn.commit().await?;

        info!(package_id, added = added.len(), updates_offered = offered, "Package items added");
        Ok(added.len())
    }

    pub async fn remove_package_item(&self, package_id: i32, title_id: i32) -> Result<()> {
        let txn = self.write_conn().begin().await?;
        find_package(&txn, package_id).await?;

        let removed = PackageItemEntity::delete_many()
            .filter(PackageItemColumn::PackageId.eq(package_id))
            .filter(PackageItemColumn::TitleId.eq(title_id))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(AppError::not_found(Resource::PackageItem, format!("{}/{}", package_id, title_id)));
        }

        PackageUpdateEntity::delete_many()
            .filter(PackageUpdateColumn::PackageId.eq(package_id))
            .filter(PackageUpdateColumn::TitleId.eq(title_id))
            .filter(PackageUpdateColumn::Status.eq(UpdateStatus::Pending.as_str()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(package_id, title_id, "Package item removed");
        Ok(())
    }

    /// Every package, active or not, with member and application counts
    pub async fn list_packages_admin(&self) -> Result<Vec<PackageSummary>> {
        let conn = self.read_conn();
        let packages = ContentPackageEntity::find()
            .order_by_asc(ContentPackageColumn::Id)
            .all(conn)
            .await?;

        let mut summaries = Vec::with_capacity(packages.len());
        for package in packages {
            summaries.push(summarize(conn, package, true).await?);
        }
        Ok(summaries)
    }
}

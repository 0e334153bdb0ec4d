//! Content package handlers: catalogue, application, updates and administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    db::{
        models::{ContentPackage, PackageUpdate},
        AppliedPackage, ApplyOutcome, PackageDetail, PackageInput, PackagePatch, PackageSummary,
        PendingUpdate, UpdateAction,
    },
    errors::Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct PackageListQuery {
    pub age: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PackageDetailQuery {
    pub kid_profile_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPackageRequest {
    pub kid_profile_id: i32,
    #[serde(default)]
    pub excluded_title_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct UnapplyResponse {
    pub package_id: i32,
    pub kid_profile_id: i32,
    pub policies_removed: u64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveUpdateRequest {
    pub action: UpdateAction,
}

#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub title_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct AddItemsResponse {
    pub package_id: i32,
    pub added: usize,
}

// ============================================================================
// Parent-facing
// ============================================================================

pub async fn list_packages(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<PackageListQuery>,
) -> Result<Json<Vec<PackageSummary>>> {
    auth.require_parent()?;
    Ok(Json(state.repo.list_available_packages(query.age).await?))
}

pub async fn packages_for_kid(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<Vec<PackageSummary>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_packages_for_kid(parent_id, kid_profile_id).await?))
}

pub async fn package_detail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(package_id): Path<i32>,
    Query(query): Query<PackageDetailQuery>,
) -> Result<Json<PackageDetail>> {
    let parent_id = auth.require_parent()?;
    let detail = state
        .repo
        .package_detail(parent_id, package_id, query.kid_profile_id)
        .await?;
    Ok(Json(detail))
}

pub async fn apply_package(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(package_id): Path<i32>,
    Json(request): Json<ApplyPackageRequest>,
) -> Result<(StatusCode, Json<ApplyOutcome>)> {
    let parent_id = auth.require_parent()?;
    let outcome = state
        .repo
        .apply_package(parent_id, package_id, request.kid_profile_id, request.excluded_title_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn unapply_package(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((package_id, kid_profile_id)): Path<(i32, i32)>,
) -> Result<Json<UnapplyResponse>> {
    let parent_id = auth.require_parent()?;
    let policies_removed = state
        .repo
        .unapply_package(parent_id, package_id, kid_profile_id)
        .await?;
    Ok(Json(UnapplyResponse { package_id, kid_profile_id, policies_removed }))
}

pub async fn applied_packages(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<Vec<AppliedPackage>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_applied_packages(parent_id, kid_profile_id).await?))
}

pub async fn check_updates(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<Vec<PackageUpdate>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.check_for_updates(parent_id, kid_profile_id).await?))
}

pub async fn pending_updates(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<PendingUpdate>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_pending_updates(parent_id).await?))
}

pub async fn resolve_update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(update_id): Path<i32>,
    Json(request): Json<ResolveUpdateRequest>,
) -> Result<Json<PackageUpdate>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.resolve_update(parent_id, update_id, request.action).await?))
}

// ============================================================================
// Administration
// ============================================================================

pub async fn admin_list_packages(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<PackageSummary>>> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_packages_admin().await?))
}

pub async fn create_package(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<PackageInput>,
) -> Result<(StatusCode, Json<ContentPackage>)> {
    let admin_id = auth.require_admin()?;
    let package = state.repo.create_package(admin_id, request).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

pub async fn update_package(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(package_id): Path<i32>,
    Json(patch): Json<PackagePatch>,
) -> Result<Json<ContentPackage>> {
    auth.require_admin()?;
    Ok(Json(state.repo.update_package(package_id, patch).await?))
}

pub async fn deactivate_package(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(package_id): Path<i32>,
) -> Result<Json<ContentPackage>> {
    auth.require_admin()?;
    Ok(Json(state.repo.deactivate_package(package_id).await?))
}

pub async fn add_items(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(package_id): Path<i32>,
    Json(request): Json<AddItemsRequest>,
) -> Result<Json<AddItemsResponse>> {
    auth.require_admin()?;
    let added = state.repo.add_package_items(package_id, request.title_ids).await?;
    Ok(Json(AddItemsResponse { package_id, added }))
}

pub async fn remove_item(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((package_id, title_id)): Path<(i32, i32)>,
) -> Result<StatusCode> {
    auth.require_admin()?;
    state.repo.remove_package_item(package_id, title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

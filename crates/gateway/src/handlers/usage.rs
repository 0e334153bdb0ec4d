//! Time limits, device pairing and usage reporting

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::DeviceContext;
use crate::AppState;
use safeview_common::{
    access::TimeLimits,
    auth::AuthContext,
    db::{models::Device, DeviceRegistration, UsageSummary},
    errors::Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    pub kid_profile_id: i32,

    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordUsageRequest {
    /// Minutes watched since the device's last report
    #[validate(range(min = 0, max = 1440))]
    pub minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    pub device_minutes_today: i32,
    #[serde(flatten)]
    pub summary: UsageSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// Household-local date; defaults to today
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Time limits
// ============================================================================

pub async fn get_family_limits(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<TimeLimits>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.get_time_limits(Some(parent_id), None).await?))
}

pub async fn set_family_limits(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(limits): Json<TimeLimits>,
) -> Result<Json<TimeLimits>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.set_time_limits(parent_id, None, limits).await?))
}

/// Effective limits for a kid, after the family fallback
pub async fn get_kid_limits(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<TimeLimits>> {
    let owner = auth.require_kid_or_parent(kid_profile_id)?;
    Ok(Json(state.repo.get_time_limits(owner, Some(kid_profile_id)).await?))
}

pub async fn set_kid_limits(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
    Json(limits): Json<TimeLimits>,
) -> Result<Json<TimeLimits>> {
    let parent_id = auth.require_parent()?;
    let stored = state
        .repo
        .set_time_limits(parent_id, Some(kid_profile_id), limits)
        .await?;
    Ok(Json(stored))
}

// ============================================================================
// Devices
// ============================================================================

pub async fn register_device(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceRegistration>)> {
    let parent_id = auth.require_parent()?;
    request.validate()?;

    let registration = state
        .repo
        .register_device(parent_id, request.kid_profile_id, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn list_devices(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Device>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_devices(parent_id).await?))
}

// ============================================================================
// Usage
// ============================================================================

/// Devices report watched minutes as deltas
pub async fn record_usage(
    State(state): State<AppState>,
    DeviceContext(device): DeviceContext,
    Json(request): Json<RecordUsageRequest>,
) -> Result<Json<RecordUsageResponse>> {
    request.validate()?;

    let now = Utc::now();
    let device_minutes_today = state.repo.record_usage(&device, request.minutes, now).await?;

    let today = state.repo.launch_config().local_date(now);
    let summary = state.repo.usage_summary(None, device.kid_profile_id, today).await?;

    Ok(Json(RecordUsageResponse {
        device_minutes_today,
        summary,
    }))
}

pub async fn usage_summary(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageSummary>> {
    let owner = auth.require_kid_or_parent(kid_profile_id)?;
    let date = query
        .date
        .unwrap_or_else(|| state.repo.launch_config().local_date(Utc::now()));
    Ok(Json(state.repo.usage_summary(owner, kid_profile_id, date).await?))
}

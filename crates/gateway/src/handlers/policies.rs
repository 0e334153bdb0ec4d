//! Policy store handlers: title policies, episode overrides and tag bulk blocking

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    db::{
        models::{EpisodePolicy, Policy},
        AllowedTitle, BlockOutcome, EpisodeState, PolicyWithTitle, SetPolicyInput, TitleStatus,
    },
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct UpdatePolicyRequest {
    pub is_allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeOverrideRequest {
    pub is_blocked: bool,
}

/// Create or replace the policy for a (kid, title) pair
pub async fn set_policy(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<SetPolicyInput>,
) -> Result<Json<Policy>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.set_policy(parent_id, request).await?))
}

pub async fn update_policy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(policy_id): Path<i32>,
    Json(request): Json<UpdatePolicyRequest>,
) -> Result<Json<Policy>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.update_policy(parent_id, policy_id, request.is_allowed).await?))
}

pub async fn delete_policy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(policy_id): Path<i32>,
) -> Result<StatusCode> {
    let parent_id = auth.require_parent()?;
    state.repo.delete_policy(parent_id, policy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_policies(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<Vec<PolicyWithTitle>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_policies(parent_id, kid_profile_id).await?))
}

/// Launcher listing; open to the kid's own session
pub async fn allowed_titles(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<Vec<AllowedTitle>>> {
    let owner = auth.require_kid_or_parent(kid_profile_id)?;
    Ok(Json(state.repo.launcher_titles(owner, kid_profile_id).await?))
}

pub async fn title_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kid_profile_id, title_id)): Path<(i32, i32)>,
) -> Result<Json<TitleStatus>> {
    let owner = auth.require_kid_or_parent(kid_profile_id)?;
    Ok(Json(state.repo.title_status(owner, kid_profile_id, title_id).await?))
}

pub async fn list_policy_episodes(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(policy_id): Path<i32>,
) -> Result<Json<Vec<EpisodeState>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_policy_episodes(parent_id, policy_id).await?))
}

pub async fn set_episode_override(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((policy_id, episode_id)): Path<(i32, i32)>,
    Json(request): Json<EpisodeOverrideRequest>,
) -> Result<Json<EpisodePolicy>> {
    let parent_id = auth.require_parent()?;
    let row = state
        .repo
        .set_episode_override(parent_id, policy_id, episode_id, request.is_blocked)
        .await?;
    Ok(Json(row))
}

/// Preview which episodes a block-by-tag would touch
pub async fn episodes_by_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((policy_id, tag_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<EpisodeState>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_episodes_by_tag(parent_id, policy_id, tag_id).await?))
}

pub async fn block_by_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((policy_id, tag_id)): Path<(i32, i32)>,
) -> Result<Json<BlockOutcome>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.block_episodes_by_tag(parent_id, policy_id, tag_id).await?))
}

//! Catalog handlers: titles, episodes and content tags

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    catalog::TagCategory,
    db::{
        models::{ContentTag, Episode, Title},
        EpisodeInput, TagInput, TitleInput,
    },
    errors::Result,
};

/// Source recorded on tag associations made through the admin API
const ADMIN_TAG_SOURCE: &str = "admin";

#[derive(Debug, Default, Deserialize)]
pub struct TagListQuery {
    pub category: Option<TagCategory>,
}

#[derive(Debug, Deserialize)]
pub struct AttachTagRequest {
    pub tag_id: i32,
}

#[derive(Debug, Serialize)]
pub struct AttachTagResponse {
    pub tag_id: i32,
    pub created: bool,
}

/// Category catalogue entry with its display label
#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub id: TagCategory,
    pub label: &'static str,
}

pub async fn get_title(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(title_id): Path<i32>,
) -> Result<Json<Title>> {
    Ok(Json(state.repo.get_title(title_id).await?))
}

pub async fn list_episodes(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(title_id): Path<i32>,
) -> Result<Json<Vec<Episode>>> {
    Ok(Json(state.repo.list_episodes(title_id).await?))
}

pub async fn title_tags(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(title_id): Path<i32>,
) -> Result<Json<Vec<ContentTag>>> {
    Ok(Json(state.repo.title_tags(title_id).await?))
}

pub async fn list_tags(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(query): Query<TagListQuery>,
) -> Result<Json<Vec<ContentTag>>> {
    Ok(Json(state.repo.list_tags(query.category).await?))
}

pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(
        TagCategory::ALL
            .into_iter()
            .map(|id| CategoryInfo { id, label: id.label() })
            .collect(),
    )
}

// ============================================================================
// Administration
// ============================================================================

pub async fn upsert_title(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<TitleInput>,
) -> Result<Json<Title>> {
    auth.require_admin()?;
    Ok(Json(state.repo.upsert_title(request).await?))
}

pub async fn add_episode(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(title_id): Path<i32>,
    Json(request): Json<EpisodeInput>,
) -> Result<Json<Episode>> {
    auth.require_admin()?;
    Ok(Json(state.repo.add_episode(title_id, request).await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<TagInput>,
) -> Result<(StatusCode, Json<ContentTag>)> {
    auth.require_admin()?;
    let tag = state.repo.create_tag(request).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn tag_title(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(title_id): Path<i32>,
    Json(request): Json<AttachTagRequest>,
) -> Result<Json<AttachTagResponse>> {
    auth.require_admin()?;
    let created = state
        .repo
        .attach_title_tag(title_id, request.tag_id, ADMIN_TAG_SOURCE)
        .await?;
    Ok(Json(AttachTagResponse { tag_id: request.tag_id, created }))
}

pub async fn tag_episode(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(episode_id): Path<i32>,
    Json(request): Json<AttachTagRequest>,
) -> Result<Json<AttachTagResponse>> {
    auth.require_admin()?;
    let created = state
        .repo
        .attach_episode_tag(episode_id, request.tag_id, ADMIN_TAG_SOURCE)
        .await?;
    Ok(Json(AttachTagResponse { tag_id: request.tag_id, created }))
}

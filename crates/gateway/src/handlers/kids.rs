//! Kid profile handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    db::models::KidProfile,
    errors::Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKidRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(range(min = 0, max = 17))]
    pub age: i32,
}

pub async fn create_kid(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateKidRequest>,
) -> Result<(StatusCode, Json<KidProfile>)> {
    let parent_id = auth.require_parent()?;
    request.validate()?;

    let kid = state.repo.create_kid_profile(parent_id, &request.name, request.age).await?;
    Ok((StatusCode::CREATED, Json(kid)))
}

pub async fn list_kids(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<KidProfile>>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.list_kid_profiles(parent_id).await?))
}

pub async fn get_kid(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kid_profile_id): Path<i32>,
) -> Result<Json<KidProfile>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.get_kid_profile(parent_id, kid_profile_id).await?))
}

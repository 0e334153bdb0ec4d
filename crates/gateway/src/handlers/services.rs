//! Streaming service catalogue and per-parent selection

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    catalog::{ServiceSelection, StreamingService, AVAILABLE_SERVICES},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub selected_services: Vec<String>,
}

pub async fn list_services() -> Json<Vec<StreamingService>> {
    Json(AVAILABLE_SERVICES.to_vec())
}

pub async fn get_selection(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ServiceSelection>> {
    let parent_id = auth.require_parent()?;
    Ok(Json(state.repo.get_service_selection(parent_id).await?))
}

pub async fn set_selection(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<ServiceSelection>> {
    let parent_id = auth.require_parent()?;
    let selection = state
        .repo
        .set_service_selection(parent_id, request.selected_services)
        .await?;
    Ok(Json(selection))
}

//! Launch check handler

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;
use safeview_common::{
    access::LaunchDecision,
    auth::AuthContext,
    db::LaunchRequest,
    errors::Result,
};

/// Wire shape of a launch decision
#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
}

impl From<LaunchDecision> for LaunchResponse {
    fn from(decision: LaunchDecision) -> Self {
        match decision {
            LaunchDecision::Allow(target) => Self {
                allowed: true,
                reason: None,
                deep_link: Some(target.deep_link),
                fallback_url: Some(target.fallback_url),
            },
            LaunchDecision::Deny(reason) => Self {
                allowed: false,
                reason: Some(reason.as_str()),
                deep_link: None,
                fallback_url: None,
            },
        }
    }
}

/// A denial is a normal answer, not an error
pub async fn check_launch(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<LaunchRequest>,
) -> Result<Json<LaunchResponse>> {
    let owner = auth.require_kid_or_parent(request.kid_profile_id)?;
    let decision = state.repo.check_launch(owner, &request, Utc::now()).await?;
    Ok(Json(decision.into()))
}

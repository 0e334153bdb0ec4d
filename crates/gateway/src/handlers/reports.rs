//! Content report handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::AppState;
use safeview_common::{
    auth::AuthContext,
    db::{
        models::{ContentReport, ReportStatus},
        ReportInput,
    },
    errors::Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<String>,
}

/// Any parent may file a report
pub async fn create_report(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<ReportInput>,
) -> Result<(StatusCode, Json<ContentReport>)> {
    let parent_id = auth.require_parent()?;
    let report = state.repo.create_report(parent_id, request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_reports(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<Vec<ContentReport>>> {
    auth.require_admin()?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ReportStatus>)
        .transpose()?;
    Ok(Json(state.repo.list_reports(status).await?))
}

pub async fn approve_report(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(report_id): Path<i32>,
) -> Result<Json<ContentReport>> {
    let admin_id = auth.require_admin()?;
    Ok(Json(state.repo.approve_report(admin_id, report_id).await?))
}

pub async fn reject_report(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(report_id): Path<i32>,
) -> Result<Json<ContentReport>> {
    let admin_id = auth.require_admin()?;
    Ok(Json(state.repo.reject_report(admin_id, report_id).await?))
}

//! Content report moderation

use super::catalog::{attach_episode_tag_in, attach_title_tag_in};
use super::{find_tag, find_title, Repository};
use crate::access::moderation::{check_review, tag_target, validate_report_position, ReviewAction, TagTarget};
use crate::db::models::*;
use crate::errors::{AppError, Resource, Result};
use crate::metrics;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;

/// Tag source recorded on associations created by report approval
const REPORT_TAG_SOURCE: &str = "user_report";

#[derive(Debug, Clone, Deserialize)]
pub struct ReportInput {
    pub title_id: i32,
    pub tag_id: i32,
    #[serde(default)]
    pub season_number: Option<i32>,
    #[serde(default)]
    pub episode_number: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Repository {
    // ========================================================================
    // Content Report Operations
    // ========================================================================

    /// File a report for moderation
    pub async fn create_report(&self, parent_id: i32, input: ReportInput) -> Result<ContentReport> {
        validate_report_position(input.season_number, input.episode_number)?;

        let txn = self.write_conn().begin().await?;
        find_title(&txn, input.title_id).await?;
        find_tag(&txn, input.tag_id).await?;

        let report = ContentReportActiveModel {
            title_id: Set(input.title_id),
            tag_id: Set(input.tag_id),
            season_number: Set(input.season_number),
            episode_number: Set(input.episode_number),
            notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
            status: Set(ReportStatus::Pending.as_str().to_string()),
            reported_by: Set(parent_id),
            reviewed_by: Set(None),
            created_at: Set(Utc::now().into()),
            reviewed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(report_id = report.id, title_id = report.title_id, tag_id = report.tag_id, "Content report filed");
        Ok(report)
    }

    /// Moderation queue, newest first
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<ContentReport>> {
        let mut query = ContentReportEntity::find();
        if let Some(status) = status {
            query = query.filter(ContentReportColumn::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(ContentReportColumn::CreatedAt)
            .order_by_desc(ContentReportColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn approve_report(&self, admin_id: i32, report_id: i32) -> Result<ContentReport> {
        self.review_report(admin_id, report_id, ReviewAction::Approve).await
    }

    pub async fn reject_report(&self, admin_id: i32, report_id: i32) -> Result<ContentReport> {
        self.review_report(admin_id, report_id, ReviewAction::Reject).await
    }

    /// Move a pending report to approved or rejected. Approval applies the tag exactly once.
    pub async fn review_report(&self, admin_id: i32, report_id: i32, action: ReviewAction) -> Result<ContentReport> {
        let txn = self.write_conn().begin().await?;

        let report = ContentReportEntity::find_by_id(report_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Report, report_id))?;
        let target = check_review(&report, admin_id, action)?;

        // only one reviewer can win the pending -> terminal transition
        let reviewed_at: DateTimeWithTimeZone = Utc::now().into();
        let claimed = ContentReportEntity::update_many()
            .col_expr(ContentReportColumn::Status, Expr::value(target.as_str()))
            .col_expr(ContentReportColumn::ReviewedBy, Expr::value(admin_id))
            .col_expr(ContentReportColumn::ReviewedAt, Expr::value(reviewed_at))
            .filter(ContentReportColumn::Id.eq(report_id))
            .filter(ContentReportColumn::Status.eq(ReportStatus::Pending.as_str()))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::invalid_transition(format!("report {} was reviewed concurrently", report_id)));
        }

        let mut tag_applied = false;
        if target == ReportStatus::Approved {
            let episode = match (report.season_number, report.episode_number) {
                (Some(season), Some(episode)) => EpisodeEntity::find()
                    .filter(EpisodeColumn::TitleId.eq(report.title_id))
                    .filter(EpisodeColumn::SeasonNumber.eq(season))
                    .filter(EpisodeColumn::EpisodeNumber.eq(episode))
                    .one(&txn)
                    .await?
                    .map(|e| e.id),
                _ => None,
            };

            tag_applied = match tag_target(report.title_id, episode) {
                TagTarget::Episode(episode_id) => {
                    attach_episode_tag_in(&txn, episode_id, report.tag_id, REPORT_TAG_SOURCE).await?
                }
                TagTarget::Title(title_id) => {
                    attach_title_tag_in(&txn, title_id, report.tag_id, REPORT_TAG_SOURCE).await?
                }
            };
        }

        let reviewed = ContentReportEntity::find_by_id(report_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Report, report_id))?;

        txn.commit().await?;

        metrics::record_report_review(target.as_str());
        info!(report_id, admin_id, status = target.as_str(), tag_applied, "Content report reviewed");
        Ok(reviewed)
    }
}

//! Content report entity for the moderation queue

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Report moderation status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected reports are immutable
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> crate::errors::Result<Self> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            other => Err(AppError::validation("status", format!("unknown report status '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title_id: i32,

    pub tag_id: i32,

    pub season_number: Option<i32>,

    pub episode_number: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[sea_orm(column_type = "Text", indexed)]
    pub status: String,

    /// Parent account that filed the report
    pub reported_by: i32,

    /// Admin account that reviewed it
    pub reviewed_by: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    pub reviewed_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Get the report status as an enum
    pub fn report_status(&self) -> crate::errors::Result<ReportStatus> {
        self.status.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::title::Entity",
        from = "Column::TitleId",
        to = "super::title::Column::Id"
    )]
    Title,

    #[sea_orm(
        belongs_to = "super::content_tag::Entity",
        from = "Column::TagId",
        to = "super::content_tag::Column::Id"
    )]
    Tag,
}

impl ActiveModelBehavior for ActiveModel {}

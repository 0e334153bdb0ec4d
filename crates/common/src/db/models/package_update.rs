//! Notification that an applied package gained a title

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    Accepted,
    Dismissed,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Pending => "pending",
            UpdateStatus::Accepted => "accepted",
            UpdateStatus::Dismissed => "dismissed",
        }
    }
}

impl std::str::FromStr for UpdateStatus {
    type Err = AppError;

    fn from_str(s: &str) -> crate::errors::Result<Self> {
        match s {
            "pending" => Ok(UpdateStatus::Pending),
            "accepted" => Ok(UpdateStatus::Accepted),
            "dismissed" => Ok(UpdateStatus::Dismissed),
            other => Err(AppError::validation("status", format!("unknown update status '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_updates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kid_profile_id: i32,

    pub package_id: i32,

    pub title_id: i32,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub resolved_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kid_profile::Entity",
        from = "Column::KidProfileId",
        to = "super::kid_profile::Column::Id",
        on_delete = "Cascade"
    )]
    KidProfile,

    #[sea_orm(
        belongs_to = "super::content_package::Entity",
        from = "Column::PackageId",
        to = "super::content_package::Column::Id"
    )]
    Package,

    #[sea_orm(
        belongs_to = "super::title::Entity",
        from = "Column::TitleId",
        to = "super::title::Column::Id"
    )]
    Title,
}

impl ActiveModelBehavior for ActiveModel {}

//! Content package entity: a curated bundle of titles

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Package grouping shown in the parent catalogue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageCategory {
    AgeBand,
    Theme,
    Genre,
}

impl PackageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageCategory::AgeBand => "age_band",
            PackageCategory::Theme => "theme",
            PackageCategory::Genre => "genre",
        }
    }
}

impl std::str::FromStr for PackageCategory {
    type Err = AppError;

    fn from_str(s: &str) -> crate::errors::Result<Self> {
        match s {
            "age_band" => Ok(PackageCategory::AgeBand),
            "theme" => Ok(PackageCategory::Theme),
            "genre" => Ok(PackageCategory::Genre),
            other => Err(AppError::validation("category", format!("unknown package category '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_packages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub age_min: Option<i32>,

    pub age_max: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub icon: Option<String>,

    /// Soft delete flag
    pub is_active: bool,

    pub created_by: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A missing bound places no constraint on that side
    pub fn admits_age(&self, age: i32) -> bool {
        self.age_min.map_or(true, |min| age >= min) && self.age_max.map_or(true, |max| age <= max)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::package_item::Entity")]
    Items,
}

impl Related<super::package_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

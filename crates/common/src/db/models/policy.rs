//! Policy entity: the allow/deny decision for a (kid, title) pair

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "policies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kid_profile_id: i32,

    pub title_id: i32,

    pub is_allowed: bool,

    /// Package whose application created this row
    #[sea_orm(indexed)]
    pub source_package_id: Option<i32>,

    /// Set once a parent touches a package-sourced policy directly
    pub manually_modified: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether unapplying `package_id` may remove this policy
    pub fn owned_by_package(&self, package_id: i32) -> bool {
        self.source_package_id == Some(package_id) && !self.manually_modified
    }
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
        belongs_to = "super::title::Entity",
        from = "Column::TitleId",
        to = "super::title::Column::Id"
    )]
    Title,

    #[sea_orm(
        belongs_to = "super::content_package::Entity",
        from = "Column::SourcePackageId",
        to = "super::content_package::Column::Id"
    )]
    SourcePackage,
}

impl Related<super::kid_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KidProfile.def()
    }
}

impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

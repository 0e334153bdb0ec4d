//! Record of a package applied to a kid profile

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kid_profile_id: i32,

    pub package_id: i32,

    pub applied_at: DateTimeWithTimeZone,

    /// Title ids the parent opted out of at apply time
    #[sea_orm(column_type = "Json")]
    pub excluded_title_ids: Json,
}

impl Model {
    pub fn excluded(&self) -> Vec<i32> {
        self.excluded_title_ids
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|v| v.as_i64().and_then(|id| i32::try_from(id).ok()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_excluded(&self, title_id: i32) -> bool {
        self.excluded().contains(&title_id)
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
        belongs_to = "super::content_package::Entity",
        from = "Column::PackageId",
        to = "super::content_package::Column::Id"
    )]
    Package,
}

impl Related<super::content_package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Package.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

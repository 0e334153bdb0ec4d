//! Paired launcher device

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identifier the device presents in `X-Device-ID`
    #[sea_orm(unique)]
    pub public_id: Uuid,

    #[sea_orm(indexed)]
    pub parent_id: i32,

    pub kid_profile_id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// SHA-256 of the API key (never store plaintext)
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub api_key_hash: String,

    pub created_at: DateTimeWithTimeZone,

    pub last_active: Option<DateTimeWithTimeZone>,
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
}

impl ActiveModelBehavior for ActiveModel {}

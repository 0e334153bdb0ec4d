//! Kid profile entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kid_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning parent account (issued by the identity service)
    #[sea_orm(indexed)]
    pub parent_id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub age: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Screen-time limits, kid-specific or family-wide

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_limits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub parent_id: i32,

    /// NULL for the family-wide record
    pub kid_profile_id: Option<i32>,

    pub daily_limit_minutes: Option<i32>,

    /// "HH:MM", 24h
    #[sea_orm(column_type = "Text", nullable)]
    pub bedtime_start: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bedtime_end: Option<String>,

    pub schedule_enabled: bool,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

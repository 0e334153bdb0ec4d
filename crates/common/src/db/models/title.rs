//! Catalog title entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Catalog provider reference (TMDB id)
    #[sea_orm(column_type = "Text", unique)]
    pub external_ref: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// "movie" or "tv"
    #[sea_orm(column_type = "Text")]
    pub media_type: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub rating: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub poster_ref: Option<String>,

    /// Streaming service ids the title is available on
    #[sea_orm(column_type = "Json")]
    pub providers: Json,

    /// Registered deep links keyed by provider id
    #[sea_orm(column_type = "Json")]
    pub deep_links: Json,

    pub last_synced: DateTimeWithTimeZone,
}

impl Model {
    /// Provider ids as strings, ignoring malformed entries
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers
            .as_array()
            .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    /// Registered deep link for a provider, if any
    pub fn deep_link_for(&self, provider: &str) -> Option<String> {
        self.deep_links
            .get(provider)
            .and_then(|v| v.as_str())
            .filter(|link| !link.is_empty())
            .map(String::from)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

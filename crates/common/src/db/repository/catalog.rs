//! Catalog writes used by ingest, the scraper pipeline and report approval

use super::{find_tag, find_title, Repository};
use crate::catalog::{validate_services, validate_slug, MediaType, TagCategory};
use crate::db::models::*;
use crate::errors::{AppError, Resource, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

/// A title as delivered by the catalog service
#[derive(Debug, Clone, Deserialize)]
pub struct TitleInput {
    pub external_ref: String,
    pub name: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub poster_ref: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    /// Deep links keyed by provider id
    #[serde(default)]
    pub deep_links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeInput {
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub category: TagCategory,
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn check_title_input(input: &TitleInput) -> Result<()> {
    if input.external_ref.trim().is_empty() {
        return Err(AppError::validation("external_ref", "external_ref cannot be empty"));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::validation("name", "name cannot be empty"));
    }
    validate_services(&input.providers)
}

async fn find_title_by_ref<C>(conn: &C, external_ref: &str) -> Result<Option<Title>>
where
    C: ConnectionTrait,
{
    TitleEntity::find()
        .filter(TitleColumn::ExternalRef.eq(external_ref))
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn insert_title<C>(conn: &C, input: TitleInput) -> Result<Title>
where
    C: ConnectionTrait,
{
    TitleActiveModel {
        external_ref: Set(input.external_ref),
        name: Set(input.name),
        media_type: Set(input.media_type.as_str().to_string()),
        rating: Set(input.rating),
        poster_ref: Set(input.poster_ref),
        providers: Set(serde_json::to_value(&input.providers)?),
        deep_links: Set(serde_json::to_value(&input.deep_links)?),
        last_synced: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Insert or refresh a title inside an open transaction
pub(crate) async fn upsert_title_in<C>(conn: &C, input: TitleInput) -> Result<Title>
where
    C: ConnectionTrait,
{
    check_title_input(&input)?;

    let Some(title) = find_title_by_ref(conn, &input.external_ref).await? else {
        return insert_title(conn, input).await;
    };

    let mut active: TitleActiveModel = title.into();
    active.name = Set(input.name);
    active.media_type = Set(input.media_type.as_str().to_string());
    active.rating = Set(input.rating);
    active.poster_ref = Set(input.poster_ref);
    active.providers = Set(serde_json::to_value(&input.providers)?);
    active.deep_links = Set(serde_json::to_value(&input.deep_links)?);
    active.last_synced = Set(chrono::Utc::now().into());
    active.update(conn).await.map_err(Into::into)
}

/// Resolve a title by external reference, inserting it only when unknown.
/// A known title is returned as stored; other families launch from it.
pub(crate) async fn register_title_in<C>(conn: &C, input: TitleInput) -> Result<Title>
where
    C: ConnectionTrait,
{
    check_title_input(&input)?;

    match find_title_by_ref(conn, &input.external_ref).await? {
        Some(title) => Ok(title),
        None => insert_title(conn, input).await,
    }
}

/// Idempotently tag a title; returns whether a new association was made
pub(crate) async fn attach_title_tag_in<C>(conn: &C, title_id: i32, tag_id: i32, source: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = TitleTagEntity::find()
        .filter(TitleTagColumn::TitleId.eq(title_id))
        .filter(TitleTagColumn::TagId.eq(tag_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    TitleTagActiveModel {
        title_id: Set(title_id),
        tag_id: Set(tag_id),
        source: Set(source.to_string()),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(true)
}

/// Idempotently tag an episode; returns whether a new association was made
pub(crate) async fn attach_episode_tag_in<C>(conn: &C, episode_id: i32, tag_id: i32, source: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = EpisodeTagEntity::find()
        .filter(EpisodeTagColumn::EpisodeId.eq(episode_id))
        .filter(EpisodeTagColumn::TagId.eq(tag_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    EpisodeTagActiveModel {
        episode_id: Set(episode_id),
        tag_id: Set(tag_id),
        source: Set(source.to_string()),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(true)
}

impl Repository {
    // ========================================================================
    // Title Operations
    // ========================================================================

    /// Insert or refresh a title keyed by its external reference
    pub async fn upsert_title(&self, input: TitleInput) -> Result<Title> {
        let txn = self.write_conn().begin().await?;
        let title = upsert_title_in(&txn, input).await?;
        txn.commit().await?;

        info!(title_id = title.id, external_ref = %title.external_ref, "Title upserted");
        Ok(title)
    }

    /// Find title by ID
    pub async fn get_title(&self, title_id: i32) -> Result<Title> {
        find_title(self.read_conn(), title_id).await
    }

    // ========================================================================
    // Episode Operations
    // ========================================================================

    /// Add an episode, or rename it if (season, episode) already exists
    pub async fn add_episode(&self, title_id: i32, input: EpisodeInput) -> Result<Episode> {
        if input.season_number < 0 || input.episode_number < 0 {
            return Err(AppError::validation(
                "season_number",
                "season and episode numbers must be non-negative",
            ));
        }

        let txn = self.write_conn().begin().await?;
        find_title(&txn, title_id).await?;

        let existing = EpisodeEntity::find()
            .filter(EpisodeColumn::TitleId.eq(title_id))
            .filter(EpisodeColumn::SeasonNumber.eq(input.season_number))
            .filter(EpisodeColumn::EpisodeNumber.eq(input.episode_number))
            .one(&txn)
            .await?;

        let episode = match existing {
            Some(episode) => {
                let mut active: EpisodeActiveModel = episode.into();
                active.name = Set(input.name);
                active.update(&txn).await?
            }
            None => {
                EpisodeActiveModel {
                    title_id: Set(title_id),
                    season_number: Set(input.season_number),
                    episode_number: Set(input.episode_number),
                    name: Set(input.name),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        Ok(episode)
    }

    /// A title's episodes in broadcast order
    pub async fn list_episodes(&self, title_id: i32) -> Result<Vec<Episode>> {
        find_title(self.read_conn(), title_id).await?;
        EpisodeEntity::find()
            .filter(EpisodeColumn::TitleId.eq(title_id))
            .order_by_asc(EpisodeColumn::SeasonNumber)
            .order_by_asc(EpisodeColumn::EpisodeNumber)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Tag Operations
    // ========================================================================

    /// Create a content tag; slugs are unique
    pub async fn create_tag(&self, input: TagInput) -> Result<ContentTag> {
        validate_slug(&input.slug)?;
        if input.display_name.trim().is_empty() {
            return Err(AppError::validation("display_name", "display_name cannot be empty"));
        }

        let txn = self.write_conn().begin().await?;

        let clash = ContentTagEntity::find()
            .filter(ContentTagColumn::Slug.eq(input.slug.as_str()))
            .one(&txn)
            .await?;
        if clash.is_some() {
            return Err(AppError::Duplicate {
                message: format!("tag slug '{}' already exists", input.slug),
            });
        }

        let tag = ContentTagActiveModel {
            category: Set(input.category.as_str().to_string()),
            slug: Set(input.slug),
            display_name: Set(input.display_name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(tag_id = tag.id, slug = %tag.slug, "Content tag created");
        Ok(tag)
    }

    /// List tags, optionally restricted to one category
    pub async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<ContentTag>> {
        let mut query = ContentTagEntity::find();
        if let Some(category) = category {
            query = query.filter(ContentTagColumn::Category.eq(category.as_str()));
        }
        query
            .order_by_asc(ContentTagColumn::Category)
            .order_by_asc(ContentTagColumn::DisplayName)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Associate a tag with a whole title
    pub async fn attach_title_tag(&self, title_id: i32, tag_id: i32, source: &str) -> Result<bool> {
        let txn = self.write_conn().begin().await?;
        find_title(&txn, title_id).await?;
        find_tag(&txn, tag_id).await?;
        let created = attach_title_tag_in(&txn, title_id, tag_id, source).await?;
        txn.commit().await?;

        if created {
            info!(title_id, tag_id, source, "Title tagged");
        }
        Ok(created)
    }

    /// Associate a tag with one episode
    pub async fn attach_episode_tag(&self, episode_id: i32, tag_id: i32, source: &str) -> Result<bool> {
        let txn = self.write_conn().begin().await?;
        EpisodeEntity::find_by_id(episode_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Episode, episode_id))?;
        find_tag(&txn, tag_id).await?;
        let created = attach_episode_tag_in(&txn, episode_id, tag_id, source).await?;
        txn.commit().await?;

        if created {
            info!(episode_id, tag_id, source, "Episode tagged");
        }
        Ok(created)
    }

    /// Tags asserted on a title as a whole
    pub async fn title_tags(&self, title_id: i32) -> Result<Vec<ContentTag>> {
        let conn = self.read_conn();
        find_title(conn, title_id).await?;

        let tag_ids: Vec<i32> = TitleTagEntity::find()
            .select_only()
            .column(TitleTagColumn::TagId)
            .filter(TitleTagColumn::TitleId.eq(title_id))
            .into_tuple()
            .all(conn)
            .await?;

        ContentTagEntity::find()
            .filter(ContentTagColumn::Id.is_in(tag_ids))
            .order_by_asc(ContentTagColumn::Slug)
            .all(conn)
            .await
            .map_err(Into::into)
    }
}

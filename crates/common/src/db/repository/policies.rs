//! Policy store: per-(kid, title) decisions and per-episode overrides

use super::catalog::{register_title_in, TitleInput};
use super::{duplicate_on_conflict, ensure_kid_owned, ensure_policy_owned, find_kid, find_tag, find_title, Repository};
use crate::catalog::ServiceSelection;
use crate::db::models::*;
use crate::errors::{AppError, Resource, Result};
use crate::metrics;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Parent request to allow or deny a title for a kid.
/// The title is named by id, or by catalog metadata that is upserted first.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPolicyInput {
    pub kid_profile_id: i32,
    #[serde(default)]
    pub title_id: Option<i32>,
    #[serde(default)]
    pub title: Option<TitleInput>,
    pub is_allowed: bool,
}

/// A policy joined with the display and launch metadata of its title
#[derive(Debug, Clone, Serialize)]
pub struct PolicyWithTitle {
    pub policy_id: i32,
    pub title_id: i32,
    pub title: String,
    pub media_type: String,
    pub poster_ref: Option<String>,
    pub is_allowed: bool,
    pub source_package_id: Option<i32>,
    pub providers: Vec<String>,
    pub deep_links: serde_json::Value,
}

/// A launcher tile
#[derive(Debug, Clone, Serialize)]
pub struct AllowedTitle {
    pub id: i32,
    pub title: String,
    pub media_type: String,
    pub poster_ref: Option<String>,
    pub rating: Option<String>,
    pub providers: Vec<String>,
}

/// An episode annotated with its current block state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeState {
    pub episode_id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockOutcome {
    /// Episodes that went from unblocked to blocked
    pub blocked_count: usize,
    pub already_blocked_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleStatus {
    pub title_id: i32,
    pub kid_profile_id: i32,
    pub is_allowed: bool,
    pub has_policy: bool,
}

/// Existing policy for a (kid, title) pair
pub(crate) async fn find_policy<C>(conn: &C, kid_profile_id: i32, title_id: i32) -> Result<Option<Policy>>
where
    C: ConnectionTrait,
{
    PolicyEntity::find()
        .filter(PolicyColumn::KidProfileId.eq(kid_profile_id))
        .filter(PolicyColumn::TitleId.eq(title_id))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Title ids a kid already has any policy for
pub(crate) async fn policy_title_ids<C>(conn: &C, kid_profile_id: i32) -> Result<Vec<i32>>
where
    C: ConnectionTrait,
{
    PolicyEntity::find()
        .select_only()
        .column(PolicyColumn::TitleId)
        .filter(PolicyColumn::KidProfileId.eq(kid_profile_id))
        .into_tuple()
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Insert an allow policy on behalf of a package
pub(crate) async fn insert_package_policy<C>(
    conn: &C,
    kid_profile_id: i32,
    title_id: i32,
    package_id: i32,
) -> Result<Policy>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    PolicyActiveModel {
        kid_profile_id: Set(kid_profile_id),
        title_id: Set(title_id),
        is_allowed: Set(true),
        source_package_id: Set(Some(package_id)),
        manually_modified: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Apply a direct parent edit. Package-sourced policies lose their provenance claim.
async fn write_direct<C>(conn: &C, policy: Policy, is_allowed: bool) -> Result<Policy>
where
    C: ConnectionTrait,
{
    let touched_package_policy = policy.source_package_id.is_some();
    let manually_modified = policy.manually_modified || touched_package_policy;

    let mut active: PolicyActiveModel = policy.into();
    active.is_allowed = Set(is_allowed);
    active.manually_modified = Set(manually_modified);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await.map_err(Into::into)
}

/// Episodes of `title_id` that carry `tag_id`
async fn tagged_episodes<C>(conn: &C, title_id: i32, tag_id: i32) -> Result<Vec<Episode>>
where
    C: ConnectionTrait,
{
    let episode_ids: Vec<i32> = EpisodeTagEntity::find()
        .select_only()
        .column(EpisodeTagColumn::EpisodeId)
        .filter(EpisodeTagColumn::TagId.eq(tag_id))
        .into_tuple()
        .all(conn)
        .await?;

    EpisodeEntity::find()
        .filter(EpisodeColumn::TitleId.eq(title_id))
        .filter(EpisodeColumn::Id.is_in(episode_ids))
        .order_by_asc(EpisodeColumn::SeasonNumber)
        .order_by_asc(EpisodeColumn::EpisodeNumber)
        .all(conn)
        .await
        .map_err(Into::into)
}

async fn overrides_by_episode<C>(conn: &C, policy_id: i32) -> Result<HashMap<i32, EpisodePolicy>>
where
    C: ConnectionTrait,
{
    let overrides = EpisodePolicyEntity::find()
        .filter(EpisodePolicyColumn::PolicyId.eq(policy_id))
        .all(conn)
        .await?;
    Ok(overrides.into_iter().map(|o| (o.episode_id, o)).collect())
}

fn annotate(episodes: Vec<Episode>, overrides: &HashMap<i32, EpisodePolicy>) -> Vec<EpisodeState> {
    episodes
        .into_iter()
        .map(|e| EpisodeState {
            is_blocked: overrides.get(&e.id).is_some_and(|o| o.is_blocked),
            episode_id: e.id,
            season_number: e.season_number,
            episode_number: e.episode_number,
            name: e.name,
        })
        .collect()
}

impl Repository {
    // ========================================================================
    // Policy Operations
    // ========================================================================

    /// Upsert the policy for a (kid, title) pair
    pub async fn set_policy(&self, parent_id: i32, input: SetPolicyInput) -> Result<Policy> {
        let txn = self.write_conn().begin().await?;
        ensure_kid_owned(&txn, parent_id, input.kid_profile_id).await?;

        let title_id = match (input.title_id, input.title) {
            (Some(title_id), _) => find_title(&txn, title_id).await?.id,
            (None, Some(metadata)) => register_title_in(&txn, metadata).await?.id,
            (None, None) => {
                return Err(AppError::MissingField { field: "title_id".to_string() });
            }
        };

        let policy = match find_policy(&txn, input.kid_profile_id, title_id).await? {
            Some(existing) => write_direct(&txn, existing, input.is_allowed).await?,
            None => {
                let now = Utc::now();
                PolicyActiveModel {
                    kid_profile_id: Set(input.kid_profile_id),
                    title_id: Set(title_id),
                    is_allowed: Set(input.is_allowed),
                    source_package_id: Set(None),
                    manually_modified: Set(false),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| {
                    duplicate_on_conflict(e, || {
                        format!("kid profile {} already has a policy for title {}", input.kid_profile_id, title_id)
                    })
                })?
            }
        };

        txn.commit().await?;

        metrics::record_policy_write("direct", 1);
        info!(
            policy_id = policy.id,
            kid_profile_id = policy.kid_profile_id,
            title_id = policy.title_id,
            is_allowed = policy.is_allowed,
            "Policy set"
        );
        Ok(policy)
    }

    /// Toggle an existing policy by id
    pub async fn update_policy(&self, parent_id: i32, policy_id: i32, is_allowed: bool) -> Result<Policy> {
        let txn = self.write_conn().begin().await?;
        let policy = ensure_policy_owned(&txn, parent_id, policy_id).await?;
        let policy = write_direct(&txn, policy, is_allowed).await?;
        txn.commit().await?;

        metrics::record_policy_write("direct", 1);
        info!(policy_id, is_allowed, "Policy updated");
        Ok(policy)
    }

    /// All policies of a kid with their title metadata
    pub async fn list_policies(&self, parent_id: i32, kid_profile_id: i32) -> Result<Vec<PolicyWithTitle>> {
        let conn = self.read_conn();
        ensure_kid_owned(conn, parent_id, kid_profile_id).await?;

        let rows = PolicyEntity::find()
            .filter(PolicyColumn::KidProfileId.eq(kid_profile_id))
            .find_also_related(TitleEntity)
            .order_by_asc(PolicyColumn::Id)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(policy, title)| {
                let title = title?;
                Some(PolicyWithTitle {
                    policy_id: policy.id,
                    title_id: title.id,
                    providers: title.provider_ids(),
                    title: title.name,
                    media_type: title.media_type,
                    poster_ref: title.poster_ref,
                    is_allowed: policy.is_allowed,
                    source_package_id: policy.source_package_id,
                    deep_links: title.deep_links,
                })
            })
            .collect())
    }

    /// Allowed titles for a kid, restricted to the selected services
    pub async fn list_allowed_titles(
        &self,
        kid_profile_id: i32,
        selection: &ServiceSelection,
    ) -> Result<Vec<AllowedTitle>> {
        let rows = PolicyEntity::find()
            .filter(PolicyColumn::KidProfileId.eq(kid_profile_id))
            .filter(PolicyColumn::IsAllowed.eq(true))
            .find_also_related(TitleEntity)
            .order_by_asc(PolicyColumn::Id)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, title)| title)
            .filter(|title| selection.admits(&title.provider_ids()))
            .map(|title| AllowedTitle {
                id: title.id,
                providers: title.provider_ids(),
                title: title.name,
                media_type: title.media_type,
                poster_ref: title.poster_ref,
                rating: title.rating,
            })
            .collect())
    }

    /// Launcher listing: the kid's allowed titles filtered by the family's service selection.
    /// `owner` is the calling parent, or `None` for the kid's own session.
    pub async fn launcher_titles(&self, owner: Option<i32>, kid_profile_id: i32) -> Result<Vec<AllowedTitle>> {
        let kid = match owner {
            Some(parent_id) => ensure_kid_owned(self.read_conn(), parent_id, kid_profile_id).await?,
            None => find_kid(self.read_conn(), kid_profile_id).await?,
        };
        let selection = self.get_service_selection(kid.parent_id).await?;
        self.list_allowed_titles(kid.id, &selection).await
    }

    /// Delete a policy together with its episode overrides
    pub async fn delete_policy(&self, parent_id: i32, policy_id: i32) -> Result<()> {
        let txn = self.write_conn().begin().await?;
        ensure_policy_owned(&txn, parent_id, policy_id).await?;

        let overrides = EpisodePolicyEntity::delete_many()
            .filter(EpisodePolicyColumn::PolicyId.eq(policy_id))
            .exec(&txn)
            .await?;
        PolicyEntity::delete_by_id(policy_id).exec(&txn).await?;

        txn.commit().await?;

        info!(policy_id, overrides_removed = overrides.rows_affected, "Policy deleted");
        Ok(())
    }

    /// Whether a kid may see a title, without launching it
    pub async fn title_status(&self, owner: Option<i32>, kid_profile_id: i32, title_id: i32) -> Result<TitleStatus> {
        let conn = self.read_conn();
        match owner {
            Some(parent_id) => ensure_kid_owned(conn, parent_id, kid_profile_id).await?,
            None => find_kid(conn, kid_profile_id).await?,
        };
        find_title(conn, title_id).await?;

        let policy = find_policy(conn, kid_profile_id, title_id).await?;
        Ok(TitleStatus {
            title_id,
            kid_profile_id,
            is_allowed: policy.as_ref().is_some_and(|p| p.is_allowed),
            has_policy: policy.is_some(),
        })
    }

    // ========================================================================
    // Episode Override Operations
    // ========================================================================

    /// Upsert the override for one episode of a policy's title
    pub async fn set_episode_override(
        &self,
        parent_id: i32,
        policy_id: i32,
        episode_id: i32,
        is_blocked: bool,
    ) -> Result<EpisodePolicy> {
        let txn = self.write_conn().begin().await?;
        let policy = ensure_policy_owned(&txn, parent_id, policy_id).await?;

        let episode = EpisodeEntity::find_by_id(episode_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Episode, episode_id))?;
        if episode.title_id != policy.title_id {
            return Err(AppError::validation(
                "episode_id",
                format!("episode {} does not belong to title {}", episode_id, policy.title_id),
            ));
        }

        let existing = EpisodePolicyEntity::find()
            .filter(EpisodePolicyColumn::PolicyId.eq(policy_id))
            .filter(EpisodePolicyColumn::EpisodeId.eq(episode_id))
            .one(&txn)
            .await?;

        let now = Utc::now();
        let row = match existing {
            Some(row) => {
                let mut active: EpisodePolicyActiveModel = row.into();
                active.is_blocked = Set(is_blocked);
                active.updated_at = Set(now.into());
                active.update(&txn).await?
            }
            None => {
                EpisodePolicyActiveModel {
                    policy_id: Set(policy_id),
                    episode_id: Set(episode_id),
                    is_blocked: Set(is_blocked),
                    updated_at: Set(now.into()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| {
                    duplicate_on_conflict(e, || {
                        format!("policy {} already has an override for episode {}", policy_id, episode_id)
                    })
                })?
            }
        };

        txn.commit().await?;

        info!(policy_id, episode_id, is_blocked, "Episode override set");
        Ok(row)
    }

    /// Every episode of the policy's title with its block state
    pub async fn list_policy_episodes(&self, parent_id: i32, policy_id: i32) -> Result<Vec<EpisodeState>> {
        let conn = self.read_conn();
        let policy = ensure_policy_owned(conn, parent_id, policy_id).await?;

        let episodes = EpisodeEntity::find()
            .filter(EpisodeColumn::TitleId.eq(policy.title_id))
            .order_by_asc(EpisodeColumn::SeasonNumber)
            .order_by_asc(EpisodeColumn::EpisodeNumber)
            .all(conn)
            .await?;
        let overrides = overrides_by_episode(conn, policy_id).await?;

        Ok(annotate(episodes, &overrides))
    }

    /// Preview of a block-by-tag action
    pub async fn list_episodes_by_tag(&self, parent_id: i32, policy_id: i32, tag_id: i32) -> Result<Vec<EpisodeState>> {
        let conn = self.read_conn();
        let policy = ensure_policy_owned(conn, parent_id, policy_id).await?;
        find_tag(conn, tag_id).await?;

        let episodes = tagged_episodes(conn, policy.title_id, tag_id).await?;
        let overrides = overrides_by_episode(conn, policy_id).await?;

        Ok(annotate(episodes, &overrides))
    }

    /// Block every episode of the policy's title that carries the tag. Never unblocks.
    pub async fn block_episodes_by_tag(&self, parent_id: i32, policy_id: i32, tag_id: i32) -> Result<BlockOutcome> {
        let txn = self.write_conn().begin().await?;
        let policy = ensure_policy_owned(&txn, parent_id, policy_id).await?;
        find_tag(&txn, tag_id).await?;

        let episodes = tagged_episodes(&txn, policy.title_id, tag_id).await?;
        let mut overrides = overrides_by_episode(&txn, policy_id).await?;
        let now = Utc::now();

        let mut outcome = BlockOutcome { blocked_count: 0, already_blocked_count: 0 };
        for episode in episodes {
            match overrides.remove(&episode.id) {
                Some(row) if row.is_blocked => outcome.already_blocked_count += 1,
                Some(row) => {
                    let mut active: EpisodePolicyActiveModel = row.into();
                    active.is_blocked = Set(true);
                    active.updated_at = Set(now.into());
                    active.update(&txn).await?;
                    outcome.blocked_count += 1;
                }
                None => {
                    EpisodePolicyActiveModel {
                        policy_id: Set(policy_id),
                        episode_id: Set(episode.id),
                        is_blocked: Set(true),
                        updated_at: Set(now.into()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    outcome.blocked_count += 1;
                }
            }
        }

        txn.commit().await?;

        metrics::record_episodes_blocked(outcome.blocked_count);
        info!(
            policy_id,
            tag_id,
            blocked = outcome.blocked_count,
            already_blocked = outcome.already_blocked_count,
            "Episodes blocked by tag"
        );
        Ok(outcome)
    }
}

//! Launch checks: gathers the facts for a launch attempt and decides

use super::policies::find_policy;
use super::usage::{effective_limits, used_on};
use super::{ensure_kid_owned, find_kid, find_title, Repository};
use crate::access::launch::{authorize, LaunchDecision, LaunchFacts, LinkRequest};
use crate::db::models::*;
use crate::errors::{AppError, Resource, Result};
use crate::metrics;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::info;

/// How a launch names the episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeRef {
    Id(i32),
    Position { season_number: i32, episode_number: i32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchRequest {
    pub kid_profile_id: i32,
    pub title_id: i32,
    pub provider: String,
    #[serde(default)]
    pub episode_id: Option<i32>,
    #[serde(default)]
    pub season_number: Option<i32>,
    #[serde(default)]
    pub episode_number: Option<i32>,
}

impl LaunchRequest {
    /// The episode being launched, if the request names one
    pub fn episode_ref(&self) -> Result<Option<EpisodeRef>> {
        match (self.episode_id, self.season_number, self.episode_number) {
            (Some(id), _, _) => Ok(Some(EpisodeRef::Id(id))),
            (None, Some(season_number), Some(episode_number)) => Ok(Some(EpisodeRef::Position {
                season_number,
                episode_number,
            })),
            (None, None, None) => Ok(None),
            _ => Err(AppError::validation(
                "episode_number",
                "season_number and episode_number must be given together",
            )),
        }
    }
}

/// An id that names no episode of the title carries no override, so it
/// resolves to `None`. A (season, episode) pair must exist.
async fn resolve_episode<C>(conn: &C, title_id: i32, episode: EpisodeRef) -> Result<Option<Episode>>
where
    C: ConnectionTrait,
{
    match episode {
        EpisodeRef::Id(id) => Ok(EpisodeEntity::find_by_id(id)
            .one(conn)
            .await?
            .filter(|e| e.title_id == title_id)),
        EpisodeRef::Position { season_number, episode_number } => EpisodeEntity::find()
            .filter(EpisodeColumn::TitleId.eq(title_id))
            .filter(EpisodeColumn::SeasonNumber.eq(season_number))
            .filter(EpisodeColumn::EpisodeNumber.eq(episode_number))
            .one(conn)
            .await?
            .map(Some)
            .ok_or_else(|| {
                AppError::not_found(
                    Resource::Episode,
                    format!("S{}E{} of title {}", season_number, episode_number, title_id),
                )
            }),
    }
}

async fn episode_blocked<C>(conn: &C, policy: Option<&Policy>, episode: Option<&Episode>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let (Some(policy), Some(episode)) = (policy, episode) else {
        return Ok(false);
    };
    let row = EpisodePolicyEntity::find()
        .filter(EpisodePolicyColumn::PolicyId.eq(policy.id))
        .filter(EpisodePolicyColumn::EpisodeId.eq(episode.id))
        .one(conn)
        .await?;
    Ok(row.is_some_and(|r| r.is_blocked))
}

impl Repository {
    // ========================================================================
    // Launch Check
    // ========================================================================

    /// Decide a launch attempt made at `at`.
    /// `owner` is the calling parent, or `None` for the kid's own session.
    pub async fn check_launch(&self, owner: Option<i32>, request: &LaunchRequest, at: DateTime<Utc>) -> Result<LaunchDecision> {
        let conn = self.write_conn();
        let kid = match owner {
            Some(parent_id) => ensure_kid_owned(conn, parent_id, request.kid_profile_id).await?,
            None => find_kid(conn, request.kid_profile_id).await?,
        };
        let title = find_title(conn, request.title_id).await?;

        let policy = find_policy(conn, kid.id, title.id).await?;

        // a denied or unpolicied title is decided without looking at the episode
        let episode = match policy.as_ref().filter(|p| p.is_allowed) {
            Some(_) => match request.episode_ref()? {
                Some(episode) => resolve_episode(conn, title.id, episode).await?,
                None => None,
            },
            None => None,
        };
        let episode_blocked = episode_blocked(conn, policy.as_ref(), episode.as_ref()).await?;

        let limits = effective_limits(conn, &kid).await?;
        let local = self.launch_config().local_time(at);
        let used_today_minutes = used_on(conn, kid.id, local.date()).await?;

        let facts = LaunchFacts {
            title_allowed: policy.as_ref().map(|p| p.is_allowed),
            episode_blocked,
            bedtime: limits.bedtime()?,
            daily_limit_minutes: limits.daily_limit_minutes,
            local_time: local.time(),
            used_today_minutes,
        };

        let provider = request.provider.to_lowercase();
        let registered = title.deep_link_for(&provider);
        let link = LinkRequest {
            provider: &provider,
            registered: registered.as_deref(),
            external_ref: &title.external_ref,
            title_name: &title.name,
            default_fallback: &self.launch_config().default_fallback_url,
        };

        let decision = authorize(&facts, &link);

        metrics::record_launch(&decision);
        info!(
            kid_profile_id = kid.id,
            title_id = title.id,
            episode_id = ?episode.as_ref().map(|e| e.id),
            provider = %provider,
            allowed = decision.is_allowed(),
            reason = decision.reason().map(|r| r.as_str()).unwrap_or("none"),
            "Launch checked"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(episode_id: Option<i32>, season: Option<i32>, episode: Option<i32>) -> LaunchRequest {
        LaunchRequest {
            kid_profile_id: 1,
            title_id: 42,
            provider: "netflix".into(),
            episode_id,
            season_number: season,
            episode_number: episode,
        }
    }

    #[test]
    fn test_episode_ref_forms() {
        assert_eq!(request(None, None, None).episode_ref().unwrap(), None);
        assert_eq!(request(Some(7), None, None).episode_ref().unwrap(), Some(EpisodeRef::Id(7)));
        assert_eq!(
            request(None, Some(2), Some(5)).episode_ref().unwrap(),
            Some(EpisodeRef::Position { season_number: 2, episode_number: 5 })
        );
        assert!(request(None, Some(2), None).episode_ref().is_err());
        assert!(request(None, None, Some(5)).episode_ref().is_err());
    }
}

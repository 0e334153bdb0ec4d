//! Shared fixtures for store-level tests.
//!
//! Every test gets its own in-memory SQLite database built from the
//! entity-derived schema. The pool holds a single connection so the
//! database lives as long as the repository.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use safeview_common::catalog::{MediaType, TagCategory};
use safeview_common::config::LaunchConfig;
use safeview_common::db::models::{ContentTag, Episode, KidProfile, Policy, Title};
use safeview_common::db::{schema, DbPool, EpisodeInput, Repository, SetPolicyInput, TagInput, TitleInput};
use sea_orm::{ConnectOptions, Database};
use std::collections::BTreeMap;

pub const PARENT: i32 = 1;
pub const OTHER_PARENT: i32 = 2;
pub const ADMIN: i32 = 99;

/// Fresh repository over an empty in-memory database
pub async fn setup_repo() -> Repository {
    setup_repo_with(LaunchConfig::default()).await
}

pub async fn setup_repo_with(launch: LaunchConfig) -> Repository {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .expect("Failed to open in-memory database");
    schema::migrate(&conn).await.expect("Failed to create schema");

    Repository::new(DbPool::from_connection(conn), launch)
}

/// Fixed test day, household clock at UTC
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

/// An instant on the test day
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
        .single()
        .expect("valid time")
}

pub async fn kid(repo: &Repository, parent_id: i32, name: &str, age: i32) -> KidProfile {
    repo.create_kid_profile(parent_id, name, age)
        .await
        .expect("Failed to create kid profile")
}

pub fn title_input(external_ref: &str, name: &str, providers: &[&str]) -> TitleInput {
    TitleInput {
        external_ref: external_ref.to_string(),
        name: name.to_string(),
        media_type: MediaType::Tv,
        rating: Some("TV-Y".to_string()),
        poster_ref: None,
        providers: providers.iter().map(|p| p.to_string()).collect(),
        deep_links: BTreeMap::new(),
    }
}

pub async fn title(repo: &Repository, external_ref: &str, name: &str) -> Title {
    repo.upsert_title(title_input(external_ref, name, &["netflix"]))
        .await
        .expect("Failed to upsert title")
}

/// A series with one season of `count` episodes
pub async fn series(repo: &Repository, external_ref: &str, name: &str, count: i32) -> (Title, Vec<Episode>) {
    let title = title(repo, external_ref, name).await;
    let mut episodes = Vec::new();
    for n in 1..=count {
        let episode = repo
            .add_episode(
                title.id,
                EpisodeInput {
                    season_number: 1,
                    episode_number: n,
                    name: format!("{} episode {}", name, n),
                },
            )
            .await
            .expect("Failed to add episode");
        episodes.push(episode);
    }
    (title, episodes)
}

/// Several plain titles
pub async fn titles(repo: &Repository, count: usize) -> Vec<Title> {
    let mut out = Vec::new();
    for n in 0..count {
        out.push(title(repo, &format!("tmdb-{}", 1000 + n), &format!("Show {}", n)).await);
    }
    out
}

pub async fn tag(repo: &Repository, slug: &str) -> ContentTag {
    repo.create_tag(TagInput {
        category: TagCategory::Creatures,
        slug: slug.to_string(),
        display_name: slug.replace('_', " "),
        description: None,
    })
    .await
    .expect("Failed to create tag")
}

pub async fn allow(repo: &Repository, kid: &KidProfile, title_id: i32, is_allowed: bool) -> Policy {
    repo.set_policy(
        kid.parent_id,
        SetPolicyInput {
            kid_profile_id: kid.id,
            title_id: Some(title_id),
            title: None,
            is_allowed,
        },
    )
    .await
    .expect("Failed to set policy")
}

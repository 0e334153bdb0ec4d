//! Kid profiles, catalog records, tags and service selection.

mod helpers;

use helpers::*;
use safeview_common::catalog::{MediaType, TagCategory};
use safeview_common::db::{EpisodeInput, TagInput};
use safeview_common::AppError;

#[tokio::test]
async fn test_kid_profiles_are_scoped_to_parent() {
    let repo = setup_repo().await;
    let ada = kid(&repo, PARENT, "  Ada ", 6).await;
    assert_eq!(ada.name, "Ada");
    kid(&repo, PARENT, "Bo", 10).await;
    kid(&repo, OTHER_PARENT, "Cy", 4).await;

    let mine = repo.list_kid_profiles(PARENT).await.unwrap();
    assert_eq!(mine.len(), 2);

    let err = repo.get_kid_profile(OTHER_PARENT, ada.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
    let err = repo.get_kid_profile(PARENT, 404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    for (name, age) in [("", 5), ("Old", 18), ("Negative", -1)] {
        let err = repo.create_kid_profile(PARENT, name, age).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "accepted {} / {}", name, age);
    }
}

#[tokio::test]
async fn test_title_upsert_by_external_ref() {
    let repo = setup_repo().await;
    let first = title(&repo, "603", "Bluey").await;

    let mut refreshed = title_input("603", "Bluey (2018)", &["disney_plus"]);
    refreshed.media_type = MediaType::Tv;
    let second = repo.upsert_title(refreshed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Bluey (2018)");
    assert_eq!(second.provider_ids(), vec!["disney_plus"]);

    let err = repo.upsert_title(title_input("604", "Bad", &["betamax"])).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = repo.get_title(404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_episodes_upsert_by_position() {
    let repo = setup_repo().await;
    let (t, episodes) = series(&repo, "82728", "Bluey", 2).await;

    let renamed = repo
        .add_episode(t.id, EpisodeInput { season_number: 1, episode_number: 2, name: "Hospital".into() })
        .await
        .unwrap();
    assert_eq!(renamed.id, episodes[1].id);

    repo.add_episode(t.id, EpisodeInput { season_number: 2, episode_number: 1, name: "Dance Mode".into() })
        .await
        .unwrap();
    let listed = repo.list_episodes(t.id).await.unwrap();
    let positions: Vec<(i32, i32)> = listed.iter().map(|e| (e.season_number, e.episode_number)).collect();
    assert_eq!(positions, vec![(1, 1), (1, 2), (2, 1)]);

    let err = repo
        .add_episode(404, EpisodeInput { season_number: 1, episode_number: 1, name: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_tags_have_unique_valid_slugs() {
    let repo = setup_repo().await;
    tag(&repo, "spiders").await;

    let err = repo
        .create_tag(TagInput {
            category: TagCategory::Creatures,
            slug: "spiders".into(),
            display_name: "Spiders again".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate { .. }));

    let err = repo
        .create_tag(TagInput {
            category: TagCategory::Visuals,
            slug: "Jump-Scares".into(),
            display_name: "Jump scares".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    repo.create_tag(TagInput {
        category: TagCategory::DeathLoss,
        slug: "parent_death".into(),
        display_name: "Death of a parent".into(),
        description: Some("A parent character dies on screen".into()),
    })
    .await
    .unwrap();

    assert_eq!(repo.list_tags(None).await.unwrap().len(), 2);
    let creatures = repo.list_tags(Some(TagCategory::Creatures)).await.unwrap();
    assert_eq!(creatures.len(), 1);
    assert_eq!(creatures[0].tag_category().unwrap(), TagCategory::Creatures);
}

#[tokio::test]
async fn test_service_selection_roundtrip() {
    let repo = setup_repo().await;
    assert!(repo.get_service_selection(PARENT).await.unwrap().selected_services.is_empty());

    let saved = repo
        .set_service_selection(PARENT, vec!["netflix".into(), "hulu".into(), "netflix".into()])
        .await
        .unwrap();
    assert_eq!(saved.selected_services, vec!["netflix", "hulu"]);
    assert_eq!(repo.get_service_selection(PARENT).await.unwrap(), saved);

    let err = repo.set_service_selection(PARENT, vec!["crunchyroll".into()]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(repo.get_service_selection(PARENT).await.unwrap(), saved);

    // clearing the selection removes the filter
    repo.set_service_selection(PARENT, vec![]).await.unwrap();
    assert!(repo.get_service_selection(PARENT).await.unwrap().selected_services.is_empty());
}

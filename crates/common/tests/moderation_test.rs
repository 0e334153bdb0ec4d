//! Content report moderation: filing, review transitions and tag application.

mod helpers;

use helpers::*;
use safeview_common::access::ReviewAction;
use safeview_common::db::models::ReportStatus;
use safeview_common::db::ReportInput;
use safeview_common::AppError;

const REPORTER: i32 = PARENT;

fn report_input(title_id: i32, tag_id: i32) -> ReportInput {
    ReportInput {
        title_id,
        tag_id,
        season_number: None,
        episode_number: None,
        notes: Some("spider jump scare near the end".into()),
    }
}

#[tokio::test]
async fn test_approval_tags_title_once() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;

    let report = repo.create_report(REPORTER, report_input(t.id, spiders.id)).await.unwrap();
    assert_eq!(report.report_status().unwrap(), ReportStatus::Pending);

    let approved = repo.approve_report(ADMIN, report.id).await.expect("Failed to approve report");
    assert_eq!(approved.report_status().unwrap(), ReportStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(ADMIN));
    assert!(approved.reviewed_at.is_some());

    let tags = repo.title_tags(t.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].slug, "spiders");

    // terminal: a second approval changes nothing
    let err = repo.approve_report(ADMIN, report.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    let err = repo.reject_report(ADMIN, report.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    assert_eq!(repo.title_tags(t.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejection_is_terminal_and_untagged() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;
    let report = repo.create_report(REPORTER, report_input(t.id, spiders.id)).await.unwrap();

    let rejected = repo.reject_report(ADMIN, report.id).await.unwrap();
    assert_eq!(rejected.report_status().unwrap(), ReportStatus::Rejected);
    assert!(repo.title_tags(t.id).await.unwrap().is_empty());

    let err = repo.approve_report(ADMIN, report.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    assert!(repo.title_tags(t.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reporter_cannot_review_own_report() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;
    let report = repo.create_report(ADMIN, report_input(t.id, spiders.id)).await.unwrap();

    let err = repo.approve_report(ADMIN, report.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));

    let pending = repo.list_reports(Some(ReportStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 1);

    let err = repo.approve_report(ADMIN, 4040).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_episode_report_tags_the_episode() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 7).await;
    let (t, episodes) = series(&repo, "1399", "Monster Show", 3).await;
    let spiders = tag(&repo, "spiders").await;
    let policy = allow(&repo, &k, t.id, true).await;

    let mut input = report_input(t.id, spiders.id);
    input.season_number = Some(1);
    input.episode_number = Some(2);
    let report = repo.create_report(REPORTER, input).await.unwrap();
    repo.approve_report(ADMIN, report.id).await.unwrap();

    assert!(repo.title_tags(t.id).await.unwrap().is_empty());
    let tagged = repo.list_episodes_by_tag(PARENT, policy.id, spiders.id).await.unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].episode_id, episodes[1].id);

    // the new tag feeds block-by-tag straight away
    let outcome = repo.block_episodes_by_tag(PARENT, policy.id, spiders.id).await.unwrap();
    assert_eq!(outcome.blocked_count, 1);
}

#[tokio::test]
async fn test_unknown_episode_falls_back_to_title() {
    let repo = setup_repo().await;
    let (t, _) = series(&repo, "1399", "Monster Show", 1).await;
    let spiders = tag(&repo, "spiders").await;

    let mut input = report_input(t.id, spiders.id);
    input.season_number = Some(9);
    input.episode_number = Some(9);
    let report = repo.create_report(REPORTER, input).await.unwrap();
    repo.approve_report(ADMIN, report.id).await.unwrap();

    let tags = repo.title_tags(t.id).await.unwrap();
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn test_existing_association_is_not_duplicated() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;
    assert!(repo.attach_title_tag(t.id, spiders.id, "scraper").await.unwrap());

    let first = repo.create_report(REPORTER, report_input(t.id, spiders.id)).await.unwrap();
    let second = repo.create_report(OTHER_PARENT, report_input(t.id, spiders.id)).await.unwrap();
    repo.approve_report(ADMIN, first.id).await.unwrap();
    repo.approve_report(ADMIN, second.id).await.unwrap();

    assert_eq!(repo.title_tags(t.id).await.unwrap().len(), 1);
    assert!(!repo.attach_title_tag(t.id, spiders.id, "scraper").await.unwrap());
}

#[tokio::test]
async fn test_report_input_checks() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;

    let mut input = report_input(t.id, spiders.id);
    input.episode_number = Some(3);
    let err = repo.create_report(REPORTER, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = repo.create_report(REPORTER, report_input(404, spiders.id)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = repo.create_report(REPORTER, report_input(t.id, 404)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let mut blank = report_input(t.id, spiders.id);
    blank.notes = Some("   ".into());
    let report = repo.create_report(REPORTER, blank).await.unwrap();
    assert_eq!(report.notes, None);

    assert_eq!(repo.list_reports(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_reviews_have_one_winner() {
    let repo = setup_repo().await;
    let t = title(&repo, "1399", "Monster Show").await;
    let spiders = tag(&repo, "spiders").await;
    let report = repo.create_report(REPORTER, report_input(t.id, spiders.id)).await.unwrap();

    let (a, b) = tokio::join!(
        repo.review_report(ADMIN, report.id, ReviewAction::Approve),
        repo.review_report(OTHER_PARENT, report.id, ReviewAction::Reject),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, AppError::InvalidTransition { .. }));

    let stored = repo.list_reports(None).await.unwrap();
    let status = stored[0].report_status().unwrap();
    assert!(status.is_terminal());
    let expected_tags = usize::from(status == ReportStatus::Approved);
    assert_eq!(repo.title_tags(t.id).await.unwrap().len(), expected_tags);
}

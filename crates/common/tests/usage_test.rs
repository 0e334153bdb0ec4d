//! Time limits, device pairing and the usage ledger.

mod helpers;

use helpers::*;
use safeview_common::access::TimeLimits;
use safeview_common::config::LaunchConfig;
use safeview_common::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_usage_sums_across_devices() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;
    let tablet = repo.register_device(PARENT, k.id, "Tablet").await.unwrap().device;
    let tv = repo.register_device(PARENT, k.id, "Living room TV").await.unwrap().device;

    assert_eq!(repo.record_usage(&tablet, 20, at(9, 0)).await.unwrap(), 20);
    assert_eq!(repo.record_usage(&tablet, 15, at(11, 0)).await.unwrap(), 35);
    assert_eq!(repo.record_usage(&tv, 10, at(17, 0)).await.unwrap(), 10);

    let used = repo.get_usage(Some(PARENT), k.id, today()).await.unwrap();
    assert_eq!(used, 45);

    // a zero delta is a heartbeat and changes nothing
    assert_eq!(repo.record_usage(&tv, 0, at(18, 0)).await.unwrap(), 10);

    let err = repo.record_usage(&tv, -5, at(18, 0)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(repo.get_usage(None, k.id, today()).await.unwrap(), 45);
}

#[tokio::test]
async fn test_remaining_floors_at_zero() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;
    let tablet = repo.register_device(PARENT, k.id, "Tablet").await.unwrap().device;

    // unlimited until a limit is set
    assert_eq!(repo.remaining(None, k.id, at(9, 0)).await.unwrap(), None);

    repo.set_time_limits(PARENT, Some(k.id), TimeLimits { daily_limit_minutes: Some(30), ..Default::default() })
        .await
        .unwrap();
    repo.record_usage(&tablet, 20, at(9, 0)).await.unwrap();
    assert_eq!(repo.remaining(None, k.id, at(9, 30)).await.unwrap(), Some(10));

    repo.record_usage(&tablet, 25, at(10, 0)).await.unwrap();
    let summary = repo.usage_summary(Some(PARENT), k.id, today()).await.unwrap();
    assert_eq!(summary.used_minutes, 45);
    assert_eq!(summary.daily_limit_minutes, Some(30));
    assert_eq!(summary.remaining_minutes, Some(0));
}

#[tokio::test]
async fn test_usage_day_follows_household_clock() {
    // UTC+10: 15:00 UTC is already 01:00 the next local day
    let repo = setup_repo_with(LaunchConfig { utc_offset_minutes: 600, ..LaunchConfig::default() }).await;
    let k = kid(&repo, PARENT, "Ada", 6).await;
    let tablet = repo.register_device(PARENT, k.id, "Tablet").await.unwrap().device;

    repo.record_usage(&tablet, 10, at(9, 0)).await.unwrap();
    repo.record_usage(&tablet, 5, at(15, 0)).await.unwrap();

    let tomorrow = today().succ_opt().unwrap();
    assert_eq!(repo.get_usage(None, k.id, today()).await.unwrap(), 10);
    assert_eq!(repo.get_usage(None, k.id, tomorrow).await.unwrap(), 5);
}

#[tokio::test]
async fn test_device_authentication() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;
    let registration = repo.register_device(PARENT, k.id, "Tablet").await.unwrap();
    assert!(registration.api_key.starts_with("dk_"));
    assert_ne!(registration.device.api_key_hash, registration.api_key);

    let device = repo
        .authenticate_device(registration.device.public_id, &registration.api_key)
        .await
        .expect("Failed to authenticate device");
    assert_eq!(device.kid_profile_id, k.id);
    assert!(device.last_active.is_some());

    let err = repo.authenticate_device(registration.device.public_id, "dk_wrong").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidApiKey));

    let err = repo.authenticate_device(Uuid::new_v4(), &registration.api_key).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidApiKey));

    let devices = repo.list_devices(PARENT).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert!(repo.list_devices(OTHER_PARENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_device_registration_checks() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;

    let err = repo.register_device(PARENT, k.id, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = repo.register_device(OTHER_PARENT, k.id, "Tablet").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
}

#[tokio::test]
async fn test_time_limit_validation() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;

    let cases = [
        TimeLimits { daily_limit_minutes: Some(-1), ..Default::default() },
        TimeLimits { bedtime_start: Some("8pm".into()), bedtime_end: Some("07:00".into()), ..Default::default() },
        TimeLimits { bedtime_start: Some("24:00".into()), bedtime_end: Some("07:00".into()), ..Default::default() },
        TimeLimits { bedtime_start: Some("20:00".into()), bedtime_end: None, ..Default::default() },
    ];
    for limits in cases {
        let err = repo.set_time_limits(PARENT, Some(k.id), limits.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "accepted {:?}", limits);
    }

    // nothing was stored
    let stored = repo.get_time_limits(Some(PARENT), Some(k.id)).await.unwrap();
    assert_eq!(stored, TimeLimits::default());
}

#[tokio::test]
async fn test_kid_limits_override_family_limits() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;
    let sibling = kid(&repo, PARENT, "Bo", 10).await;

    let family = TimeLimits { daily_limit_minutes: Some(60), ..Default::default() };
    repo.set_time_limits(PARENT, None, family.clone()).await.unwrap();
    let own = TimeLimits { daily_limit_minutes: Some(120), ..Default::default() };
    repo.set_time_limits(PARENT, Some(sibling.id), own.clone()).await.unwrap();

    assert_eq!(repo.get_time_limits(Some(PARENT), None).await.unwrap(), family);
    assert_eq!(repo.get_time_limits(Some(PARENT), Some(k.id)).await.unwrap(), family);
    assert_eq!(repo.get_time_limits(None, Some(sibling.id)).await.unwrap(), own);

    // updating replaces the record in place
    let relaxed = TimeLimits { daily_limit_minutes: None, ..Default::default() };
    repo.set_time_limits(PARENT, Some(sibling.id), relaxed.clone()).await.unwrap();
    assert_eq!(repo.get_time_limits(Some(PARENT), Some(sibling.id)).await.unwrap(), relaxed);

    let err = repo.get_time_limits(Some(OTHER_PARENT), Some(k.id)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
    let err = repo.get_time_limits(None, None).await.unwrap_err();
    assert!(matches!(err, AppError::MissingField { .. }));
}

#[tokio::test]
async fn test_usage_is_private_to_owner() {
    let repo = setup_repo().await;
    let k = kid(&repo, PARENT, "Ada", 6).await;

    let err = repo.get_usage(Some(OTHER_PARENT), k.id, today()).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));

    let err = repo.usage_summary(None, 404, today()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

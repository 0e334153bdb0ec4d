//! Content report review rules

use crate::db::models::{ContentReport, ReportStatus};
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn target_status(&self) -> ReportStatus {
        match self {
            ReviewAction::Approve => ReportStatus::Approved,
            ReviewAction::Reject => ReportStatus::Rejected,
        }
    }
}

/// Where an approved report's tag lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
    Episode(i32),
    Title(i32),
}

/// An episode number only makes sense within a season
pub fn validate_report_position(season_number: Option<i32>, episode_number: Option<i32>) -> Result<()> {
    if episode_number.is_some() && season_number.is_none() {
        return Err(AppError::validation(
            "season_number",
            "episode_number requires season_number",
        ));
    }
    if season_number.is_some_and(|s| s < 0) || episode_number.is_some_and(|e| e < 0) {
        return Err(AppError::validation("season_number", "season and episode must be non-negative"));
    }
    Ok(())
}

/// Check that `reviewer_id` may move `report` out of pending
pub fn check_review(report: &ContentReport, reviewer_id: i32, action: ReviewAction) -> Result<ReportStatus> {
    if report.reported_by == reviewer_id {
        return Err(AppError::forbidden("Reporters cannot review their own reports"));
    }

    let current = report.report_status()?;
    if current.is_terminal() {
        return Err(AppError::invalid_transition(format!("report {} is already {}", report.id, current.as_str())));
    }

    Ok(action.target_status())
}

/// An approval tags the episode when the report resolves to one, otherwise the whole title
pub fn tag_target(title_id: i32, resolved_episode: Option<i32>) -> TagTarget {
    match resolved_episode {
        Some(episode_id) => TagTarget::Episode(episode_id),
        None => TagTarget::Title(title_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(status: ReportStatus) -> ContentReport {
        ContentReport {
            id: 9,
            title_id: 42,
            tag_id: 3,
            season_number: None,
            episode_number: None,
            notes: None,
            status: status.as_str().to_string(),
            reported_by: 100,
            reviewed_by: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    #[test]
    fn test_pending_can_be_reviewed() {
        let r = report(ReportStatus::Pending);
        assert_eq!(check_review(&r, 1, ReviewAction::Approve).unwrap(), ReportStatus::Approved);
        assert_eq!(check_review(&r, 1, ReviewAction::Reject).unwrap(), ReportStatus::Rejected);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for status in [ReportStatus::Approved, ReportStatus::Rejected] {
            for action in [ReviewAction::Approve, ReviewAction::Reject] {
                let err = check_review(&report(status), 1, action).unwrap_err();
                assert!(matches!(err, AppError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_self_review_forbidden() {
        let err = check_review(&report(ReportStatus::Pending), 100, ReviewAction::Approve).unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn test_report_position() {
        assert!(validate_report_position(None, None).is_ok());
        assert!(validate_report_position(Some(1), None).is_ok());
        assert!(validate_report_position(Some(1), Some(4)).is_ok());
        assert!(validate_report_position(None, Some(4)).is_err());
    }

    #[test]
    fn test_tag_target() {
        assert_eq!(tag_target(42, Some(7)), TagTarget::Episode(7));
        assert_eq!(tag_target(42, None), TagTarget::Title(42));
    }
}

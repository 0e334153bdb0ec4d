//! Package application rules

use crate::db::models::ContentPackage;
use crate::errors::{AppError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of matching a package's members against a kid's policies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyPlan {
    /// Titles that get a new allow policy
    pub create: Vec<i32>,
    /// Titles the kid already has a policy for
    pub skipped: Vec<i32>,
    /// Titles the parent opted out of
    pub excluded: Vec<i32>,
}

impl ApplyPlan {
    pub fn created_count(&self) -> usize {
        self.create.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Existing policies are never overwritten, whatever their value
pub fn plan_application(
    members: &[i32],
    excluded: &HashSet<i32>,
    existing_policies: &HashSet<i32>,
) -> ApplyPlan {
    let mut plan = ApplyPlan::default();
    let mut seen = HashSet::new();

    for &title_id in members {
        if !seen.insert(title_id) {
            continue;
        }
        if excluded.contains(&title_id) {
            plan.excluded.push(title_id);
        } else if existing_policies.contains(&title_id) {
            plan.skipped.push(title_id);
        } else {
            plan.create.push(title_id);
        }
    }

    plan
}

/// Active packages whose age band admits `kid_age` (all active ones when no age is given)
pub fn available_for_age(packages: Vec<ContentPackage>, kid_age: Option<i32>) -> Vec<ContentPackage> {
    packages
        .into_iter()
        .filter(|p| p.is_active)
        .filter(|p| kid_age.map_or(true, |age| p.admits_age(age)))
        .collect()
}

/// Titles that should be offered to a kid as new package members
pub fn update_candidates(
    new_members: &[i32],
    excluded: &HashSet<i32>,
    existing_policies: &HashSet<i32>,
    already_offered: &HashSet<i32>,
) -> Vec<i32> {
    let mut seen = HashSet::new();
    new_members
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .filter(|id| {
            !excluded.contains(id) && !existing_policies.contains(id) && !already_offered.contains(id)
        })
        .collect()
}

/// Field checks shared by package create and update
pub fn validate_package_fields(name: Option<&str>, age_min: Option<i32>, age_max: Option<i32>) -> Result<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(AppError::validation("name", "package name cannot be empty"));
        }
    }
    for (field, age) in [("age_min", age_min), ("age_max", age_max)] {
        if age.is_some_and(|a| a < 0) {
            return Err(AppError::validation(field, "age cannot be negative"));
        }
    }
    if let (Some(min), Some(max)) = (age_min, age_max) {
        if min > max {
            return Err(AppError::validation("age_min", "age_min must not exceed age_max"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn set(ids: &[i32]) -> HashSet<i32> {
        ids.iter().copied().collect()
    }

    fn package(id: i32, age_min: Option<i32>, age_max: Option<i32>, is_active: bool) -> ContentPackage {
        let now = Utc::now().into();
        ContentPackage {
            id,
            name: format!("package {}", id),
            description: None,
            age_min,
            age_max,
            category: "theme".into(),
            icon: None,
            is_active,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_skip_on_existing() {
        let plan = plan_application(&[1, 2, 3, 4, 5], &set(&[]), &set(&[2, 4]));
        assert_eq!(plan.create, vec![1, 3, 5]);
        assert_eq!(plan.skipped, vec![2, 4]);
        assert_eq!(plan.created_count(), 3);
        assert_eq!(plan.skipped_count(), 2);
    }

    #[test]
    fn test_exclusions_win_over_everything() {
        let plan = plan_application(&[1, 2, 3], &set(&[1, 2]), &set(&[2]));
        assert_eq!(plan.excluded, vec![1, 2]);
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.create, vec![3]);
    }

    #[test]
    fn test_duplicate_members_counted_once() {
        let plan = plan_application(&[7, 7, 8], &set(&[]), &set(&[]));
        assert_eq!(plan.create, vec![7, 8]);
    }

    #[test]
    fn test_available_for_age() {
        let packages = vec![
            package(1, Some(2), Some(5), true),
            package(2, Some(6), None, true),
            package(3, None, None, false),
            package(4, None, None, true),
        ];

        let ids = |v: Vec<ContentPackage>| v.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(available_for_age(packages.clone(), Some(4))), vec![1, 4]);
        assert_eq!(ids(available_for_age(packages.clone(), Some(9))), vec![2, 4]);
        assert_eq!(ids(available_for_age(packages, None)), vec![1, 2, 4]);
    }

    #[test]
    fn test_update_candidates() {
        let offered = update_candidates(&[10, 11, 12, 13, 13], &set(&[10]), &set(&[11]), &set(&[12]));
        assert_eq!(offered, vec![13]);
    }

    #[test]
    fn test_package_field_validation() {
        assert!(validate_package_fields(Some("Calm Shows"), Some(3), Some(7)).is_ok());
        assert!(validate_package_fields(Some("  "), None, None).is_err());
        assert!(validate_package_fields(None, Some(8), Some(4)).is_err());
        assert!(validate_package_fields(None, Some(-1), None).is_err());
    }
}

//! Screen-time limits and bedtime windows

use crate::db::models::TimeLimit;
use crate::errors::{AppError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Limits as configured by a parent. Wire names follow the launcher app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLimits {
    /// `None` means unlimited
    pub daily_limit_minutes: Option<i32>,
    pub bedtime_start: Option<String>,
    pub bedtime_end: Option<String>,
    /// Bedtime bounds are stored but not enforced while this is off
    #[serde(default)]
    pub schedule_enabled: bool,
}

/// Parse a strict 24h `HH:MM` clock value
pub fn parse_clock(field: &str, value: &str) -> Result<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(AppError::validation(field, format!("'{}' is not in HH:MM format", value)));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::validation(field, format!("'{}' is not a valid 24h time", value)))
}

impl TimeLimits {
    /// Reject malformed limits before anything is written
    pub fn validate(&self) -> Result<()> {
        if let Some(minutes) = self.daily_limit_minutes {
            if minutes < 0 {
                return Err(AppError::validation(
                    "dailyLimitMinutes",
                    "daily limit cannot be negative",
                ));
            }
        }

        match (&self.bedtime_start, &self.bedtime_end) {
            (Some(start), Some(end)) => {
                parse_clock("bedtimeStart", start)?;
                parse_clock("bedtimeEnd", end)?;
            }
            (None, None) => {}
            _ => {
                return Err(AppError::validation(
                    "bedtimeStart",
                    "bedtime start and end must be set together",
                ))
            }
        }

        Ok(())
    }

    /// The enforced bedtime window, if any
    pub fn bedtime(&self) -> Result<Option<BedtimeWindow>> {
        if !self.schedule_enabled {
            return Ok(None);
        }
        match (&self.bedtime_start, &self.bedtime_end) {
            (Some(start), Some(end)) => Ok(Some(BedtimeWindow {
                start: parse_clock("bedtimeStart", start)?,
                end: parse_clock("bedtimeEnd", end)?,
            })),
            _ => Ok(None),
        }
    }

    /// Minutes left today, floored at zero; `None` when unlimited
    pub fn remaining(&self, used_minutes: i32) -> Option<i32> {
        remaining(self.daily_limit_minutes, used_minutes)
    }
}

impl From<&TimeLimit> for TimeLimits {
    fn from(record: &TimeLimit) -> Self {
        Self {
            daily_limit_minutes: record.daily_limit_minutes,
            bedtime_start: record.bedtime_start.clone(),
            bedtime_end: record.bedtime_end.clone(),
            schedule_enabled: record.schedule_enabled,
        }
    }
}

pub fn remaining(daily_limit_minutes: Option<i32>, used_minutes: i32) -> Option<i32> {
    daily_limit_minutes.map(|limit| (limit - used_minutes).max(0))
}

/// Half-open `[start, end)` window on the local clock.
/// `end < start` wraps past midnight; `start == end` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BedtimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BedtimeWindow {
    pub fn contains(&self, at: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= at && at < self.end
        } else {
            at >= self.start || at < self.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: &str, end: &str) -> BedtimeWindow {
        TimeLimits {
            daily_limit_minutes: None,
            bedtime_start: Some(start.into()),
            bedtime_end: Some(end.into()),
            schedule_enabled: true,
        }
        .bedtime()
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_wrapping_window() {
        let w = window("22:00", "06:00");
        assert!(w.contains(t(23, 30)));
        assert!(w.contains(t(5, 0)));
        assert!(w.contains(t(22, 0)));
        assert!(!w.contains(t(6, 0)));
        assert!(!w.contains(t(12, 0)));
    }

    #[test]
    fn test_same_day_window() {
        let w = window("13:00", "15:00");
        assert!(w.contains(t(13, 0)));
        assert!(w.contains(t(14, 59)));
        assert!(!w.contains(t(15, 0)));
        assert!(!w.contains(t(9, 0)));
    }

    #[test]
    fn test_empty_window() {
        let w = window("20:00", "20:00");
        assert!(!w.contains(t(20, 0)));
        assert!(!w.contains(t(3, 0)));
    }

    #[test]
    fn test_schedule_disabled_ignores_bedtime() {
        let limits = TimeLimits {
            daily_limit_minutes: Some(30),
            bedtime_start: Some("20:00".into()),
            bedtime_end: Some("07:00".into()),
            schedule_enabled: false,
        };
        assert_eq!(limits.bedtime().unwrap(), None);
    }

    #[test]
    fn test_validation() {
        let negative = TimeLimits { daily_limit_minutes: Some(-5), ..Default::default() };
        assert!(negative.validate().is_err());

        let half = TimeLimits { bedtime_start: Some("21:00".into()), ..Default::default() };
        assert!(half.validate().is_err());

        let sloppy = TimeLimits {
            bedtime_start: Some("9:00".into()),
            bedtime_end: Some("07:00".into()),
            ..Default::default()
        };
        assert!(sloppy.validate().is_err());

        let bad_hour = TimeLimits {
            bedtime_start: Some("25:00".into()),
            bedtime_end: Some("07:00".into()),
            ..Default::default()
        };
        assert!(bad_hour.validate().is_err());

        let ok = TimeLimits {
            daily_limit_minutes: Some(0),
            bedtime_start: Some("21:30".into()),
            bedtime_end: Some("07:00".into()),
            schedule_enabled: true,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_remaining_floors_at_zero() {
        assert_eq!(remaining(Some(60), 45), Some(15));
        assert_eq!(remaining(Some(60), 90), Some(0));
        assert_eq!(remaining(None, 500), None);
    }
}

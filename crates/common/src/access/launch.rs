//! Launch authorization
//!
//! Every launch attempt ends in exactly one decision. The checks run in a
//! fixed order: title policy, episode override, bedtime, daily limit.

use crate::access::limits::BedtimeWindow;
use crate::catalog::{provider_fallback_url, provider_template_link};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a launch was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    TitleNotAllowed,
    EpisodeBlocked,
    Bedtime,
    DailyLimitReached,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::TitleNotAllowed => "title not allowed",
            DenyReason::EpisodeBlocked => "episode blocked",
            DenyReason::Bedtime => "bedtime",
            DenyReason::DailyLimitReached => "daily limit reached",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the decision depends on, gathered by the store
#[derive(Debug, Clone)]
pub struct LaunchFacts {
    /// `is_allowed` of the (kid, title) policy; `None` when no policy exists
    pub title_allowed: Option<bool>,
    /// Whether the requested episode carries a blocking override
    pub episode_blocked: bool,
    pub bedtime: Option<BedtimeWindow>,
    pub daily_limit_minutes: Option<i32>,
    /// Household-local wall clock at the time of the attempt
    pub local_time: NaiveTime,
    /// Minutes used today across all of the kid's devices
    pub used_today_minutes: i32,
}

/// Where an allowed launch should go
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchTarget {
    pub deep_link: String,
    pub fallback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchDecision {
    Allow(LaunchTarget),
    Deny(DenyReason),
}

impl LaunchDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LaunchDecision::Allow(_))
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            LaunchDecision::Allow(_) => None,
            LaunchDecision::Deny(reason) => Some(*reason),
        }
    }
}

/// Run the checks in order and return the first refusal, if any
pub fn check(facts: &LaunchFacts) -> Option<DenyReason> {
    if facts.title_allowed != Some(true) {
        return Some(DenyReason::TitleNotAllowed);
    }
    if facts.episode_blocked {
        return Some(DenyReason::EpisodeBlocked);
    }
    if facts.bedtime.is_some_and(|w| w.contains(facts.local_time)) {
        return Some(DenyReason::Bedtime);
    }
    if facts
        .daily_limit_minutes
        .is_some_and(|limit| facts.used_today_minutes >= limit)
    {
        return Some(DenyReason::DailyLimitReached);
    }
    None
}

/// Title-side inputs to link resolution
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest<'a> {
    pub provider: &'a str,
    /// Deep link registered on the title for this provider
    pub registered: Option<&'a str>,
    pub external_ref: &'a str,
    pub title_name: &'a str,
    pub default_fallback: &'a str,
}

/// Registered link, then provider template, then provider home, then the default
pub fn resolve_link(req: &LinkRequest<'_>) -> LaunchTarget {
    let fallback_url = provider_fallback_url(req.provider)
        .map(String::from)
        .unwrap_or_else(|| req.default_fallback.to_string());

    let deep_link = req
        .registered
        .filter(|link| !link.is_empty())
        .map(String::from)
        .or_else(|| provider_template_link(req.provider, req.external_ref, req.title_name))
        .unwrap_or_else(|| fallback_url.clone());

    LaunchTarget { deep_link, fallback_url }
}

/// The full decision: the checks, then a link on success
pub fn authorize(facts: &LaunchFacts, link: &LinkRequest<'_>) -> LaunchDecision {
    match check(facts) {
        Some(reason) => LaunchDecision::Deny(reason),
        None => LaunchDecision::Allow(resolve_link(link)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn allowed() -> LaunchFacts {
        LaunchFacts {
            title_allowed: Some(true),
            episode_blocked: false,
            bedtime: None,
            daily_limit_minutes: None,
            local_time: t(12, 0),
            used_today_minutes: 0,
        }
    }

    fn link<'a>(provider: &'a str, registered: Option<&'a str>) -> LinkRequest<'a> {
        LinkRequest {
            provider,
            registered,
            external_ref: "82728",
            title_name: "Bluey",
            default_fallback: "https://google.com",
        }
    }

    #[test]
    fn test_no_policy_denies() {
        let facts = LaunchFacts { title_allowed: None, ..allowed() };
        assert_eq!(check(&facts), Some(DenyReason::TitleNotAllowed));
    }

    #[test]
    fn test_denial_is_absolute() {
        // a disallowed title stays denied whatever the episode state
        for episode_blocked in [false, true] {
            let facts = LaunchFacts {
                title_allowed: Some(false),
                episode_blocked,
                ..allowed()
            };
            assert_eq!(check(&facts), Some(DenyReason::TitleNotAllowed));
        }
    }

    #[test]
    fn test_episode_block() {
        let facts = LaunchFacts { episode_blocked: true, ..allowed() };
        assert_eq!(check(&facts), Some(DenyReason::EpisodeBlocked));
    }

    #[test]
    fn test_bedtime_wraparound() {
        let bedtime = Some(BedtimeWindow { start: t(22, 0), end: t(6, 0) });
        for (at, expected) in [
            (t(23, 30), Some(DenyReason::Bedtime)),
            (t(5, 0), Some(DenyReason::Bedtime)),
            (t(12, 0), None),
        ] {
            let facts = LaunchFacts { bedtime, local_time: at, ..allowed() };
            assert_eq!(check(&facts), expected, "at {}", at);
        }
    }

    #[test]
    fn test_daily_limit() {
        let facts = LaunchFacts {
            daily_limit_minutes: Some(60),
            used_today_minutes: 60,
            ..allowed()
        };
        assert_eq!(check(&facts), Some(DenyReason::DailyLimitReached));

        let unlimited = LaunchFacts { daily_limit_minutes: None, ..facts };
        assert_eq!(check(&unlimited), None);
    }

    #[test]
    fn test_check_order() {
        let facts = LaunchFacts {
            episode_blocked: true,
            bedtime: Some(BedtimeWindow { start: t(0, 0), end: t(23, 59) }),
            daily_limit_minutes: Some(0),
            ..allowed()
        };
        assert_eq!(check(&facts), Some(DenyReason::EpisodeBlocked));
    }

    #[test]
    fn test_link_resolution_order() {
        let registered = resolve_link(&link("netflix", Some("https://www.netflix.com/watch/1")));
        assert_eq!(registered.deep_link, "https://www.netflix.com/watch/1");
        assert_eq!(registered.fallback_url, "https://www.netflix.com/");

        let templated = resolve_link(&link("netflix", None));
        assert_eq!(templated.deep_link, "https://www.netflix.com/title/82728");

        let home = resolve_link(&link("hulu", None));
        assert_eq!(home.deep_link, "https://www.hulu.com/");

        let unknown = resolve_link(&link("vudu", None));
        assert_eq!(unknown.deep_link, "https://google.com");
        assert_eq!(unknown.fallback_url, "https://google.com");
    }

    #[test]
    fn test_authorize() {
        let decision = authorize(&allowed(), &link("youtube", None));
        assert!(decision.is_allowed());
        assert_eq!(
            decision,
            LaunchDecision::Allow(LaunchTarget {
                deep_link: "https://www.youtube.com/results?search_query=Bluey".into(),
                fallback_url: "https://www.youtube.com/".into(),
            })
        );

        let denied = authorize(&LaunchFacts { title_allowed: Some(false), ..allowed() }, &link("youtube", None));
        assert_eq!(denied.reason(), Some(DenyReason::TitleNotAllowed));
    }
}

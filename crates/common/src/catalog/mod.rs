//! Catalog reference data
//!
//! Closed taxonomies shared by the store and the gateway: tag categories,
//! media types, the streaming service catalogue and per-provider link rules.

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Maximum slug length accepted at write time
pub const MAX_SLUG_LEN: usize = 64;

/// Content tag category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Creatures,
    Situations,
    DeathLoss,
    Visuals,
    Intensity,
    Social,
    Rating,
    Age,
    ContentWarning,
}

impl TagCategory {
    pub const ALL: [TagCategory; 9] = [
        TagCategory::Creatures,
        TagCategory::Situations,
        TagCategory::DeathLoss,
        TagCategory::Visuals,
        TagCategory::Intensity,
        TagCategory::Social,
        TagCategory::Rating,
        TagCategory::Age,
        TagCategory::ContentWarning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Creatures => "creatures",
            TagCategory::Situations => "situations",
            TagCategory::DeathLoss => "death_loss",
            TagCategory::Visuals => "visuals",
            TagCategory::Intensity => "intensity",
            TagCategory::Social => "social",
            TagCategory::Rating => "rating",
            TagCategory::Age => "age",
            TagCategory::ContentWarning => "content_warning",
        }
    }

    /// Human-readable label shown in moderation and filter screens
    pub fn label(&self) -> &'static str {
        match self {
            TagCategory::Creatures => "Creatures & Characters",
            TagCategory::Situations => "Situations & Themes",
            TagCategory::DeathLoss => "Death & Loss",
            TagCategory::Visuals => "Scary Visuals & Atmosphere",
            TagCategory::Intensity => "Intensity Levels",
            TagCategory::Social => "Social Fears",
            TagCategory::Rating => "Content Ratings",
            TagCategory::Age => "Age Appropriateness",
            TagCategory::ContentWarning => "Content Warnings",
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        TagCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::validation("category", format!("unknown tag category '{}'", s)))
    }
}

/// Catalog media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(AppError::validation("media_type", format!("unknown media type '{}'", other))),
        }
    }
}

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("slug pattern compiles"))
}

/// Check a tag slug: lowercase letters, digits and underscores, starting with a letter
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(AppError::validation(
            "slug",
            format!("slug must be 1-{} characters", MAX_SLUG_LEN),
        ));
    }
    if !slug_pattern().is_match(slug) {
        return Err(AppError::validation(
            "slug",
            format!("slug '{}' may only contain lowercase letters, digits and underscores", slug),
        ));
    }
    Ok(())
}

/// A streaming service a family can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamingService {
    pub id: &'static str,
    pub name: &'static str,
    pub package: &'static str,
}

pub const AVAILABLE_SERVICES: [StreamingService; 7] = [
    StreamingService { id: "netflix", name: "Netflix", package: "com.netflix.mediaclient" },
    StreamingService { id: "disney_plus", name: "Disney+", package: "com.disney.disneyplus" },
    StreamingService { id: "hulu", name: "Hulu", package: "com.hulu.plus" },
    StreamingService { id: "prime_video", name: "Prime Video", package: "com.amazon.avod.thirdpartyclient" },
    StreamingService { id: "max", name: "Max", package: "com.hbo.hbonow" },
    StreamingService { id: "peacock", name: "Peacock", package: "com.peacocktv.peacockandroid" },
    StreamingService { id: "youtube", name: "YouTube", package: "com.google.android.youtube" },
];

pub fn find_service(id: &str) -> Option<&'static StreamingService> {
    AVAILABLE_SERVICES.iter().find(|s| s.id == id)
}

/// Reject service ids outside the fixed catalogue
pub fn validate_services(ids: &[String]) -> Result<()> {
    match ids.iter().find(|id| find_service(id).is_none()) {
        Some(bad) => Err(AppError::validation(
            "selected_services",
            format!("Invalid service ID: {}", bad),
        )),
        None => Ok(()),
    }
}

/// A parent's chosen streaming services, passed explicitly into catalog queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub selected_services: Vec<String>,
}

impl ServiceSelection {
    pub fn new(selected_services: Vec<String>) -> Result<Self> {
        validate_services(&selected_services)?;
        Ok(Self { selected_services })
    }

    /// An empty selection admits everything
    pub fn admits(&self, providers: &[String]) -> bool {
        self.selected_services.is_empty()
            || providers.iter().any(|p| self.selected_services.contains(p))
    }
}

/// Launch target rules for one provider
struct ProviderLinks {
    aliases: &'static [&'static str],
    template: Option<&'static str>,
    fallback: &'static str,
}

const PROVIDER_LINKS: &[ProviderLinks] = &[
    ProviderLinks {
        aliases: &["netflix"],
        template: Some("https://www.netflix.com/title/{ref}"),
        fallback: "https://www.netflix.com/",
    },
    ProviderLinks {
        aliases: &["disney", "disney_plus"],
        template: None,
        fallback: "https://www.disneyplus.com/",
    },
    ProviderLinks {
        aliases: &["prime", "prime_video"],
        template: Some("https://www.amazon.com/gp/video/detail/{ref}"),
        fallback: "https://www.amazon.com/Prime-Video/",
    },
    ProviderLinks {
        aliases: &["hulu"],
        template: None,
        fallback: "https://www.hulu.com/",
    },
    ProviderLinks {
        aliases: &["max"],
        template: None,
        fallback: "https://www.max.com/",
    },
    ProviderLinks {
        aliases: &["peacock"],
        template: None,
        fallback: "https://www.peacocktv.com/",
    },
    ProviderLinks {
        aliases: &["youtube"],
        template: Some("https://www.youtube.com/results?search_query={name}"),
        fallback: "https://www.youtube.com/",
    },
];

fn provider_links(provider: &str) -> Option<&'static ProviderLinks> {
    PROVIDER_LINKS.iter().find(|p| p.aliases.contains(&provider))
}

/// Where a launch for a provider should go when the title has no registered link
pub fn provider_fallback_url(provider: &str) -> Option<&'static str> {
    provider_links(&provider.to_lowercase()).map(|p| p.fallback)
}

/// Build the provider's templated link for a title, if the provider has one.
/// Providers without a title-specific template send the kid to their home page.
pub fn provider_template_link(provider: &str, external_ref: &str, title_name: &str) -> Option<String> {
    let links = provider_links(&provider.to_lowercase())?;
    let link = match links.template {
        Some(template) => template
            .replace("{ref}", external_ref)
            .replace("{name}", &title_name.replace(' ', "+")),
        None => links.fallback.to_string(),
    };
    Some(link)
}

//! Access rules
//!
//! Pure decision logic with no store access. The repository gathers the
//! facts and these modules decide.

pub mod launch;
pub mod limits;
pub mod moderation;
pub mod packages;

pub use launch::{DenyReason, LaunchDecision, LaunchFacts, LaunchTarget};
pub use limits::{BedtimeWindow, TimeLimits};
pub use moderation::{ReviewAction, TagTarget};
pub use packages::ApplyPlan;

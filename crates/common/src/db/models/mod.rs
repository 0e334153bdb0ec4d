//! SeaORM entity models
//!
//! Database entities for Safeview

pub mod kid_profile;
pub mod title;
pub mod episode;
pub mod content_tag;
pub mod title_tag;
pub mod episode_tag;
pub mod content_report;
pub mod policy;
pub mod episode_policy;
pub mod content_package;
pub mod package_item;
pub mod package_application;
pub mod package_update;
pub mod time_limit;
pub mod device;
pub mod usage_entry;
pub mod service_selection;

pub use kid_profile::{
    Entity as KidProfileEntity,
    Model as KidProfile,
    ActiveModel as KidProfileActiveModel,
    Column as KidProfileColumn,
};

pub use title::{
    Entity as TitleEntity,
    Model as Title,
    ActiveModel as TitleActiveModel,
    Column as TitleColumn,
};

pub use episode::{
    Entity as EpisodeEntity,
    Model as Episode,
    ActiveModel as EpisodeActiveModel,
    Column as EpisodeColumn,
};

pub use content_tag::{
    Entity as ContentTagEntity,
    Model as ContentTag,
    ActiveModel as ContentTagActiveModel,
    Column as ContentTagColumn,
};

pub use title_tag::{
    Entity as TitleTagEntity,
    Model as TitleTag,
    ActiveModel as TitleTagActiveModel,
    Column as TitleTagColumn,
};

pub use episode_tag::{
    Entity as EpisodeTagEntity,
    Model as EpisodeTag,
    ActiveModel as EpisodeTagActiveModel,
    Column as EpisodeTagColumn,
};

pub use content_report::{
    Entity as ContentReportEntity,
    Model as ContentReport,
    ActiveModel as ContentReportActiveModel,
    Column as ContentReportColumn,
    ReportStatus,
};

pub use policy::{
    Entity as PolicyEntity,
    Model as Policy,
    ActiveModel as PolicyActiveModel,
    Column as PolicyColumn,
};

pub use episode_policy::{
    Entity as EpisodePolicyEntity,
    Model as EpisodePolicy,
    ActiveModel as EpisodePolicyActiveModel,
    Column as EpisodePolicyColumn,
};

pub use content_package::{
    Entity as ContentPackageEntity,
    Model as ContentPackage,
    ActiveModel as ContentPackageActiveModel,
    Column as ContentPackageColumn,
    PackageCategory,
};

pub use package_item::{
    Entity as PackageItemEntity,
    Model as PackageItem,
    ActiveModel as PackageItemActiveModel,
    Column as PackageItemColumn,
};

pub use package_application::{
    Entity as PackageApplicationEntity,
    Model as PackageApplication,
    ActiveModel as PackageApplicationActiveModel,
    Column as PackageApplicationColumn,
};

pub use package_update::{
    Entity as PackageUpdateEntity,
    Model as PackageUpdate,
    ActiveModel as PackageUpdateActiveModel,
    Column as PackageUpdateColumn,
    UpdateStatus,
};

pub use time_limit::{
    Entity as TimeLimitEntity,
    Model as TimeLimit,
    ActiveModel as TimeLimitActiveModel,
    Column as TimeLimitColumn,
};

pub use device::{
    Entity as DeviceEntity,
    Model as Device,
    ActiveModel as DeviceActiveModel,
    Column as DeviceColumn,
};

pub use usage_entry::{
    Entity as UsageEntryEntity,
    Model as UsageEntry,
    ActiveModel as UsageEntryActiveModel,
    Column as UsageEntryColumn,
};

pub use service_selection::{
    Entity as ServiceSelectionEntity,
    Model as ServiceSelection,
    ActiveModel as ServiceSelectionActiveModel,
    Column as ServiceSelectionColumn,
};

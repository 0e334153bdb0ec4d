//! Schema creation derived from the entity definitions
//!
//! Tables are created in foreign-key order, followed by the composite
//! unique indexes the store relies on for upserts.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, EntityTrait, Schema};
use tracing::info;

async fn create_entity<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();

    let table = schema.create_table_from_entity(entity).if_not_exists().to_owned();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        db.execute(backend.build(index.if_not_exists())).await?;
    }

    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("uq_policies_kid_title")
            .table(PolicyEntity)
            .col(PolicyColumn::KidProfileId)
            .col(PolicyColumn::TitleId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_episode_policies_policy_episode")
            .table(EpisodePolicyEntity)
            .col(EpisodePolicyColumn::PolicyId)
            .col(EpisodePolicyColumn::EpisodeId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_package_items_package_title")
            .table(PackageItemEntity)
            .col(PackageItemColumn::PackageId)
            .col(PackageItemColumn::TitleId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_package_applications_kid_package")
            .table(PackageApplicationEntity)
            .col(PackageApplicationColumn::KidProfileId)
            .col(PackageApplicationColumn::PackageId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_title_tags_title_tag")
            .table(TitleTagEntity)
            .col(TitleTagColumn::TitleId)
            .col(TitleTagColumn::TagId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_episode_tags_episode_tag")
            .table(EpisodeTagEntity)
            .col(EpisodeTagColumn::EpisodeId)
            .col(EpisodeTagColumn::TagId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_usage_entries_device_kid_date")
            .table(UsageEntryEntity)
            .col(UsageEntryColumn::DeviceId)
            .col(UsageEntryColumn::KidProfileId)
            .col(UsageEntryColumn::UsageDate)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Create every table and index that does not exist yet
pub async fn migrate<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_entity(db, &schema, KidProfileEntity).await?;
    create_entity(db, &schema, TitleEntity).await?;
    create_entity(db, &schema, EpisodeEntity).await?;
    create_entity(db, &schema, ContentTagEntity).await?;
    create_entity(db, &schema, TitleTagEntity).await?;
    create_entity(db, &schema, EpisodeTagEntity).await?;
    create_entity(db, &schema, ContentReportEntity).await?;
    create_entity(db, &schema, ContentPackageEntity).await?;
    create_entity(db, &schema, PackageItemEntity).await?;
    create_entity(db, &schema, PolicyEntity).await?;
    create_entity(db, &schema, EpisodePolicyEntity).await?;
    create_entity(db, &schema, PackageApplicationEntity).await?;
    create_entity(db, &schema, PackageUpdateEntity).await?;
    create_entity(db, &schema, TimeLimitEntity).await?;
    create_entity(db, &schema, DeviceEntity).await?;
    create_entity(db, &schema, UsageEntryEntity).await?;
    create_entity(db, &schema, ServiceSelectionEntity).await?;

    for index in unique_indexes() {
        db.execute(backend.build(&index)).await?;
    }

    info!(backend = ?backend, "Schema up to date");
    Ok(())
}

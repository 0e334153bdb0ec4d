//! Per-parent streaming service selection

use super::Repository;
use crate::catalog::ServiceSelection;
use crate::db::models::*;
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use tracing::info;

impl Repository {
    // ========================================================================
    // Service Selection
    // ========================================================================

    /// The parent's selection; an absent record means no filter
    pub async fn get_service_selection(&self, parent_id: i32) -> Result<ServiceSelection> {
        let record = ServiceSelectionEntity::find_by_id(parent_id)
            .one(self.read_conn())
            .await?;

        match record {
            Some(record) => Ok(ServiceSelection {
                selected_services: serde_json::from_value(record.selected_services)?,
            }),
            None => Ok(ServiceSelection::default()),
        }
    }

    /// Replace the parent's selection. Unknown service ids are rejected.
    pub async fn set_service_selection(&self, parent_id: i32, services: Vec<String>) -> Result<ServiceSelection> {
        let mut unique = Vec::with_capacity(services.len());
        for service in services {
            if !unique.contains(&service) {
                unique.push(service);
            }
        }
        let selection = ServiceSelection::new(unique)?;
        let value = serde_json::to_value(&selection.selected_services)?;
        let now = Utc::now();

        let txn = self.write_conn().begin().await?;
        match ServiceSelectionEntity::find_by_id(parent_id).one(&txn).await? {
            Some(record) => {
                let mut active: ServiceSelectionActiveModel = record.into();
                active.selected_services = Set(value);
                active.updated_at = Set(now.into());
                active.update(&txn).await?;
            }
            None => {
                ServiceSelectionActiveModel {
                    parent_id: Set(parent_id),
                    selected_services: Set(value),
                    updated_at: Set(now.into()),
                }
                .insert(&txn)
                .await?;
            }
        }
        txn.commit().await?;

        info!(parent_id, services = ?selection.selected_services, "Service selection saved");
        Ok(selection)
    }
}

//! Time limits, devices and the usage ledger

use super::{ensure_kid_owned, find_kid, Repository};
use crate::access::limits::TimeLimits;
use crate::auth::{generate_api_key, hash_api_key, validate_api_key};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Returned once at pairing; the plaintext key is never stored
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistration {
    pub device: Device,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub kid_profile_id: i32,
    pub date: NaiveDate,
    pub used_minutes: i32,
    pub daily_limit_minutes: Option<i32>,
    pub remaining_minutes: Option<i32>,
}

async fn find_limits_record<C>(conn: &C, parent_id: i32, kid_profile_id: Option<i32>) -> Result<Option<TimeLimit>>
where
    C: ConnectionTrait,
{
    let query = TimeLimitEntity::find().filter(TimeLimitColumn::ParentId.eq(parent_id));
    let query = match kid_profile_id {
        Some(kid_id) => query.filter(TimeLimitColumn::KidProfileId.eq(kid_id)),
        None => query.filter(TimeLimitColumn::KidProfileId.is_null()),
    };
    query.one(conn).await.map_err(Into::into)
}

/// Kid-specific limits, else the family-wide record, else unlimited
pub(crate) async fn effective_limits<C>(conn: &C, kid: &KidProfile) -> Result<TimeLimits>
where
    C: ConnectionTrait,
{
    if let Some(record) = find_limits_record(conn, kid.parent_id, Some(kid.id)).await? {
        return Ok(TimeLimits::from(&record));
    }
    if let Some(record) = find_limits_record(conn, kid.parent_id, None).await? {
        return Ok(TimeLimits::from(&record));
    }
    Ok(TimeLimits::default())
}

/// Minutes used by a kid on a local date, across all devices
pub(crate) async fn used_on<C>(conn: &C, kid_profile_id: i32, date: NaiveDate) -> Result<i32>
where
    C: ConnectionTrait,
{
    let entries = UsageEntryEntity::find()
        .filter(UsageEntryColumn::KidProfileId.eq(kid_profile_id))
        .filter(UsageEntryColumn::UsageDate.eq(date))
        .all(conn)
        .await?;
    Ok(entries.iter().map(|e| e.minutes_used).sum())
}

impl Repository {
    // ========================================================================
    // Time Limit Operations
    // ========================================================================

    /// Limits for a kid (effective, after family fallback) or the family-wide record
    pub async fn get_time_limits(&self, owner: Option<i32>, kid_profile_id: Option<i32>) -> Result<TimeLimits> {
        let conn = self.read_conn();
        match (owner, kid_profile_id) {
            (Some(parent_id), Some(kid_id)) => {
                let kid = ensure_kid_owned(conn, parent_id, kid_id).await?;
                effective_limits(conn, &kid).await
            }
            (None, Some(kid_id)) => {
                let kid = find_kid(conn, kid_id).await?;
                effective_limits(conn, &kid).await
            }
            (Some(parent_id), None) => Ok(find_limits_record(conn, parent_id, None)
                .await?
                .map(|record| TimeLimits::from(&record))
                .unwrap_or_default()),
            (None, None) => Err(AppError::MissingField { field: "kid_profile_id".to_string() }),
        }
    }

    /// Store limits for one kid, or family-wide when `kid_profile_id` is `None`
    pub async fn set_time_limits(
        &self,
        parent_id: i32,
        kid_profile_id: Option<i32>,
        limits: TimeLimits,
    ) -> Result<TimeLimits> {
        limits.validate()?;

        let txn = self.write_conn().begin().await?;
        if let Some(kid_id) = kid_profile_id {
            ensure_kid_owned(&txn, parent_id, kid_id).await?;
        }

        let now = Utc::now();
        let record = match find_limits_record(&txn, parent_id, kid_profile_id).await? {
            Some(record) => {
                let mut active: TimeLimitActiveModel = record.into();
                active.daily_limit_minutes = Set(limits.daily_limit_minutes);
                active.bedtime_start = Set(limits.bedtime_start.clone());
                active.bedtime_end = Set(limits.bedtime_end.clone());
                active.schedule_enabled = Set(limits.schedule_enabled);
                active.updated_at = Set(now.into());
                active.update(&txn).await?
            }
            None => {
                TimeLimitActiveModel {
                    parent_id: Set(parent_id),
                    kid_profile_id: Set(kid_profile_id),
                    daily_limit_minutes: Set(limits.daily_limit_minutes),
                    bedtime_start: Set(limits.bedtime_start.clone()),
                    bedtime_end: Set(limits.bedtime_end.clone()),
                    schedule_enabled: Set(limits.schedule_enabled),
                    updated_at: Set(now.into()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        info!(
            parent_id,
            kid_profile_id = ?kid_profile_id,
            daily_limit_minutes = ?record.daily_limit_minutes,
            schedule_enabled = record.schedule_enabled,
            "Time limits set"
        );
        Ok(TimeLimits::from(&record))
    }

    // ========================================================================
    // Device Operations
    // ========================================================================

    /// Pair a device to a kid profile. The API key is only ever returned here.
    pub async fn register_device(&self, parent_id: i32, kid_profile_id: i32, name: &str) -> Result<DeviceRegistration> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "device name cannot be empty"));
        }

        let txn = self.write_conn().begin().await?;
        ensure_kid_owned(&txn, parent_id, kid_profile_id).await?;

        let api_key = generate_api_key();
        let device = DeviceActiveModel {
            public_id: Set(Uuid::new_v4()),
            parent_id: Set(parent_id),
            kid_profile_id: Set(kid_profile_id),
            name: Set(name.to_string()),
            api_key_hash: Set(hash_api_key(&api_key)),
            created_at: Set(Utc::now().into()),
            last_active: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(device_id = %device.public_id, parent_id, kid_profile_id, "Device registered");
        Ok(DeviceRegistration { device, api_key })
    }

    /// A parent's paired devices
    pub async fn list_devices(&self, parent_id: i32) -> Result<Vec<Device>> {
        DeviceEntity::find()
            .filter(DeviceColumn::ParentId.eq(parent_id))
            .order_by_asc(DeviceColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Check device credentials and stamp `last_active`
    pub async fn authenticate_device(&self, public_id: Uuid, api_key: &str) -> Result<Device> {
        let device = DeviceEntity::find()
            .filter(DeviceColumn::PublicId.eq(public_id))
            .one(self.read_conn())
            .await?
            .ok_or(AppError::InvalidApiKey)?;

        if !validate_api_key(api_key, &device.api_key_hash) {
            return Err(AppError::InvalidApiKey);
        }

        let mut active: DeviceActiveModel = device.into();
        active.last_active = Set(Some(Utc::now().into()));
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Usage Ledger
    // ========================================================================

    /// Add minutes to the device's entry for the local day. Returns the device's new total.
    pub async fn record_usage(&self, device: &Device, minutes_delta: i32, at: DateTime<Utc>) -> Result<i32> {
        if minutes_delta < 0 {
            return Err(AppError::validation("minutes", "usage cannot be negative"));
        }

        let date = self.launch_config().local_date(at);
        let txn = self.write_conn().begin().await?;

        let bumped = UsageEntryEntity::update_many()
            .col_expr(
                UsageEntryColumn::MinutesUsed,
                Expr::col(UsageEntryColumn::MinutesUsed).add(minutes_delta),
            )
            .col_expr(UsageEntryColumn::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(at)))
            .filter(UsageEntryColumn::DeviceId.eq(device.id))
            .filter(UsageEntryColumn::KidProfileId.eq(device.kid_profile_id))
            .filter(UsageEntryColumn::UsageDate.eq(date))
            .exec(&txn)
            .await?;

        if bumped.rows_affected == 0 {
            UsageEntryActiveModel {
                device_id: Set(device.id),
                kid_profile_id: Set(device.kid_profile_id),
                usage_date: Set(date),
                minutes_used: Set(minutes_delta),
                updated_at: Set(at.into()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let total = UsageEntryEntity::find()
            .filter(UsageEntryColumn::DeviceId.eq(device.id))
            .filter(UsageEntryColumn::KidProfileId.eq(device.kid_profile_id))
            .filter(UsageEntryColumn::UsageDate.eq(date))
            .one(&txn)
            .await?
            .map(|e| e.minutes_used)
            .unwrap_or(minutes_delta);

        txn.commit().await?;

        metrics::record_usage(minutes_delta);
        info!(
            device_id = %device.public_id,
            kid_profile_id = device.kid_profile_id,
            minutes = minutes_delta,
            total,
            %date,
            "Usage recorded"
        );
        Ok(total)
    }

    /// Minutes a kid used on a local date, summed across devices
    pub async fn get_usage(&self, owner: Option<i32>, kid_profile_id: i32, date: NaiveDate) -> Result<i32> {
        let conn = self.read_conn();
        match owner {
            Some(parent_id) => ensure_kid_owned(conn, parent_id, kid_profile_id).await?,
            None => find_kid(conn, kid_profile_id).await?,
        };
        used_on(conn, kid_profile_id, date).await
    }

    /// Minutes left for the kid's local day; `None` when unlimited
    pub async fn remaining(&self, owner: Option<i32>, kid_profile_id: i32, at: DateTime<Utc>) -> Result<Option<i32>> {
        let summary = self.usage_summary(owner, kid_profile_id, self.launch_config().local_date(at)).await?;
        Ok(summary.remaining_minutes)
    }

    pub async fn usage_summary(&self, owner: Option<i32>, kid_profile_id: i32, date: NaiveDate) -> Result<UsageSummary> {
        let conn = self.read_conn();
        let kid = match owner {
            Some(parent_id) => ensure_kid_owned(conn, parent_id, kid_profile_id).await?,
            None => find_kid(conn, kid_profile_id).await?,
        };

        let limits = effective_limits(conn, &kid).await?;
        let used_minutes = used_on(conn, kid.id, date).await?;

        Ok(UsageSummary {
            kid_profile_id: kid.id,
            date,
            used_minutes,
            daily_limit_minutes: limits.daily_limit_minutes,
            remaining_minutes: limits.remaining(used_minutes),
        })
    }
}

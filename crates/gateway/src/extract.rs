//! Device credential extraction
//!
//! Paired devices authenticate with `X-Device-ID` (the device's public id)
//! and `X-Api-Key` (the key handed out once at registration).

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use safeview_common::{
    db::models::Device,
    errors::{AppError, Result},
    Repository,
};
use uuid::Uuid;

pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// An authenticated device
#[derive(Debug, Clone)]
pub struct DeviceContext(pub Device);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: format!("Missing {} header", name),
        })
}

impl<S> FromRequestParts<S> for DeviceContext
where
    Repository: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let public_id = header(parts, DEVICE_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| AppError::InvalidApiKey)?;
        let api_key = header(parts, API_KEY_HEADER)?;

        let repo = Repository::from_ref(state);
        let device = repo.authenticate_device(public_id, api_key).await?;
        Ok(DeviceContext(device))
    }
}

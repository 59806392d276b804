//! External plate data provider.
//!
//! Payloads differ between providers; [`normalize_vehicle_attributes`] reads
//! whichever aliases are present. Provider ids are not shop records, so a
//! vehicle found here never carries an id.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use autoshop_service_orders::{LookupError, PlateLookup, VehicleRecord, normalize_vehicle_attributes};

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct ExternalPlateClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ExternalPlateClient {
    /// `None` when no provider is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Option<Self>, ClientError> {
        let Some(base_url) = config.plate_api_url.as_deref() else {
            return Ok(None);
        };
        let http = config.http_client().map_err(ClientError::network)?;
        Ok(Some(Self::with_http(
            http,
            base_url,
            config.plate_api_token.clone(),
        )))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn fetch(&self, plate: &str) -> Result<Option<VehicleRecord>, ClientError> {
        let url = format!("{}/{}", self.base_url, plate);
        tracing::debug!(%url, "plate provider lookup");

        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(ClientError::network)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Api(
                status.as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let body: Value = resp.json().await.map_err(ClientError::parse)?;
        Ok(normalize_vehicle_attributes(&body).map(|mut record| {
            record.id = None;
            if record.data.plate.is_empty() {
                record.data.plate = plate.to_string();
            }
            record
        }))
    }
}

#[async_trait]
impl PlateLookup for ExternalPlateClient {
    async fn find_by_plate(&self, plate: &str) -> Result<Option<VehicleRecord>, LookupError> {
        Ok(self.fetch(plate).await?)
    }
}

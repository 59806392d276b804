//! Shop backend client.
//!
//! Every endpoint answers an [`ApiResponse`] envelope. Lookups treat a 404,
//! a missing `content` or a non-200 `statusCode` as "not found".

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use autoshop_service_orders::{
    CustomerLookup, CustomerRecord, LookupError, PlateLookup, ServiceOrderGateway,
    ServiceOrderPayload, SubmitError, SubmitReceipt, VehicleRecord, normalize_vehicle_attributes,
};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::records::{
    CustomerDto, CustomerSummary, ServiceOrderSummary, UserSummary, VehicleSummary,
};
use crate::response::{ApiResponse, PageRequest, PagedResult};

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = config.http_client().map_err(ClientError::network)?;
        Ok(Self::with_http(http, &config.api_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// GET an enveloped record; `Ok(None)` when the backend has nothing.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "backend lookup");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ClientError::network)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Api(status.as_u16(), error_message(resp).await));
        }

        let envelope: ApiResponse<T> = resp.json().await.map_err(ClientError::parse)?;
        envelope.into_result()
    }

    /// POST to a `GetAll` endpoint.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        page: &PageRequest,
    ) -> Result<PagedResult<T>, ClientError> {
        let url = self.endpoint(&format!("{resource}/GetAll"));
        tracing::debug!(%url, page_index = page.page_index, page_size = page.page_size, "backend listing");

        let resp = self
            .http
            .post(&url)
            .json(page)
            .send()
            .await
            .map_err(ClientError::network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api(status.as_u16(), error_message(resp).await));
        }

        let envelope: ApiResponse<PagedResult<T>> = resp.json().await.map_err(ClientError::parse)?;
        Ok(envelope.into_result()?.unwrap_or_else(PagedResult::empty))
    }

    pub async fn list_customers(
        &self,
        page: &PageRequest,
    ) -> Result<PagedResult<CustomerSummary>, ClientError> {
        self.list("Customer", page).await
    }

    pub async fn list_vehicles(
        &self,
        page: &PageRequest,
    ) -> Result<PagedResult<VehicleSummary>, ClientError> {
        self.list("Vehicle", page).await
    }

    pub async fn list_service_orders(
        &self,
        page: &PageRequest,
    ) -> Result<PagedResult<ServiceOrderSummary>, ClientError> {
        self.list("ServiceOrder", page).await
    }

    pub async fn list_users(&self, page: &PageRequest) -> Result<PagedResult<UserSummary>, ClientError> {
        self.list("User", page).await
    }

    async fn post_service_order<B: Serialize + Sync>(
        &self,
        body: &B,
    ) -> Result<SubmitReceipt, ClientError> {
        let url = self.endpoint("ServiceOrder");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ClientError::network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api(status.as_u16(), error_message(resp).await));
        }

        let text = resp.text().await.map_err(ClientError::network)?;
        if text.trim().is_empty() {
            return Ok(empty_receipt(None));
        }
        let envelope: ApiResponse<Value> = serde_json::from_str(&text).map_err(ClientError::parse)?;
        match envelope.status_code {
            None | Some(200) | Some(201) => Ok(receipt_from(envelope)),
            Some(code) => Err(ClientError::Api(code, envelope.message.unwrap_or_default())),
        }
    }
}

fn empty_receipt(message: Option<String>) -> SubmitReceipt {
    SubmitReceipt {
        id: None,
        order_number: None,
        message,
    }
}

fn receipt_from(envelope: ApiResponse<Value>) -> SubmitReceipt {
    let content = envelope.content.unwrap_or(Value::Null);
    let text = |key: &str| match content.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    SubmitReceipt {
        id: text("id"),
        order_number: text("orderNumber"),
        ..empty_receipt(envelope.message)
    }
}

/// Backend `message` when the error body is an envelope, raw text otherwise.
async fn error_message(resp: reqwest::Response) -> String {
    let body = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ApiResponse<Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or(body)
}

#[async_trait]
impl CustomerLookup for BackendClient {
    async fn find_by_document(&self, document: &str) -> Result<Option<CustomerRecord>, LookupError> {
        let found: Option<CustomerDto> = self
            .fetch(&format!("Customer/GetBySocialNumber/{document}"))
            .await?;
        Ok(found.map(CustomerRecord::from))
    }
}

#[async_trait]
impl PlateLookup for BackendClient {
    async fn find_by_plate(&self, plate: &str) -> Result<Option<VehicleRecord>, LookupError> {
        let found: Option<Value> = self.fetch(&format!("Vehicle/GetByPlate/{plate}")).await?;
        Ok(found.as_ref().and_then(normalize_vehicle_attributes))
    }
}

#[async_trait]
impl ServiceOrderGateway for BackendClient {
    async fn submit(&self, payload: &ServiceOrderPayload) -> Result<SubmitReceipt, SubmitError> {
        let receipt = self.post_service_order(payload).await?;
        tracing::info!(
            order_number = %payload.order_number,
            id = receipt.id.as_deref().unwrap_or("-"),
            "service order accepted by backend"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receipt_reads_string_or_numeric_ids() {
        let envelope: ApiResponse<Value> = serde_json::from_value(json!({
            "statusCode": 201,
            "content": { "id": 981, "orderNumber": "20260101-ABC123" },
            "message": "created"
        }))
        .unwrap();

        let receipt = receipt_from(envelope);
        assert_eq!(receipt.id.as_deref(), Some("981"));
        assert_eq!(receipt.order_number.as_deref(), Some("20260101-ABC123"));
        assert_eq!(receipt.message.as_deref(), Some("created"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = BackendClient::with_http(reqwest::Client::new(), "http://shop/api/");
        assert_eq!(client.endpoint("ServiceOrder"), "http://shop/api/ServiceOrder");
    }
}

//! Postal code (CEP) directory client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use autoshop_service_orders::format;
use autoshop_service_orders::{AddressData, LookupError, PostalCodeLookup};

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct CepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    /// `true` or `"true"` for unknown codes.
    #[serde(default)]
    erro: Option<Value>,
}

impl CepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn into_address(self, requested: &str) -> AddressData {
        let cep = format::digits_only(&self.cep);
        AddressData {
            postal_code: if cep.is_empty() { requested.to_string() } else { cep },
            street: self.logradouro,
            number: String::new(),
            complement: self.complemento,
            district: self.bairro,
            city: self.localidade,
            state: self.uf.trim().to_ascii_uppercase(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostalCodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostalCodeClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = config.http_client().map_err(ClientError::network)?;
        Ok(Self::with_http(http, &config.postal_code_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, postal_code: &str) -> Result<Option<AddressData>, ClientError> {
        let url = format!("{}/{}/json", self.base_url, postal_code);
        tracing::debug!(%url, "postal code lookup");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ClientError::network)?;

        let status = resp.status();
        // malformed codes answer 400
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Api(
                status.as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let body: CepResponse = resp.json().await.map_err(ClientError::parse)?;
        if body.is_error() {
            return Ok(None);
        }
        Ok(Some(body.into_address(postal_code)))
    }
}

#[async_trait]
impl PostalCodeLookup for PostalCodeClient {
    async fn find_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Option<AddressData>, LookupError> {
        Ok(self.fetch(postal_code).await?)
    }
}

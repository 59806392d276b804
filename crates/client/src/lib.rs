//! `autoshop-client` — HTTP implementations of the service-order lookups
//! and submission gateway.
//!
//! - [`BackendClient`]: the shop backend (customers, vehicles, orders, lists).
//! - [`PostalCodeClient`]: the CEP directory.
//! - [`ExternalPlateClient`]: optional plate data provider, consulted after
//!   the backend when a plate is unknown locally.

pub mod backend;
pub mod config;
pub mod error;
pub mod plates;
pub mod postal;
pub mod records;
pub mod response;

use std::sync::Arc;

use autoshop_service_orders::{
    CustomerLookup, FallbackPlateLookup, PlateLookup, PostalCodeLookup, ServiceOrderGateway,
};

pub use backend::BackendClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use plates::ExternalPlateClient;
pub use postal::PostalCodeClient;
pub use records::{CustomerSummary, ServiceOrderSummary, UserSummary, VehicleSummary};
pub use response::{ApiResponse, PageRequest, PagedResult, SortDirection};

/// Everything a wizard session needs from the outside world.
#[derive(Clone)]
pub struct ShopServices {
    pub backend: Arc<BackendClient>,
    pub customers: Arc<dyn CustomerLookup>,
    pub postal_codes: Arc<dyn PostalCodeLookup>,
    pub plates: Arc<dyn PlateLookup>,
    pub orders: Arc<dyn ServiceOrderGateway>,
}

impl ShopServices {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let backend = Arc::new(BackendClient::new(config)?);
        let postal_codes = Arc::new(PostalCodeClient::new(config)?);

        let plates: Arc<dyn PlateLookup> = match ExternalPlateClient::from_config(config)? {
            Some(provider) => {
                tracing::info!("plate provider configured; used when the shop has no record");
                Arc::new(FallbackPlateLookup::new(backend.clone(), Arc::new(provider)))
            }
            None => backend.clone(),
        };

        Ok(Self {
            customers: backend.clone(),
            postal_codes,
            plates,
            orders: backend.clone(),
            backend,
        })
    }
}

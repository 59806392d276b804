//! External lookups consumed by the wizard steps.
//!
//! Implementations live in the client crate; steps only see these traits.
//! A lookup answers `Ok(None)` for "no such record" and `Err` for transport
//! or backend trouble. Steps treat both the same way (manual entry), but
//! the distinction is kept for logging.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use autoshop_core::{AddressId, CustomerId, VehicleId};

use crate::format;
use crate::forms::{AddressData, OwnerData, VehicleData};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup service unreachable: {0}")]
    Transport(String),
    #[error("lookup service error ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("unexpected lookup payload: {0}")]
    Parse(String),
}

/// A customer known to the backend, with its stored address when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub data: OwnerData,
    pub address: Option<AddressRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub id: AddressId,
    pub data: AddressData,
}

/// Vehicle attributes; `id` is only known when the backend already has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    pub id: Option<VehicleId>,
    pub data: VehicleData,
}

#[async_trait]
pub trait PostalCodeLookup: Send + Sync {
    /// `postal_code` is digits only.
    async fn find_by_postal_code(&self, postal_code: &str)
    -> Result<Option<AddressData>, LookupError>;
}

#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// `document` is a CPF, digits only.
    async fn find_by_document(&self, document: &str)
    -> Result<Option<CustomerRecord>, LookupError>;
}

#[async_trait]
pub trait PlateLookup: Send + Sync {
    /// `plate` is normalized (see [`format::normalize_plate`]).
    async fn find_by_plate(&self, plate: &str) -> Result<Option<VehicleRecord>, LookupError>;
}

/// Outcome of a step's search action. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The form was filled from the lookup.
    Found,
    /// No record; the user continues with manual entry.
    NotFound,
    /// The key is malformed; no lookup was attempted.
    InvalidKey,
    /// The lookup failed; the user continues with manual entry.
    Unavailable(String),
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found)
    }
}

/// Asks `primary` (the shop's own records) first and `fallback` (a plate
/// data provider) when the primary has nothing or fails.
pub struct FallbackPlateLookup {
    primary: Arc<dyn PlateLookup>,
    fallback: Arc<dyn PlateLookup>,
}

impl FallbackPlateLookup {
    pub fn new(primary: Arc<dyn PlateLookup>, fallback: Arc<dyn PlateLookup>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PlateLookup for FallbackPlateLookup {
    async fn find_by_plate(&self, plate: &str) -> Result<Option<VehicleRecord>, LookupError> {
        match self.primary.find_by_plate(plate).await {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => tracing::debug!(plate, "plate unknown locally; asking provider"),
            Err(err) => tracing::warn!(plate, %err, "local plate lookup failed; asking provider"),
        }
        self.fallback.find_by_plate(plate).await
    }
}

// Vehicle payloads come from two sources with inconsistent schemas. Each
// attribute is read from the first alias present (non-empty), in this order.
const PLATE_KEYS: &[&str] = &["placa", "Placa", "PLACA", "plate", "Plate", "licensePlate"];
const BRAND_KEYS: &[&str] = &["marca", "Marca", "MARCA", "brand", "Brand", "brandName"];
const MODEL_KEYS: &[&str] = &["modelo", "Modelo", "MODELO", "model", "Model", "modelName"];
const COLOR_KEYS: &[&str] = &["cor", "Cor", "COR", "color", "Color", "colorName"];
const YEAR_KEYS: &[&str] = &[
    "anoModelo",
    "AnoModelo",
    "ano_modelo",
    "ano",
    "Ano",
    "ANO",
    "modelYear",
    "year",
    "Year",
];
const MILEAGE_KEYS: &[&str] = &["quilometragem", "km", "mileage", "Mileage"];
const ID_KEYS: &[&str] = &["id", "Id", "ID", "vehicleId"];
/// Nested objects (`{"marca": {"nome": "FIAT"}}`) are read through these.
const NAME_KEYS: &[&str] = &["nome", "name", "Name", "descricao", "description"];

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => first_text(obj, NAME_KEYS),
        _ => None,
    }
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(text_value))
}

fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_u64(),
        // "2015/2016" or "2015": leading digits only
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

/// Normalize a loosely-typed vehicle payload.
///
/// Returns `None` when the payload is not an object or carries neither a
/// brand nor a model. Missing attributes are left empty for manual entry.
pub fn normalize_vehicle_attributes(raw: &Value) -> Option<VehicleRecord> {
    let obj = raw.as_object()?;

    let brand = first_text(obj, BRAND_KEYS);
    let model = first_text(obj, MODEL_KEYS);
    if brand.is_none() && model.is_none() {
        return None;
    }

    let id = first_text(obj, ID_KEYS).and_then(|raw| raw.parse::<VehicleId>().ok());
    let year = first_number(obj, YEAR_KEYS)
        .and_then(|y| u16::try_from(y).ok())
        .unwrap_or_default();

    Some(VehicleRecord {
        id,
        data: VehicleData {
            plate: first_text(obj, PLATE_KEYS)
                .map(|p| format::normalize_plate(&p))
                .unwrap_or_default(),
            brand: brand.unwrap_or_default(),
            model: model.unwrap_or_default(),
            color: first_text(obj, COLOR_KEYS).unwrap_or_default(),
            year,
            mileage: first_number(obj, MILEAGE_KEYS).and_then(|m| u32::try_from(m).ok()),
        },
    })
}

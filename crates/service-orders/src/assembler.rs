//! Turning a ready draft into the backend's service-order request.
//!
//! The backend resolves or creates the customer, address and vehicle
//! records itself; the payload only carries ids the draft already knows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use autoshop_core::{
    AddressId, CatalogItemId, CustomerId, DomainError, DomainResult, VehicleId, to_minor_units,
};

use crate::dates::format_timestamp;
use crate::draft::{Draft, LineItem, LineKind, Requirement};
use crate::store::DraftStore;

/// Message shown when the backend gives no usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "The service order could not be created. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CustomerId>,
    pub name: String,
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<VehicleId>,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub year: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

/// Amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePayload {
    pub id: CatalogItemId,
    pub code: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
}

/// `POST /ServiceOrder` body. Amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderPayload {
    pub order_number: String,
    pub opened_at: String,
    pub description: String,
    pub observations: String,
    pub customer: CustomerPayload,
    pub address: AddressPayload,
    pub vehicle: VehiclePayload,
    pub services: Vec<LinePayload>,
    pub products: Vec<LinePayload>,
    pub subtotal: i64,
    pub discount: i64,
    pub taxes: i64,
    pub total: i64,
}

fn line_payload(item: &LineItem) -> DomainResult<LinePayload> {
    Ok(LinePayload {
        id: item.id,
        code: item.code.clone(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price: to_minor_units(item.unit_price)?,
        total: to_minor_units(item.line_total())?,
    })
}

/// Build the request body from a draft.
///
/// Fails when a slice is missing or an amount does not fit in cents.
pub fn assemble(draft: &Draft) -> DomainResult<ServiceOrderPayload> {
    let customer = draft
        .customer()
        .ok_or_else(|| DomainError::invariant("draft has no customer"))?;
    let address = draft
        .address()
        .ok_or_else(|| DomainError::invariant("draft has no address"))?;
    let vehicle = draft
        .vehicle()
        .ok_or_else(|| DomainError::invariant("draft has no vehicle"))?;

    let owner = customer.data();
    let birth_date = owner
        .birth_date
        .as_ref()
        .map(|date| date.to_payload_string())
        .transpose()?;

    let mut services = Vec::new();
    let mut products = Vec::new();
    for item in draft.services() {
        let line = line_payload(item)?;
        match item.kind {
            LineKind::Service => services.push(line),
            LineKind::Product => products.push(line),
        }
    }

    let place = address.data();
    let car = vehicle.data();
    Ok(ServiceOrderPayload {
        order_number: draft.order_number().to_string(),
        opened_at: format_timestamp(&draft.created_at()),
        description: draft.description().to_string(),
        observations: draft.observations().to_string(),
        customer: CustomerPayload {
            id: customer.id(),
            name: owner.name.trim().to_string(),
            document: owner.document.clone(),
            email: owner
                .email
                .as_ref()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            phone: owner.phone.clone(),
            birth_date,
        },
        address: AddressPayload {
            id: address.id(),
            postal_code: place.postal_code.clone(),
            street: place.street.clone(),
            number: place.number.clone(),
            complement: place.complement.clone(),
            district: place.district.clone(),
            city: place.city.clone(),
            state: place.state.clone(),
        },
        vehicle: VehiclePayload {
            id: vehicle.id(),
            plate: car.plate.clone(),
            brand: car.brand.clone(),
            model: car.model.clone(),
            color: car.color.clone(),
            year: car.year,
            mileage: car.mileage,
        },
        services,
        products,
        subtotal: to_minor_units(draft.subtotal())?,
        discount: to_minor_units(draft.discount())?,
        taxes: to_minor_units(draft.taxes())?,
        total: to_minor_units(draft.total())?,
    })
}

/// What the backend answered to an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("service order rejected ({status})")]
    Rejected { status: u16, message: Option<String> },
    #[error("service order could not be sent: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ServiceOrderGateway: Send + Sync {
    async fn submit(&self, payload: &ServiceOrderPayload) -> Result<SubmitReceipt, SubmitError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    #[error("draft is incomplete: missing {}", join(.0))]
    NotReady(Vec<Requirement>),
    #[error("draft could not be assembled: {0}")]
    Assembly(#[from] DomainError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

fn join(requirements: &[Requirement]) -> String {
    requirements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl FinalizeError {
    /// Text for the operator: the backend's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            FinalizeError::NotReady(missing) => {
                format!("Complete the order before finalizing (missing: {}).", join(missing))
            }
            FinalizeError::Submit(SubmitError::Rejected {
                message: Some(message),
                ..
            }) if !message.trim().is_empty() => message.trim().to_string(),
            FinalizeError::Assembly(_) | FinalizeError::Submit(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// Submit the store's draft once; start a fresh draft only on success.
pub async fn finalize(
    store: &DraftStore,
    gateway: &dyn ServiceOrderGateway,
) -> Result<SubmitReceipt, FinalizeError> {
    let draft = store.current_draft();
    let missing = draft.missing_requirements();
    if !missing.is_empty() {
        return Err(FinalizeError::NotReady(missing));
    }

    let payload = assemble(&draft)?;
    tracing::info!(
        order_number = %payload.order_number,
        total_cents = payload.total,
        existing_customer = payload.customer.id.is_some(),
        "submitting service order"
    );

    match gateway.submit(&payload).await {
        Ok(receipt) => {
            let next = store.reset();
            tracing::info!(
                order_number = %payload.order_number,
                next_order_number = %next,
                "service order created"
            );
            Ok(receipt)
        }
        Err(err) => {
            tracing::warn!(order_number = %payload.order_number, %err, "service order rejected");
            Err(err.into())
        }
    }
}

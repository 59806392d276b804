//! Wizard step controllers.
//!
//! Each step owns a local form bound to one slice of the draft. It reads the
//! draft when mounted, and on a save request either commits the form into
//! the store or reports which fields are invalid (leaving the store alone).

pub mod address;
pub mod form;
pub mod owner;
pub mod services;
pub mod vehicle;

use serde::Serialize;
use thiserror::Error;

use autoshop_core::DomainError;

use crate::draft::Draft;
use crate::store::DraftStore;

pub use address::AddressStep;
pub use form::{FieldErrors, FormState};
pub use owner::OwnerStep;
pub use services::ServicesStep;
pub use vehicle::VehicleStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Owner,
    Address,
    Vehicle,
    Services,
}

impl core::fmt::Display for StepKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            StepKind::Owner => "owner",
            StepKind::Address => "address",
            StepKind::Vehicle => "vehicle",
            StepKind::Services => "services",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("invalid fields: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Contract shared by every step controller.
pub trait Step: Send {
    fn kind(&self) -> StepKind;

    /// Populate the local form from the draft (called on mount).
    fn load(&mut self, draft: &Draft);

    /// Validate the local form and commit it into the store.
    ///
    /// On failure every field is marked touched and the store is untouched.
    fn save(&mut self, store: &DraftStore) -> Result<(), StepError>;
}

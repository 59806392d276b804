//! `autoshop-service-orders` — the service-order draft workflow.
//!
//! A wizard session accumulates a draft (customer, address, vehicle, priced
//! lines) across steps, each step owning a form bound to one slice of the
//! draft. When the draft is complete it is assembled into a single request
//! and submitted; the backend resolves or creates the referenced records.
//!
//! IO is behind traits ([`lookup`], [`assembler::ServiceOrderGateway`]); the
//! HTTP implementations live in `autoshop-client`.

pub mod assembler;
pub mod config;
pub mod coordinator;
pub mod dates;
pub mod draft;
pub mod format;
pub mod forms;
pub mod lookup;
pub mod steps;
pub mod store;
pub mod wizard;

pub use assembler::{
    FinalizeError, ServiceOrderGateway, ServiceOrderPayload, SubmitError, SubmitReceipt, assemble,
    finalize,
};
pub use config::WizardConfig;
pub use coordinator::{MountedStep, SaveCoordinator, SaveError, SaveRequest};
pub use dates::DateInput;
pub use draft::{
    Draft, DraftEvent, DraftSummary, LineItem, LineKind, OrderNumber, Requirement, Totals,
};
pub use forms::{AddressData, OwnerData, VehicleData};
pub use lookup::{
    AddressRecord, CustomerLookup, CustomerRecord, FallbackPlateLookup, LookupError, PlateLookup,
    PostalCodeLookup, SearchOutcome, VehicleRecord, normalize_vehicle_attributes,
};
pub use steps::{AddressStep, OwnerStep, ServicesStep, Step, StepError, StepKind, VehicleStep};
pub use store::DraftStore;
pub use wizard::{Wizard, WizardError, WizardStep};

//! `autoshop-core` — shared domain building blocks for the shop workspace.
//!
//! Pure domain primitives only (no IO): identifiers, the domain error model,
//! aggregate traits and money conversion helpers.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::{AddressId, CatalogItemId, CustomerId, VehicleId};
pub use money::{from_minor_units, to_minor_units};
pub use value_object::ValueObject;

//! `autoshop-events` — event contract and in-process fan-out.
//!
//! Session state (the service-order draft) emits events on every mutation;
//! anything showing that state (step forms, a running summary) subscribes
//! here instead of polling.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

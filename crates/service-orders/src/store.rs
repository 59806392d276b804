//! Session-scoped draft store.
//!
//! One `DraftStore` per wizard session, shared (`Arc`) between the wizard
//! and whichever step is mounted. Every accepted command is applied to the
//! draft and the resulting events are published to subscribers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use autoshop_core::{AddressId, Aggregate, CustomerId, DomainResult, VehicleId};
use autoshop_events::{Event, EventBus, InMemoryEventBus, Subscription};

use crate::draft::{
    Draft, DraftCommand, DraftEvent, DraftReset, DraftSummary, LineItem, OrderNumber, Requirement,
    UpdateAmount, UpdateServices, UpdateSlice, UpdateText,
};
use crate::forms::{AddressData, OwnerData, VehicleData};

#[derive(Debug)]
pub struct DraftStore {
    draft: Mutex<Draft>,
    bus: InMemoryEventBus<DraftEvent>,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStore {
    /// Store holding a brand-new draft.
    pub fn new() -> Self {
        Self::with_draft(Draft::start(Utc::now()))
    }

    pub fn with_draft(draft: Draft) -> Self {
        Self {
            draft: Mutex::new(draft),
            bus: InMemoryEventBus::new(),
        }
    }

    // `handle` does every fallible computation (totals included) and `apply`
    // only assigns, so the guarded draft is never left half-applied.
    fn lock(&self) -> MutexGuard<'_, Draft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the latest state.
    pub fn current_draft(&self) -> Draft {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> Subscription<DraftEvent> {
        self.bus.subscribe()
    }

    fn dispatch(&self, command: DraftCommand) -> DomainResult<()> {
        let events = {
            let mut draft = self.lock();
            let events = draft.handle(&command)?;
            for event in &events {
                draft.apply(event);
            }
            events
        };

        for event in events {
            self.publish(event);
        }
        Ok(())
    }

    fn publish(&self, event: DraftEvent) {
        let event_type = event.event_type();
        tracing::debug!(event_type, "draft event");
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(?err, event_type, "failed to broadcast draft event");
        }
    }

    pub fn update_customer_data(
        &self,
        data: OwnerData,
        existing_id: Option<CustomerId>,
    ) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateCustomer(UpdateSlice {
            data,
            existing_id,
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_address_data(
        &self,
        data: AddressData,
        existing_id: Option<AddressId>,
    ) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateAddress(UpdateSlice {
            data,
            existing_id,
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_vehicle_data(
        &self,
        data: VehicleData,
        existing_id: Option<VehicleId>,
    ) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateVehicle(UpdateSlice {
            data,
            existing_id,
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_services(&self, items: Vec<LineItem>) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateServices(UpdateServices {
            items,
            occurred_at: Utc::now(),
        }))
    }

    /// Negative amounts are stored as zero.
    pub fn update_discount(&self, amount: Decimal) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateDiscount(UpdateAmount {
            amount,
            occurred_at: Utc::now(),
        }))
    }

    /// Negative amounts are stored as zero.
    pub fn update_taxes(&self, amount: Decimal) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateTaxes(UpdateAmount {
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_description(&self, text: impl Into<String>) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateDescription(UpdateText {
            text: text.into(),
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_observations(&self, text: impl Into<String>) -> DomainResult<()> {
        self.dispatch(DraftCommand::UpdateObservations(UpdateText {
            text: text.into(),
            occurred_at: Utc::now(),
        }))
    }

    pub fn summary(&self) -> DraftSummary {
        self.lock().summary()
    }

    pub fn is_ready_to_finalize(&self) -> bool {
        self.lock().is_ready_to_finalize()
    }

    pub fn missing_requirements(&self) -> Vec<Requirement> {
        self.lock().missing_requirements()
    }

    /// Discard the current draft and start a new one with a fresh number.
    pub fn reset(&self) -> OrderNumber {
        let now = Utc::now();
        let order_number = OrderNumber::generate(now);
        let event = {
            let mut draft = self.lock();
            let event = DraftEvent::DraftReset(DraftReset {
                previous: draft.order_number().clone(),
                order_number: order_number.clone(),
                occurred_at: now,
            });
            draft.apply(&event);
            event
        };

        tracing::info!(order_number = %order_number, "draft reset");
        self.publish(event);
        order_number
    }

    /// Same as [`DraftStore::reset`], returning the new draft.
    pub fn create_new_draft(&self) -> Draft {
        self.reset();
        self.current_draft()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::LineKind;
    use crate::forms::fixtures;
    use autoshop_core::CatalogItemId;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: u32) -> LineItem {
        LineItem::new(
            CatalogItemId::new(),
            "P-10",
            "Brake pads",
            LineKind::Product,
            price,
            quantity,
        )
    }

    #[test]
    fn updates_are_visible_in_snapshots() {
        let store = DraftStore::new();
        store
            .update_services(vec![line(dec!(100), 2), line(dec!(50), 1)])
            .unwrap();
        store.update_discount(dec!(20)).unwrap();
        store.update_description("noise when braking").unwrap();

        let draft = store.current_draft();
        assert_eq!(draft.subtotal(), dec!(250));
        assert_eq!(draft.total(), dec!(230));
        assert_eq!(draft.description(), "noise when braking");
    }

    #[test]
    fn subscribers_receive_each_mutation() {
        let store = DraftStore::new();
        let sub = store.subscribe();

        store.update_customer_data(fixtures::owner(), None).unwrap();
        store.update_discount(dec!(5)).unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DraftEvent::CustomerUpdated(_)));
        assert!(matches!(events[1], DraftEvent::DiscountUpdated(_)));
    }

    #[test]
    fn rejected_commands_neither_mutate_nor_publish() {
        let store = DraftStore::new();
        let sub = store.subscribe();
        let before = store.current_draft();

        assert!(store.update_services(vec![line(dec!(10), 0)]).is_err());

        assert_eq!(store.current_draft(), before);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn overflowing_lines_keep_totals_consistent() {
        let store = DraftStore::new();
        store.update_taxes(Decimal::MAX).unwrap();
        let before = store.current_draft();

        let err = store.update_services(vec![line(Decimal::MAX, 1)]).unwrap_err();
        assert!(matches!(err, autoshop_core::DomainError::AmountOutOfRange(_)));

        let draft = store.current_draft();
        assert_eq!(draft, before);
        assert!(draft.services().is_empty());
        assert_eq!(draft.total(), Decimal::MAX);

        store.update_taxes(dec!(1)).unwrap();
        store.update_services(vec![line(dec!(10), 3)]).unwrap();
        assert_eq!(store.current_draft().total(), dec!(31));
    }

    #[test]
    fn customer_exists_only_with_existing_id() {
        let store = DraftStore::new();
        store.update_customer_data(fixtures::owner(), None).unwrap();
        assert!(!store.current_draft().customer().unwrap().exists());

        store
            .update_customer_data(fixtures::owner(), Some(CustomerId::new()))
            .unwrap();
        assert!(store.current_draft().customer().unwrap().exists());
    }

    #[test]
    fn reset_yields_empty_draft_with_fresh_number() {
        let store = DraftStore::new();
        let original = store.current_draft().order_number().clone();
        store.update_customer_data(fixtures::owner(), None).unwrap();
        store.update_services(vec![line(dec!(10), 1)]).unwrap();
        let sub = store.subscribe();

        let fresh = store.reset();

        let draft = store.current_draft();
        assert!(draft.is_empty());
        assert_eq!(draft.order_number(), &fresh);
        assert_ne!(fresh, original);
        match sub.drain().as_slice() {
            [DraftEvent::DraftReset(e)] => assert_eq!(e.previous, original),
            other => panic!("expected a single DraftReset, got {other:?}"),
        }
    }

    #[test]
    fn summary_and_readiness_reflect_store_state() {
        let store = DraftStore::new();
        assert!(!store.is_ready_to_finalize());

        store.update_customer_data(fixtures::owner(), None).unwrap();
        store.update_address_data(fixtures::address(), None).unwrap();
        store.update_vehicle_data(fixtures::vehicle(), None).unwrap();
        store.update_services(vec![line(dec!(45.90), 2)]).unwrap();

        assert!(store.is_ready_to_finalize());
        assert!(store.missing_requirements().is_empty());
        let summary = store.summary();
        assert_eq!(summary.customer_name.as_deref(), Some("Maria Souza"));
        assert_eq!(summary.total, dec!(91.80));
    }
}

//! Service-order draft aggregate.
//!
//! A draft accumulates what the wizard steps capture (customer, address,
//! vehicle, line items, adjustments) until it is finalized in one backend
//! call. Mutations go through [`DraftCommand`] → [`DraftEvent`] like any
//! other aggregate, so every change can be broadcast to subscribers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use autoshop_core::{
    AddressId, Aggregate, AggregateRoot, CatalogItemId, CustomerId, DomainError, VehicleId,
};
use autoshop_events::Event;

use crate::forms::{AddressData, OwnerData, VehicleData};

/// Display identifier of a draft (`20261017-4F9A2C`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Creation date plus six hex characters from the random tail of a UUIDv7.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let simple = Uuid::now_v7().simple().to_string().to_ascii_uppercase();
        let suffix = &simple[simple.len() - 6..];
        Self(format!("{}-{}", now.format("%Y%m%d"), suffix))
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named sub-record of the draft.
///
/// `exists` is true iff the data was resolved against a backend record
/// (`id` is set). It is informational: finalization sends the id when
/// present and lets the backend resolve or create either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<I, T> {
    id: Option<I>,
    exists: bool,
    data: T,
}

impl<I: Copy, T> Slice<I, T> {
    pub fn new(data: T, existing_id: Option<I>) -> Self {
        Self {
            exists: existing_id.is_some(),
            id: existing_id,
            data,
        }
    }

    pub fn id(&self) -> Option<I> {
        self.id
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

pub type CustomerSlice = Slice<CustomerId, OwnerData>;
pub type AddressSlice = Slice<AddressId, AddressData>;
pub type VehicleSlice = Slice<VehicleId, VehicleData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Service,
    Product,
}

/// A priced line of the order. `line_total` is always `unit_price * quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub id: CatalogItemId,
    pub code: String,
    pub name: String,
    pub kind: LineKind,
    pub unit_price: Decimal,
    pub quantity: u32,
    line_total: Decimal,
}

impl LineItem {
    pub fn new(
        id: CatalogItemId,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: LineKind,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        let mut item = Self {
            id,
            code: code.into(),
            name: name.into(),
            kind,
            unit_price,
            quantity,
            line_total: Decimal::ZERO,
        };
        item.recompute();
        item
    }

    pub fn line_total(&self) -> Decimal {
        self.line_total
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.recompute();
    }

    /// `None` when the product does not fit in a `Decimal`.
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    // Saturates on overflow; `validate_lines` keeps such a line out of a draft.
    fn recompute(&mut self) {
        self.line_total = self.checked_line_total().unwrap_or(Decimal::MAX);
    }
}

/// Derived amounts of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// `subtotal = Σ line_total`, `total = subtotal - discount + taxes`.
///
/// Fails with [`DomainError::AmountOutOfRange`] instead of overflowing.
pub fn compute_totals(
    items: &[LineItem],
    discount: Decimal,
    taxes: Decimal,
) -> Result<Totals, DomainError> {
    let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, item| {
        item.checked_line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| DomainError::out_of_range(format!("subtotal at {}", item.code)))
    })?;
    let total = subtotal
        .checked_sub(discount)
        .and_then(|t| t.checked_add(taxes))
        .ok_or_else(|| {
            DomainError::out_of_range(format!("total of {subtotal} - {discount} + {taxes}"))
        })?;
    Ok(Totals { subtotal, total })
}

/// What still blocks finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    Customer,
    Address,
    Vehicle,
    Services,
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Requirement::Customer => "customer",
            Requirement::Address => "address",
            Requirement::Vehicle => "vehicle",
            Requirement::Services => "services",
        };
        f.write_str(name)
    }
}

/// Condensed view for the review screen and the running summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftSummary {
    pub order_number: OrderNumber,
    pub customer_name: Option<String>,
    pub vehicle: Option<String>,
    pub address: Option<String>,
    pub item_count: usize,
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Aggregate root: the in-progress service order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    order_number: OrderNumber,
    created_at: DateTime<Utc>,
    customer: Option<CustomerSlice>,
    address: Option<AddressSlice>,
    vehicle: Option<VehicleSlice>,
    services: Vec<LineItem>,
    discount: Decimal,
    taxes: Decimal,
    subtotal: Decimal,
    total: Decimal,
    description: String,
    observations: String,
    version: u64,
}

impl Draft {
    pub fn new(order_number: OrderNumber, created_at: DateTime<Utc>) -> Self {
        Self {
            order_number,
            created_at,
            customer: None,
            address: None,
            vehicle: None,
            services: Vec::new(),
            discount: Decimal::ZERO,
            taxes: Decimal::ZERO,
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            description: String::new(),
            observations: String::new(),
            version: 0,
        }
    }

    /// Empty draft with a freshly generated order number.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self::new(OrderNumber::generate(now), now)
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn customer(&self) -> Option<&CustomerSlice> {
        self.customer.as_ref()
    }

    pub fn address(&self) -> Option<&AddressSlice> {
        self.address.as_ref()
    }

    pub fn vehicle(&self) -> Option<&VehicleSlice> {
        self.vehicle.as_ref()
    }

    pub fn services(&self) -> &[LineItem] {
        &self.services
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn taxes(&self) -> Decimal {
        self.taxes
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn observations(&self) -> &str {
        &self.observations
    }

    /// Nothing captured yet (fresh or just reset).
    pub fn is_empty(&self) -> bool {
        self.customer.is_none()
            && self.address.is_none()
            && self.vehicle.is_none()
            && self.services.is_empty()
            && self.description.is_empty()
            && self.observations.is_empty()
            && self.discount.is_zero()
            && self.taxes.is_zero()
    }

    pub fn missing_requirements(&self) -> Vec<Requirement> {
        let mut missing = Vec::new();
        if self.customer.is_none() {
            missing.push(Requirement::Customer);
        }
        if self.address.is_none() {
            missing.push(Requirement::Address);
        }
        if self.vehicle.is_none() {
            missing.push(Requirement::Vehicle);
        }
        if self.services.is_empty() {
            missing.push(Requirement::Services);
        }
        missing
    }

    /// Customer, vehicle and address present and at least one line item.
    pub fn is_ready_to_finalize(&self) -> bool {
        self.missing_requirements().is_empty()
    }

    pub fn summary(&self) -> DraftSummary {
        DraftSummary {
            order_number: self.order_number.clone(),
            customer_name: self.customer.as_ref().map(|c| c.data().name.trim().to_string()),
            vehicle: self.vehicle.as_ref().map(|v| v.data().display()),
            address: self.address.as_ref().map(|a| a.data().display()),
            item_count: self.services.len(),
            subtotal: self.subtotal,
            total: self.total,
        }
    }

    fn set_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.total = totals.total;
    }
}

impl AggregateRoot for Draft {
    type Id = OrderNumber;

    fn id(&self) -> &Self::Id {
        &self.order_number
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: replace a slice wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSlice<I, T> {
    pub data: T,
    pub existing_id: Option<I>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: replace the line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateServices {
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: set a monetary adjustment (discount or taxes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAmount {
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: set a free-text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateText {
    pub text: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    UpdateCustomer(UpdateSlice<CustomerId, OwnerData>),
    UpdateAddress(UpdateSlice<AddressId, AddressData>),
    UpdateVehicle(UpdateSlice<VehicleId, VehicleData>),
    UpdateServices(UpdateServices),
    UpdateDiscount(UpdateAmount),
    UpdateTaxes(UpdateAmount),
    UpdateDescription(UpdateText),
    UpdateObservations(UpdateText),
}

/// Event: a slice was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceUpdated<I, T> {
    pub order_number: OrderNumber,
    pub data: T,
    pub existing_id: Option<I>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the line items were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicesUpdated {
    pub order_number: OrderNumber,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub occurred_at: DateTime<Utc>,
}

/// Event: discount or taxes changed (already clamped to be non-negative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountUpdated {
    pub order_number: OrderNumber,
    pub amount: Decimal,
    pub totals: Totals,
    pub occurred_at: DateTime<Utc>,
}

/// Event: description or observations changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUpdated {
    pub order_number: OrderNumber,
    pub text: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the session dropped its draft and started a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReset {
    pub previous: OrderNumber,
    pub order_number: OrderNumber,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEvent {
    CustomerUpdated(SliceUpdated<CustomerId, OwnerData>),
    AddressUpdated(SliceUpdated<AddressId, AddressData>),
    VehicleUpdated(SliceUpdated<VehicleId, VehicleData>),
    ServicesUpdated(ServicesUpdated),
    DiscountUpdated(AmountUpdated),
    TaxesUpdated(AmountUpdated),
    DescriptionUpdated(TextUpdated),
    ObservationsUpdated(TextUpdated),
    DraftReset(DraftReset),
}

impl Event for DraftEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DraftEvent::CustomerUpdated(_) => "service_order.draft.customer_updated",
            DraftEvent::AddressUpdated(_) => "service_order.draft.address_updated",
            DraftEvent::VehicleUpdated(_) => "service_order.draft.vehicle_updated",
            DraftEvent::ServicesUpdated(_) => "service_order.draft.services_updated",
            DraftEvent::DiscountUpdated(_) => "service_order.draft.discount_updated",
            DraftEvent::TaxesUpdated(_) => "service_order.draft.taxes_updated",
            DraftEvent::DescriptionUpdated(_) => "service_order.draft.description_updated",
            DraftEvent::ObservationsUpdated(_) => "service_order.draft.observations_updated",
            DraftEvent::DraftReset(_) => "service_order.draft.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DraftEvent::CustomerUpdated(e) => e.occurred_at,
            DraftEvent::AddressUpdated(e) => e.occurred_at,
            DraftEvent::VehicleUpdated(e) => e.occurred_at,
            DraftEvent::ServicesUpdated(e) => e.occurred_at,
            DraftEvent::DiscountUpdated(e) | DraftEvent::TaxesUpdated(e) => e.occurred_at,
            DraftEvent::DescriptionUpdated(e) | DraftEvent::ObservationsUpdated(e) => e.occurred_at,
            DraftEvent::DraftReset(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Draft {
    type Command = DraftCommand;
    type Event = DraftEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DraftEvent::CustomerUpdated(e) => {
                self.customer = Some(Slice::new(e.data.clone(), e.existing_id));
            }
            DraftEvent::AddressUpdated(e) => {
                self.address = Some(Slice::new(e.data.clone(), e.existing_id));
            }
            DraftEvent::VehicleUpdated(e) => {
                self.vehicle = Some(Slice::new(e.data.clone(), e.existing_id));
            }
            DraftEvent::ServicesUpdated(e) => {
                self.services = e.items.clone();
                self.set_totals(e.totals);
            }
            DraftEvent::DiscountUpdated(e) => {
                self.discount = e.amount;
                self.set_totals(e.totals);
            }
            DraftEvent::TaxesUpdated(e) => {
                self.taxes = e.amount;
                self.set_totals(e.totals);
            }
            DraftEvent::DescriptionUpdated(e) => {
                self.description = e.text.clone();
            }
            DraftEvent::ObservationsUpdated(e) => {
                self.observations = e.text.clone();
            }
            DraftEvent::DraftReset(e) => {
                *self = Draft::new(e.order_number.clone(), e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let order_number = self.order_number.clone();
        let event = match command {
            DraftCommand::UpdateCustomer(cmd) => DraftEvent::CustomerUpdated(SliceUpdated {
                order_number,
                data: cmd.data.clone(),
                existing_id: cmd.existing_id,
                occurred_at: cmd.occurred_at,
            }),
            DraftCommand::UpdateAddress(cmd) => DraftEvent::AddressUpdated(SliceUpdated {
                order_number,
                data: cmd.data.clone(),
                existing_id: cmd.existing_id,
                occurred_at: cmd.occurred_at,
            }),
            DraftCommand::UpdateVehicle(cmd) => DraftEvent::VehicleUpdated(SliceUpdated {
                order_number,
                data: cmd.data.clone(),
                existing_id: cmd.existing_id,
                occurred_at: cmd.occurred_at,
            }),
            DraftCommand::UpdateServices(cmd) => {
                validate_lines(&cmd.items)?;
                DraftEvent::ServicesUpdated(ServicesUpdated {
                    order_number,
                    items: cmd.items.clone(),
                    totals: compute_totals(&cmd.items, self.discount, self.taxes)?,
                    occurred_at: cmd.occurred_at,
                })
            }
            DraftCommand::UpdateDiscount(cmd) => {
                let amount = non_negative("discount", cmd.amount);
                DraftEvent::DiscountUpdated(AmountUpdated {
                    order_number,
                    amount,
                    totals: compute_totals(&self.services, amount, self.taxes)?,
                    occurred_at: cmd.occurred_at,
                })
            }
            DraftCommand::UpdateTaxes(cmd) => {
                let amount = non_negative("taxes", cmd.amount);
                DraftEvent::TaxesUpdated(AmountUpdated {
                    order_number,
                    amount,
                    totals: compute_totals(&self.services, self.discount, amount)?,
                    occurred_at: cmd.occurred_at,
                })
            }
            DraftCommand::UpdateDescription(cmd) => DraftEvent::DescriptionUpdated(TextUpdated {
                order_number,
                text: cmd.text.clone(),
                occurred_at: cmd.occurred_at,
            }),
            DraftCommand::UpdateObservations(cmd) => DraftEvent::ObservationsUpdated(TextUpdated {
                order_number,
                text: cmd.text.clone(),
                occurred_at: cmd.occurred_at,
            }),
        };

        Ok(vec![event])
    }
}

pub(crate) fn validate_lines(items: &[LineItem]) -> Result<(), DomainError> {
    for (index, item) in items.iter().enumerate() {
        let line_no = index + 1;
        if item.quantity == 0 {
            return Err(DomainError::validation(format!(
                "line {line_no}: quantity must be positive"
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "line {line_no}: unit price cannot be negative"
            )));
        }
        if item.name.trim().is_empty() {
            return Err(DomainError::validation(format!("line {line_no}: name is required")));
        }
        if item.checked_line_total().is_none() {
            return Err(DomainError::out_of_range(format!(
                "line {line_no}: {} x {}",
                item.unit_price, item.quantity
            )));
        }
    }
    Ok(())
}

/// Negative adjustments are clamped to zero.
fn non_negative(field: &'static str, amount: Decimal) -> Decimal {
    if amount < Decimal::ZERO {
        tracing::warn!(field, %amount, "negative adjustment clamped to zero");
        Decimal::ZERO
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::fixtures;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_draft() -> Draft {
        Draft::new(OrderNumber::new("20260101-000001"), test_time())
    }

    fn line(price: Decimal, quantity: u32) -> LineItem {
        LineItem::new(
            CatalogItemId::new(),
            "SRV-01",
            "Oil change",
            LineKind::Service,
            price,
            quantity,
        )
    }

    fn execute(draft: &mut Draft, command: DraftCommand) {
        let events = draft.handle(&command).unwrap();
        for event in &events {
            draft.apply(event);
        }
    }

    fn services(items: Vec<LineItem>) -> DraftCommand {
        DraftCommand::UpdateServices(UpdateServices {
            items,
            occurred_at: test_time(),
        })
    }

    fn discount(amount: Decimal) -> DraftCommand {
        DraftCommand::UpdateDiscount(UpdateAmount {
            amount,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn order_numbers_are_dated_and_unique() {
        let now = test_time();
        let a = OrderNumber::generate(now);
        let b = OrderNumber::generate(now);
        assert!(a.as_str().starts_with(&now.format("%Y%m%d").to_string()));
        assert_eq!(a.as_str().len(), 15);
        assert_ne!(a, b);
    }

    #[test]
    fn totals_follow_lines_discount_and_taxes() {
        let mut draft = test_draft();
        execute(&mut draft, services(vec![line(dec!(100), 2), line(dec!(50), 1)]));
        execute(&mut draft, discount(dec!(20)));

        assert_eq!(draft.subtotal(), dec!(250));
        assert_eq!(draft.total(), dec!(230));
        assert_eq!(draft.services()[0].line_total(), dec!(200));
    }

    #[test]
    fn taxes_are_added_to_the_total() {
        let mut draft = test_draft();
        execute(&mut draft, services(vec![line(dec!(80.50), 2)]));
        execute(
            &mut draft,
            DraftCommand::UpdateTaxes(UpdateAmount {
                amount: dec!(9.90),
                occurred_at: test_time(),
            }),
        );
        assert_eq!(draft.total(), dec!(170.90));
    }

    #[test]
    fn negative_discount_is_clamped_to_zero() {
        let mut draft = test_draft();
        execute(&mut draft, services(vec![line(dec!(10), 1)]));

        let events = draft.handle(&discount(dec!(-5))).unwrap();
        match &events[0] {
            DraftEvent::DiscountUpdated(e) => assert_eq!(e.amount, Decimal::ZERO),
            other => panic!("expected DiscountUpdated, got {other:?}"),
        }
        draft.apply(&events[0]);
        assert_eq!(draft.total(), dec!(10));
    }

    #[test]
    fn zero_quantity_lines_are_rejected() {
        let draft = test_draft();
        let err = draft.handle(&services(vec![line(dec!(10), 0)])).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("quantity must be positive") => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_prices_are_rejected() {
        let draft = test_draft();
        let err = draft.handle(&services(vec![line(dec!(-1), 1)])).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn slice_exists_flag_tracks_existing_id() {
        let mut draft = test_draft();
        execute(
            &mut draft,
            DraftCommand::UpdateCustomer(UpdateSlice {
                data: fixtures::owner(),
                existing_id: None,
                occurred_at: test_time(),
            }),
        );
        assert!(!draft.customer().unwrap().exists());

        let id = CustomerId::new();
        execute(
            &mut draft,
            DraftCommand::UpdateCustomer(UpdateSlice {
                data: fixtures::owner(),
                existing_id: Some(id),
                occurred_at: test_time(),
            }),
        );
        let customer = draft.customer().unwrap();
        assert!(customer.exists());
        assert_eq!(customer.id(), Some(id));
    }

    #[test]
    fn readiness_requires_every_slice_and_a_line() {
        let mut draft = test_draft();
        assert_eq!(
            draft.missing_requirements(),
            vec![
                Requirement::Customer,
                Requirement::Address,
                Requirement::Vehicle,
                Requirement::Services
            ]
        );

        execute(
            &mut draft,
            DraftCommand::UpdateCustomer(UpdateSlice {
                data: fixtures::owner(),
                existing_id: None,
                occurred_at: test_time(),
            }),
        );
        execute(
            &mut draft,
            DraftCommand::UpdateAddress(UpdateSlice {
                data: fixtures::address(),
                existing_id: None,
                occurred_at: test_time(),
            }),
        );
        execute(&mut draft, services(vec![line(dec!(10), 1)]));
        assert!(!draft.is_ready_to_finalize());
        assert_eq!(draft.missing_requirements(), vec![Requirement::Vehicle]);

        execute(
            &mut draft,
            DraftCommand::UpdateVehicle(UpdateSlice {
                data: fixtures::vehicle(),
                existing_id: None,
                occurred_at: test_time(),
            }),
        );
        assert!(draft.is_ready_to_finalize());

        execute(&mut draft, services(Vec::new()));
        assert!(!draft.is_ready_to_finalize());
    }

    #[test]
    fn summary_uses_display_strings() {
        let mut draft = test_draft();
        execute(
            &mut draft,
            DraftCommand::UpdateVehicle(UpdateSlice {
                data: fixtures::vehicle(),
                existing_id: None,
                occurred_at: test_time(),
            }),
        );
        execute(&mut draft, services(vec![line(dec!(10), 3)]));

        let summary = draft.summary();
        assert_eq!(summary.customer_name, None);
        assert_eq!(summary.vehicle.as_deref(), Some("Fiat Uno 2015 - ABC1D23"));
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.total, dec!(30));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let draft = test_draft();
        let before = draft.clone();
        let _ = draft.handle(&services(vec![line(dec!(10), 1)])).unwrap();
        assert_eq!(draft, before);
    }

    #[test]
    fn overflowing_totals_are_rejected_before_apply() {
        let mut draft = test_draft();
        execute(
            &mut draft,
            DraftCommand::UpdateTaxes(UpdateAmount {
                amount: Decimal::MAX,
                occurred_at: test_time(),
            }),
        );
        let before = draft.clone();

        let err = draft
            .handle(&services(vec![line(Decimal::MAX, 1)]))
            .unwrap_err();
        assert!(matches!(err, DomainError::AmountOutOfRange(_)));

        let err = draft
            .handle(&services(vec![line(Decimal::MAX, 2)]))
            .unwrap_err();
        assert!(matches!(err, DomainError::AmountOutOfRange(_)));

        let err = draft
            .handle(&services(vec![line(Decimal::MAX, 1), line(dec!(1), 1)]))
            .unwrap_err();
        assert!(matches!(err, DomainError::AmountOutOfRange(_)));
        assert_eq!(draft, before);
    }

    #[test]
    fn compute_totals_reports_overflow() {
        let items = vec![line(Decimal::MAX, 1)];
        assert!(compute_totals(&items, Decimal::ZERO, Decimal::ZERO).is_ok());
        assert!(matches!(
            compute_totals(&items, Decimal::ZERO, dec!(1)),
            Err(DomainError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn reset_event_starts_over_with_new_number() {
        let mut draft = test_draft();
        execute(&mut draft, services(vec![line(dec!(10), 1)]));
        let next = OrderNumber::new("20260101-000002");

        draft.apply(&DraftEvent::DraftReset(DraftReset {
            previous: draft.order_number().clone(),
            order_number: next.clone(),
            occurred_at: test_time(),
        }));

        assert!(draft.is_empty());
        assert_eq!(draft.order_number(), &next);
    }

    #[derive(Debug, Clone)]
    enum Mutation {
        Services(Vec<(i64, u32)>),
        Discount(i64),
        Taxes(i64),
    }

    fn mutation() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            prop::collection::vec((0i64..1_000_000, 1u32..50), 0..6).prop_map(Mutation::Services),
            (-10_000i64..100_000).prop_map(Mutation::Discount),
            (-10_000i64..100_000).prop_map(Mutation::Taxes),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// After any sequence of updates, subtotal is the sum of line totals
        /// and total = subtotal - discount + taxes.
        #[test]
        fn totals_invariant_holds_after_every_update(mutations in prop::collection::vec(mutation(), 1..20)) {
            let mut draft = test_draft();

            for m in mutations {
                let command = match m {
                    Mutation::Services(lines) => services(
                        lines
                            .into_iter()
                            .map(|(cents, qty)| line(Decimal::new(cents, 2), qty))
                            .collect(),
                    ),
                    Mutation::Discount(cents) => discount(Decimal::new(cents, 2)),
                    Mutation::Taxes(cents) => DraftCommand::UpdateTaxes(UpdateAmount {
                        amount: Decimal::new(cents, 2),
                        occurred_at: test_time(),
                    }),
                };
                execute(&mut draft, command);

                let expected_subtotal: Decimal = draft
                    .services()
                    .iter()
                    .map(|i| i.unit_price * Decimal::from(i.quantity))
                    .sum();
                prop_assert_eq!(draft.subtotal(), expected_subtotal);
                prop_assert_eq!(draft.total(), draft.subtotal() - draft.discount() + draft.taxes());
                prop_assert!(draft.discount() >= Decimal::ZERO);
                prop_assert!(draft.taxes() >= Decimal::ZERO);
            }
        }
    }
}

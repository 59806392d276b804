//! Linear navigation around the step controllers.
//!
//! Owner → Address → Vehicle → Services → Review. Moving forward asks the
//! mounted step to save and only advances when it did; moving back never
//! validates.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::assembler::{self, FinalizeError, ServiceOrderGateway, SubmitReceipt};
use crate::config::WizardConfig;
use crate::coordinator::{SaveCoordinator, SaveError};
use crate::draft::{DraftSummary, OrderNumber};
use crate::steps::StepKind;
use crate::store::DraftStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Owner,
    Address,
    Vehicle,
    Services,
    Review,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 5] = [
        WizardStep::Owner,
        WizardStep::Address,
        WizardStep::Vehicle,
        WizardStep::Services,
        WizardStep::Review,
    ];

    /// The controller shown at this position; Review has none.
    pub fn step_kind(self) -> Option<StepKind> {
        match self {
            WizardStep::Owner => Some(StepKind::Owner),
            WizardStep::Address => Some(StepKind::Address),
            WizardStep::Vehicle => Some(StepKind::Vehicle),
            WizardStep::Services => Some(StepKind::Services),
            WizardStep::Review => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("already at the last step")]
    AtLastStep,
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Finalize(#[from] FinalizeError),
}

/// One wizard session: a draft store, the save channel to the mounted step
/// and the current position.
#[derive(Debug)]
pub struct Wizard {
    store: Arc<DraftStore>,
    coordinator: SaveCoordinator,
    position: WizardStep,
}

impl Wizard {
    pub fn new(config: WizardConfig) -> Self {
        Self::with_store(Arc::new(DraftStore::new()), config)
    }

    pub fn with_store(store: Arc<DraftStore>, config: WizardConfig) -> Self {
        tracing::info!(
            order_number = %store.current_draft().order_number(),
            "wizard session started"
        );
        Self {
            store,
            coordinator: SaveCoordinator::new(config.save_timeout),
            position: WizardStep::Owner,
        }
    }

    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }

    /// Steps mount themselves here when shown.
    pub fn coordinator(&self) -> &SaveCoordinator {
        &self.coordinator
    }

    pub fn position(&self) -> WizardStep {
        self.position
    }

    pub fn summary(&self) -> DraftSummary {
        self.store.summary()
    }

    /// Save the step shown at the current position and move forward.
    ///
    /// A different mounted step is never asked to save.
    pub async fn next(&mut self) -> Result<WizardStep, WizardError> {
        let next = self.position.next().ok_or(WizardError::AtLastStep)?;
        let expected = self.position.step_kind().ok_or(WizardError::AtLastStep)?;

        self.coordinator.request_save_for(expected).await?;

        self.position = next;
        tracing::debug!(position = ?next, "wizard advanced");
        Ok(next)
    }

    /// Move back without saving; stays put at the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.position.previous() {
            self.position = previous;
        }
        self.position
    }

    /// Drop everything captured so far and start over.
    pub fn cancel(&mut self) -> OrderNumber {
        let order_number = self.store.reset();
        self.position = WizardStep::Owner;
        tracing::info!(order_number = %order_number, "wizard cancelled");
        order_number
    }

    /// Submit the draft; on success the session restarts at the first step.
    pub async fn finalize(
        &mut self,
        gateway: &dyn ServiceOrderGateway,
    ) -> Result<SubmitReceipt, WizardError> {
        let receipt = assembler::finalize(&self.store, gateway).await?;
        self.position = WizardStep::Owner;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assembler::fakes::RecordingGateway;
    use crate::draft::{LineItem, LineKind};
    use crate::forms::{AddressData, fixtures};
    use crate::lookup::fakes::Scripted;
    use crate::lookup::{AddressRecord, CustomerRecord, VehicleRecord};
    use crate::steps::{AddressStep, OwnerStep, ServicesStep, Step, VehicleStep};
    use autoshop_core::{AddressId, CatalogItemId, CustomerId};
    use rust_decimal_macros::dec;

    fn wizard() -> Wizard {
        Wizard::new(WizardConfig {
            save_timeout: Duration::from_millis(200),
        })
    }

    async fn advance<S: Step>(wizard: &mut Wizard, step: &mut S) -> Result<WizardStep, WizardError> {
        let store = Arc::clone(wizard.store());
        let mut mounted = wizard.coordinator().mount(step.kind());
        let (result, _) = tokio::join!(wizard.next(), mounted.serve_next(step, &store));
        result
    }

    #[test]
    fn positions_are_linear() {
        assert_eq!(WizardStep::Owner.previous(), None);
        assert_eq!(WizardStep::Owner.next(), Some(WizardStep::Address));
        assert_eq!(WizardStep::Services.next(), Some(WizardStep::Review));
        assert_eq!(WizardStep::Review.next(), None);
        assert_eq!(WizardStep::Review.step_kind(), None);
    }

    #[test]
    fn back_needs_no_validation() {
        let mut wizard = wizard();
        assert_eq!(wizard.back(), WizardStep::Owner);
    }

    #[tokio::test]
    async fn invalid_step_blocks_navigation() {
        let mut wizard = wizard();
        let mut owner = OwnerStep::new(Arc::new(Scripted::<CustomerRecord>::new(Ok(None))));

        let result = advance(&mut wizard, &mut owner).await;

        assert_eq!(
            result,
            Err(WizardError::Save(SaveError::Rejected(StepKind::Owner)))
        );
        assert_eq!(wizard.position(), WizardStep::Owner);
        assert!(owner.form().is_touched("name"));
    }

    #[tokio::test]
    async fn nothing_mounted_blocks_navigation() {
        let mut wizard = wizard();
        assert_eq!(
            wizard.next().await,
            Err(WizardError::Save(SaveError::NoActiveStep))
        );
        assert_eq!(wizard.position(), WizardStep::Owner);
    }

    #[tokio::test]
    async fn leftover_step_cannot_advance_another_position() {
        let mut wizard = wizard();
        let store = Arc::clone(wizard.store());
        let mut owner = OwnerStep::new(Arc::new(Scripted::<CustomerRecord>::new(Ok(None))));
        owner.form_mut().replace(fixtures::owner());
        assert_eq!(advance(&mut wizard, &mut owner).await, Ok(WizardStep::Address));

        let _still_owner = wizard.coordinator().mount(StepKind::Owner);
        let result = wizard.next().await;

        assert_eq!(
            result,
            Err(WizardError::Save(SaveError::WrongStep {
                expected: StepKind::Address,
                mounted: StepKind::Owner,
            }))
        );
        assert_eq!(wizard.position(), WizardStep::Address);
        assert!(store.current_draft().address().is_none());
    }

    #[tokio::test]
    async fn full_session_submits_and_restarts() {
        let mut wizard = wizard();
        let store = Arc::clone(wizard.store());
        let first_number = store.current_draft().order_number().clone();

        let customer = CustomerRecord {
            id: CustomerId::new(),
            data: fixtures::owner(),
            address: Some(AddressRecord {
                id: AddressId::new(),
                data: fixtures::address(),
            }),
        };
        let mut owner = OwnerStep::new(Arc::new(Scripted::new(Ok(Some(customer)))));
        assert!(owner.search("52998224725", &store).await.is_found());
        assert_eq!(advance(&mut wizard, &mut owner).await, Ok(WizardStep::Address));

        // address was prefilled by the customer lookup
        let mut address =
            AddressStep::mount(Arc::new(Scripted::<AddressData>::new(Ok(None))), &store.current_draft());
        assert!(address.address_id().is_some());
        assert_eq!(advance(&mut wizard, &mut address).await, Ok(WizardStep::Vehicle));

        let mut vehicle = VehicleStep::new(Arc::new(Scripted::<VehicleRecord>::new(Ok(None))));
        vehicle.form_mut().replace(fixtures::vehicle());
        assert_eq!(advance(&mut wizard, &mut vehicle).await, Ok(WizardStep::Services));

        let mut services = ServicesStep::mount(&store.current_draft());
        services
            .add_item(LineItem::new(
                CatalogItemId::new(),
                "S-10",
                "Brake inspection",
                LineKind::Service,
                dec!(120),
                1,
            ))
            .unwrap();
        assert_eq!(advance(&mut wizard, &mut services).await, Ok(WizardStep::Review));
        assert_eq!(wizard.next().await, Err(WizardError::AtLastStep));

        let summary = wizard.summary();
        assert_eq!(summary.customer_name.as_deref(), Some("Maria Souza"));
        assert_eq!(summary.total, dec!(120));

        let gateway = RecordingGateway::accepting();
        wizard.finalize(&gateway).await.unwrap();

        assert_eq!(wizard.position(), WizardStep::Owner);
        assert!(store.current_draft().is_empty());
        assert_ne!(store.current_draft().order_number(), &first_number);
        let submitted = gateway.submitted.lock().unwrap();
        assert!(submitted[0].customer.id.is_some());
        assert!(submitted[0].address.id.is_some());
        assert!(submitted[0].vehicle.id.is_none());
    }

    #[tokio::test]
    async fn finalize_refuses_incomplete_draft() {
        let mut wizard = wizard();
        let gateway = RecordingGateway::accepting();

        let err = wizard.finalize(&gateway).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Finalize(FinalizeError::NotReady(_))
        ));
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn cancel_resets_draft_and_position() {
        let mut wizard = wizard();
        wizard
            .store()
            .update_customer_data(fixtures::owner(), None)
            .unwrap();

        let fresh = wizard.cancel();

        assert_eq!(wizard.position(), WizardStep::Owner);
        let draft = wizard.store().current_draft();
        assert!(draft.is_empty());
        assert_eq!(draft.order_number(), &fresh);
    }
}

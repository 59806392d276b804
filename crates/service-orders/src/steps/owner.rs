use std::sync::Arc;

use autoshop_core::CustomerId;

use crate::draft::Draft;
use crate::format;
use crate::forms::OwnerData;
use crate::lookup::{CustomerLookup, SearchOutcome};
use crate::store::DraftStore;

use super::{FormState, Step, StepError, StepKind};

const CPF_DIGITS: usize = 11;

/// Vehicle owner step: CPF search plus manual entry.
pub struct OwnerStep {
    form: FormState<OwnerData>,
    customer_id: Option<CustomerId>,
    /// Document the current `customer_id` was found by.
    found_document: Option<String>,
    lookup: Arc<dyn CustomerLookup>,
}

impl OwnerStep {
    pub fn new(lookup: Arc<dyn CustomerLookup>) -> Self {
        Self {
            form: FormState::new(OwnerData::default()),
            customer_id: None,
            found_document: None,
            lookup,
        }
    }

    /// New step pre-filled from `draft`.
    pub fn mount(lookup: Arc<dyn CustomerLookup>, draft: &Draft) -> Self {
        let mut step = Self::new(lookup);
        step.load(draft);
        step
    }

    pub fn form(&self) -> &FormState<OwnerData> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState<OwnerData> {
        &mut self.form
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Edit the document field. Moving away from the document a customer
    /// was found by detaches that customer.
    pub fn set_document(&mut self, raw: &str) {
        let digits = format::digits_only(raw);
        if self.found_document.as_deref() != Some(digits.as_str()) {
            self.forget_customer();
        }
        self.form.values_mut().document = digits;
        self.form.touch("document");
    }

    /// Look the customer up by CPF.
    ///
    /// When found, the form is overwritten and the customer's stored address
    /// is written straight into the draft so the address step opens
    /// pre-filled. Otherwise the typed document stays for manual entry.
    pub async fn search(&mut self, raw_document: &str, store: &DraftStore) -> SearchOutcome {
        self.set_document(raw_document);
        let document = self.form.values().document.clone();
        if document.len() != CPF_DIGITS {
            return SearchOutcome::InvalidKey;
        }

        match self.lookup.find_by_document(&document).await {
            Ok(Some(record)) => {
                tracing::info!(customer_id = %record.id, "customer found by document");
                let mut data = record.data;
                data.document = document.clone();
                self.form.replace(data);
                self.customer_id = Some(record.id);
                self.found_document = Some(document);

                if let Some(address) = record.address {
                    if let Err(err) = store.update_address_data(address.data, Some(address.id)) {
                        tracing::warn!(%err, "could not prefill customer address");
                    }
                }
                SearchOutcome::Found
            }
            Ok(None) => {
                tracing::debug!("no customer for document; manual entry");
                self.forget_customer();
                SearchOutcome::NotFound
            }
            Err(err) => {
                tracing::warn!(%err, "customer lookup failed; manual entry");
                self.forget_customer();
                SearchOutcome::Unavailable(err.to_string())
            }
        }
    }

    fn forget_customer(&mut self) {
        self.customer_id = None;
        self.found_document = None;
    }
}

impl Step for OwnerStep {
    fn kind(&self) -> StepKind {
        StepKind::Owner
    }

    fn load(&mut self, draft: &Draft) {
        match draft.customer() {
            Some(slice) => {
                self.form.replace(slice.data().clone());
                self.customer_id = slice.id();
                self.found_document = slice.id().map(|_| slice.data().document.clone());
            }
            None => {
                self.form.replace(OwnerData::default());
                self.forget_customer();
            }
        }
    }

    fn save(&mut self, store: &DraftStore) -> Result<(), StepError> {
        let data = self.form.validate_for_save().map_err(StepError::Validation)?;
        store.update_customer_data(data, self.customer_id)?;
        Ok(())
    }
}

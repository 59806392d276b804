use std::sync::Arc;

use autoshop_core::AddressId;

use crate::draft::Draft;
use crate::format;
use crate::forms::AddressData;
use crate::lookup::{PostalCodeLookup, SearchOutcome};
use crate::store::DraftStore;

use super::{FormState, Step, StepError, StepKind};

const CEP_DIGITS: usize = 8;

/// Service address step: CEP search fills street, district, city and state.
pub struct AddressStep {
    form: FormState<AddressData>,
    address_id: Option<AddressId>,
    /// CEP of the stored address `address_id` refers to.
    stored_postal_code: Option<String>,
    lookup: Arc<dyn PostalCodeLookup>,
}

impl AddressStep {
    pub fn new(lookup: Arc<dyn PostalCodeLookup>) -> Self {
        Self {
            form: FormState::new(AddressData::default()),
            address_id: None,
            stored_postal_code: None,
            lookup,
        }
    }

    pub fn mount(lookup: Arc<dyn PostalCodeLookup>, draft: &Draft) -> Self {
        let mut step = Self::new(lookup);
        step.load(draft);
        step
    }

    pub fn form(&self) -> &FormState<AddressData> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState<AddressData> {
        &mut self.form
    }

    pub fn address_id(&self) -> Option<AddressId> {
        self.address_id
    }

    /// Edit the CEP field. A different CEP no longer describes the stored
    /// address, so its id is dropped.
    pub fn set_postal_code(&mut self, raw: &str) {
        let digits = format::digits_only(raw);
        if self.stored_postal_code.as_deref() != Some(digits.as_str()) {
            self.address_id = None;
            self.stored_postal_code = None;
        }
        self.form.values_mut().postal_code = digits;
        self.form.touch("postal_code");
    }

    /// Fill the address from a CEP. Only `number` is kept; on a miss or
    /// failure the form is left as typed.
    pub async fn search(&mut self, raw_postal_code: &str) -> SearchOutcome {
        self.set_postal_code(raw_postal_code);
        let postal_code = self.form.values().postal_code.clone();
        if postal_code.len() != CEP_DIGITS {
            return SearchOutcome::InvalidKey;
        }

        match self.lookup.find_by_postal_code(&postal_code).await {
            Ok(Some(found)) => {
                tracing::debug!(postal_code = %postal_code, city = %found.city, "postal code resolved");
                let values = self.form.values_mut();
                values.street = found.street;
                values.complement = found.complement;
                values.district = found.district;
                values.city = found.city;
                values.state = found.state;
                for field in ["street", "complement", "district", "city", "state"] {
                    self.form.touch(field);
                }
                SearchOutcome::Found
            }
            Ok(None) => {
                tracing::debug!(postal_code = %postal_code, "unknown postal code; manual entry");
                SearchOutcome::NotFound
            }
            Err(err) => {
                tracing::warn!(%err, "postal code lookup failed; manual entry");
                SearchOutcome::Unavailable(err.to_string())
            }
        }
    }
}

impl Step for AddressStep {
    fn kind(&self) -> StepKind {
        StepKind::Address
    }

    fn load(&mut self, draft: &Draft) {
        match draft.address() {
            Some(slice) => {
                self.form.replace(slice.data().clone());
                self.address_id = slice.id();
                self.stored_postal_code = slice.id().map(|_| slice.data().postal_code.clone());
            }
            None => {
                self.form.replace(AddressData::default());
                self.address_id = None;
                self.stored_postal_code = None;
            }
        }
    }

    fn save(&mut self, store: &DraftStore) -> Result<(), StepError> {
        let data = self.form.validate_for_save().map_err(StepError::Validation)?;
        store.update_address_data(data, self.address_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::fixtures;
    use crate::lookup::LookupError;
    use crate::lookup::fakes::Scripted;

    fn lookup(answer: Result<Option<AddressData>, LookupError>) -> Arc<Scripted<AddressData>> {
        Arc::new(Scripted::new(answer))
    }

    fn paulista() -> AddressData {
        AddressData {
            number: String::new(),
            complement: "lado ímpar".into(),
            ..fixtures::address()
        }
    }

    #[tokio::test]
    async fn search_fills_location_but_keeps_number() {
        let mut step = AddressStep::new(lookup(Ok(Some(paulista()))));
        step.form_mut().values_mut().number = "1000".into();
        step.form_mut().values_mut().complement = "sala 4".into();

        assert_eq!(step.search("01310-100").await, SearchOutcome::Found);
        let values = step.form().values();
        assert_eq!(values.postal_code, "01310100");
        assert_eq!(values.street, "Avenida Paulista");
        assert_eq!(values.city, "São Paulo");
        assert_eq!(values.state, "SP");
        assert_eq!(values.number, "1000");
        assert_eq!(values.complement, "lado ímpar");
    }

    #[tokio::test]
    async fn unknown_postal_code_keeps_typed_values() {
        let mut step = AddressStep::new(lookup(Ok(None)));
        step.form_mut().values_mut().street = "Rua Nova".into();

        assert_eq!(step.search("99999999").await, SearchOutcome::NotFound);
        assert_eq!(step.form().values().street, "Rua Nova");
        assert_eq!(step.form().values().postal_code, "99999999");
    }

    #[tokio::test]
    async fn malformed_postal_code_skips_lookup() {
        let fake = lookup(Ok(Some(paulista())));
        let mut step = AddressStep::new(fake.clone());

        assert_eq!(step.search("0131").await, SearchOutcome::InvalidKey);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn failure_is_not_fatal() {
        let mut step = AddressStep::new(lookup(Err(LookupError::Backend {
            status: 503,
            message: "unavailable".into(),
        })));
        assert!(matches!(
            step.search("01310100").await,
            SearchOutcome::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn searching_another_cep_drops_stored_address_id() {
        let store = DraftStore::new();
        let id = AddressId::new();
        store.update_address_data(fixtures::address(), Some(id)).unwrap();
        let other = AddressData {
            postal_code: "20040002".into(),
            street: "Avenida Rio Branco".into(),
            number: String::new(),
            complement: String::new(),
            district: "Centro".into(),
            city: "Rio de Janeiro".into(),
            state: "RJ".into(),
        };
        let mut step = AddressStep::mount(lookup(Ok(Some(other))), &store.current_draft());
        assert_eq!(step.address_id(), Some(id));

        step.search("20040-002").await;
        assert_eq!(step.address_id(), None);

        step.save(&store).unwrap();
        let draft = store.current_draft();
        let saved = draft.address().unwrap();
        assert!(!saved.exists());
        assert_eq!(saved.data().city, "Rio de Janeiro");
    }

    #[test]
    fn save_keeps_existing_id_when_unchanged() {
        let store = DraftStore::new();
        let id = AddressId::new();
        store.update_address_data(fixtures::address(), Some(id)).unwrap();

        let mut step = AddressStep::mount(lookup(Ok(None)), &store.current_draft());
        step.form_mut().values_mut().complement = "apto 12".into();
        step.save(&store).unwrap();

        let draft = store.current_draft();
        assert_eq!(draft.address().unwrap().id(), Some(id));
        assert_eq!(draft.address().unwrap().data().complement, "apto 12");
    }

    #[test]
    fn incomplete_address_is_rejected() {
        let store = DraftStore::new();
        let mut step = AddressStep::new(lookup(Ok(None)));
        step.form_mut().values_mut().postal_code = "01310100".into();

        match step.save(&store) {
            Err(StepError::Validation(errors)) => {
                assert!(errors.contains("street"));
                assert!(errors.contains("number"));
                assert!(!errors.contains("postal_code"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.current_draft().address().is_none());
    }
}

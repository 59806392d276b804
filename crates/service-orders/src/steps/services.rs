use rust_decimal::Decimal;
use validator::Validate;

use autoshop_core::{CatalogItemId, DomainError};

use crate::draft::{Draft, LineItem, Totals, compute_totals, validate_lines};
use crate::forms::FormFields;
use crate::store::DraftStore;

use super::{FormState, Step, StepError, StepKind};

/// Local state of the services step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Validate)]
pub struct ServicesForm {
    #[validate(length(min = 1, message = "add at least one service or product"))]
    pub items: Vec<LineItem>,
    pub discount: Decimal,
    pub taxes: Decimal,
    pub description: String,
    pub observations: String,
}

impl FormFields for ServicesForm {
    const FIELDS: &'static [&'static str] =
        &["items", "discount", "taxes", "description", "observations"];
}

/// Services and products step, plus the order's adjustments and notes.
pub struct ServicesStep {
    form: FormState<ServicesForm>,
}

impl Default for ServicesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl ServicesStep {
    pub fn new() -> Self {
        Self {
            form: FormState::new(ServicesForm::default()),
        }
    }

    pub fn mount(draft: &Draft) -> Self {
        let mut step = Self::new();
        step.load(draft);
        step
    }

    pub fn form(&self) -> &FormState<ServicesForm> {
        &self.form
    }

    pub fn items(&self) -> &[LineItem] {
        &self.form.values().items
    }

    /// Add a line. Adding a catalog item already present bumps its quantity.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), StepError> {
        validate_lines(std::slice::from_ref(&item))?;

        let items = &mut self.form.values_mut().items;
        match items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                let quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| DomainError::validation("quantity too large"))?;
                line.set_quantity(quantity);
            }
            None => items.push(item),
        }
        self.form.touch("items");
        Ok(())
    }

    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, id: CatalogItemId) -> bool {
        let items = &mut self.form.values_mut().items;
        let before = items.len();
        items.retain(|line| line.id != id);
        let removed = items.len() != before;
        if removed {
            self.form.touch("items");
        }
        removed
    }

    pub fn set_quantity(&mut self, id: CatalogItemId, quantity: u32) -> Result<(), StepError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive").into());
        }
        let line = self
            .form
            .values_mut()
            .items
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or_else(|| DomainError::validation(format!("no line for item {id}")))?;
        line.set_quantity(quantity);
        self.form.touch("items");
        Ok(())
    }

    pub fn set_discount(&mut self, amount: Decimal) {
        self.form.values_mut().discount = amount;
        self.form.touch("discount");
    }

    pub fn set_taxes(&mut self, amount: Decimal) {
        self.form.values_mut().taxes = amount;
        self.form.touch("taxes");
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.form.values_mut().description = text.into();
        self.form.touch("description");
    }

    pub fn set_observations(&mut self, text: impl Into<String>) {
        self.form.values_mut().observations = text.into();
        self.form.touch("observations");
    }

    /// Totals as they will be once saved (negative adjustments count as zero).
    pub fn preview_totals(&self) -> Result<Totals, StepError> {
        let values = self.form.values();
        Ok(compute_totals(
            &values.items,
            values.discount.max(Decimal::ZERO),
            values.taxes.max(Decimal::ZERO),
        )?)
    }
}

impl Step for ServicesStep {
    fn kind(&self) -> StepKind {
        StepKind::Services
    }

    fn load(&mut self, draft: &Draft) {
        self.form.replace(ServicesForm {
            items: draft.services().to_vec(),
            discount: draft.discount(),
            taxes: draft.taxes(),
            description: draft.description().to_string(),
            observations: draft.observations().to_string(),
        });
    }

    fn save(&mut self, store: &DraftStore) -> Result<(), StepError> {
        let form = self.form.validate_for_save().map_err(StepError::Validation)?;
        // Lines first: a rejected line set leaves the rest of the draft as is.
        store.update_services(form.items)?;
        store.update_discount(form.discount)?;
        store.update_taxes(form.taxes)?;
        store.update_description(form.description)?;
        store.update_observations(form.observations)?;
        Ok(())
    }
}

use std::sync::Arc;

use autoshop_core::VehicleId;

use crate::draft::Draft;
use crate::format;
use crate::forms::VehicleData;
use crate::lookup::{PlateLookup, SearchOutcome};
use crate::store::DraftStore;

use super::{FormState, Step, StepError, StepKind};

pub struct VehicleStep {
    form: FormState<VehicleData>,
    vehicle_id: Option<VehicleId>,
    lookup: Arc<dyn PlateLookup>,
}

impl VehicleStep {
    pub fn new(lookup: Arc<dyn PlateLookup>) -> Self {
        Self {
            form: FormState::new(VehicleData::default()),
            vehicle_id: None,
            lookup,
        }
    }

    pub fn mount(lookup: Arc<dyn PlateLookup>, draft: &Draft) -> Self {
        let mut step = Self::new(lookup);
        step.load(draft);
        step
    }

    pub fn form(&self) -> &FormState<VehicleData> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState<VehicleData> {
        &mut self.form
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle_id
    }

    /// Edit the plate; any previously found vehicle no longer applies.
    pub fn set_plate(&mut self, raw: &str) {
        let plate = format::normalize_plate(raw);
        if plate != self.form.values().plate {
            self.vehicle_id = None;
        }
        self.form.values_mut().plate = plate;
        self.form.touch("plate");
    }

    /// Fill the vehicle from its plate. Mileage typed by the user survives
    /// when the lookup does not report one.
    pub async fn search(&mut self, raw_plate: &str) -> SearchOutcome {
        self.set_plate(raw_plate);
        let plate = self.form.values().plate.clone();
        if !format::is_valid_plate(&plate) {
            return SearchOutcome::InvalidKey;
        }

        match self.lookup.find_by_plate(&plate).await {
            Ok(Some(record)) => {
                tracing::info!(plate = %plate, known = record.id.is_some(), "vehicle found by plate");
                let mut data = record.data;
                data.plate = plate;
                if data.mileage.is_none() {
                    data.mileage = self.form.values().mileage;
                }
                self.form.replace(data);
                self.vehicle_id = record.id;
                SearchOutcome::Found
            }
            Ok(None) => {
                tracing::debug!(plate = %plate, "unknown plate; manual entry");
                self.vehicle_id = None;
                SearchOutcome::NotFound
            }
            Err(err) => {
                tracing::warn!(%err, "plate lookup failed; manual entry");
                self.vehicle_id = None;
                SearchOutcome::Unavailable(err.to_string())
            }
        }
    }
}

impl Step for VehicleStep {
    fn kind(&self) -> StepKind {
        StepKind::Vehicle
    }

    fn load(&mut self, draft: &Draft) {
        match draft.vehicle() {
            Some(slice) => {
                self.form.replace(slice.data().clone());
                self.vehicle_id = slice.id();
            }
            None => {
                self.form.replace(VehicleData::default());
                self.vehicle_id = None;
            }
        }
    }

    fn save(&mut self, store: &DraftStore) -> Result<(), StepError> {
        let data = self.form.validate_for_save().map_err(StepError::Validation)?;
        store.update_vehicle_data(data, self.vehicle_id)?;
        Ok(())
    }
}

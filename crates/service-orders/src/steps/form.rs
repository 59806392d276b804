//! Local form state: values, touched fields and the last validation result.

use std::collections::{BTreeMap, BTreeSet};

use validator::{Validate, ValidationErrors};

use crate::forms::FormFields;

/// Field name → messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), vec![message.into()]);
        Self(map)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let map = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self(map)
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        f.write_str(&fields.join(", "))
    }
}

#[derive(Debug, Clone)]
pub struct FormState<T> {
    values: T,
    touched: BTreeSet<&'static str>,
    errors: FieldErrors,
}

impl<T: Validate + FormFields + Clone> FormState<T> {
    pub fn new(values: T) -> Self {
        Self {
            values,
            touched: BTreeSet::new(),
            errors: FieldErrors::default(),
        }
    }

    pub fn values(&self) -> &T {
        &self.values
    }

    /// Mutable access for field edits; callers `touch` what they changed.
    pub fn values_mut(&mut self) -> &mut T {
        &mut self.values
    }

    /// Replace every value (e.g. from a lookup); touched state is kept.
    pub fn replace(&mut self, values: T) {
        self.values = values;
    }

    pub fn touch(&mut self, field: &'static str) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    pub fn mark_all_touched(&mut self) {
        self.touched.extend(T::FIELDS.iter().copied());
    }

    /// Validate the current values, remembering the result.
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        match self.values.validate() {
            Ok(()) => {
                self.errors = FieldErrors::default();
                Ok(())
            }
            Err(errors) => {
                self.errors = FieldErrors::from(errors);
                Err(self.errors.clone())
            }
        }
    }

    /// Validate for a save: on failure every field becomes touched so all
    /// messages render.
    pub fn validate_for_save(&mut self) -> Result<T, FieldErrors> {
        match self.validate() {
            Ok(()) => Ok(self.values.clone()),
            Err(errors) => {
                self.mark_all_touched();
                Err(errors)
            }
        }
    }

    /// Errors of the last validation restricted to touched fields.
    pub fn visible_errors(&self) -> Vec<&str> {
        self.errors
            .fields()
            .filter(|field| self.touched.contains(*field))
            .collect()
    }
}

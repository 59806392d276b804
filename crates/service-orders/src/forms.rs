//! Records captured by the wizard steps.
//!
//! Each record lives only inside a draft slice. Values are stored
//! normalized (digits only, upper-case plate); display masks are applied by
//! [`crate::format`].

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use autoshop_core::ValueObject;

use crate::dates::DateInput;
use crate::format;

/// Field names of a form, in display order.
pub trait FormFields {
    const FIELDS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
pub struct OwnerData {
    #[validate(custom(function = "validate_required"))]
    pub name: String,
    /// CPF, digits only.
    #[validate(custom(function = "validate_cpf"))]
    pub document: String,
    #[validate(email(message = "invalid e-mail address"))]
    pub email: Option<String>,
    /// Digits only, area code included.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_date"))]
    pub birth_date: Option<DateInput>,
}

impl ValueObject for OwnerData {}

impl FormFields for OwnerData {
    const FIELDS: &'static [&'static str] = &["name", "document", "email", "phone", "birth_date"];
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
pub struct AddressData {
    /// CEP, digits only.
    #[validate(custom(function = "validate_postal_code"))]
    pub postal_code: String,
    #[validate(custom(function = "validate_required"))]
    pub street: String,
    #[validate(custom(function = "validate_required"))]
    pub number: String,
    pub complement: String,
    #[validate(custom(function = "validate_required"))]
    pub district: String,
    #[validate(custom(function = "validate_required"))]
    pub city: String,
    /// Two-letter state code (UF).
    #[validate(custom(function = "validate_state"))]
    pub state: String,
}

impl ValueObject for AddressData {}

impl FormFields for AddressData {
    const FIELDS: &'static [&'static str] = &[
        "postal_code",
        "street",
        "number",
        "complement",
        "district",
        "city",
        "state",
    ];
}

impl AddressData {
    /// `Rua Augusta, 500 - Consolação, São Paulo/SP`
    pub fn display(&self) -> String {
        let mut line = self.street.trim().to_string();
        if !self.number.trim().is_empty() {
            line.push_str(", ");
            line.push_str(self.number.trim());
        }
        if !self.district.trim().is_empty() {
            line.push_str(" - ");
            line.push_str(self.district.trim());
        }
        format!("{line}, {}/{}", self.city.trim(), self.state.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
pub struct VehicleData {
    /// Normalized plate (`ABC1234` or `ABC1D23`).
    #[validate(custom(function = "validate_plate"))]
    pub plate: String,
    #[validate(custom(function = "validate_required"))]
    pub brand: String,
    #[validate(custom(function = "validate_required"))]
    pub model: String,
    #[validate(custom(function = "validate_required"))]
    pub color: String,
    #[validate(range(min = 1900, max = 2100, message = "year out of range"))]
    pub year: u16,
    pub mileage: Option<u32>,
}

impl ValueObject for VehicleData {}

impl FormFields for VehicleData {
    const FIELDS: &'static [&'static str] = &["plate", "brand", "model", "color", "year", "mileage"];
}

impl VehicleData {
    /// `Fiat Uno 2015 - ABC-1234`
    pub fn display(&self) -> String {
        format!(
            "{} {} {} - {}",
            self.brand.trim(),
            self.model.trim(),
            self.year,
            format::mask_plate(&self.plate)
        )
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "this field is required"));
    }
    Ok(())
}

fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    if !format::is_valid_cpf(value) {
        return Err(invalid("cpf", "invalid CPF"));
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = format::digits_only(value);
    if digits.len() != value.len() || !(10..=11).contains(&digits.len()) {
        return Err(invalid("phone", "phone must have 10 or 11 digits"));
    }
    Ok(())
}

fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("postal_code", "postal code must have 8 digits"));
    }
    Ok(())
}

fn validate_state(value: &str) -> Result<(), ValidationError> {
    if value.len() != 2 || !value.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(invalid("state", "state must be a two-letter code"));
    }
    Ok(())
}

fn validate_date(value: &DateInput) -> Result<(), ValidationError> {
    if value.to_naive().is_err() {
        return Err(invalid("date", "invalid date"));
    }
    Ok(())
}

fn validate_plate(value: &str) -> Result<(), ValidationError> {
    if !format::is_valid_plate(value) {
        return Err(invalid("plate", "invalid license plate"));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn invalid_fields(errors: validator::ValidationErrors) -> Vec<String> {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        fields
    }

    #[test]
    fn complete_records_validate() {
        assert!(owner().validate().is_ok());
        assert!(address().validate().is_ok());
        assert!(vehicle().validate().is_ok());
    }

    #[test]
    fn owner_reports_every_broken_field() {
        let data = OwnerData {
            name: "  ".into(),
            document: "12345678900".into(),
            email: Some("not-an-email".into()),
            phone: "123".into(),
            birth_date: None,
        };
        let errors = data.validate().unwrap_err();
        assert_eq!(invalid_fields(errors), vec!["document", "email", "name", "phone"]);
    }

    #[test]
    fn unparseable_birth_date_is_a_field_error() {
        let data = OwnerData {
            birth_date: Some(DateInput::Iso("31/02/1990".into())),
            ..owner()
        };
        let errors = data.validate().unwrap_err();
        assert_eq!(invalid_fields(errors), vec!["birth_date"]);

        let impossible = OwnerData {
            birth_date: Some(DateInput::Parts {
                year: 1990,
                month: 2,
                day: 31,
            }),
            ..owner()
        };
        assert!(impossible.validate().is_err());

        let valid = OwnerData {
            birth_date: Some(DateInput::Iso("1990-05-17".into())),
            ..owner()
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn missing_email_is_allowed() {
        let data = OwnerData { email: None, ..owner() };
        assert!(data.validate().is_ok());
    }

    #[test]
    fn address_requires_normalized_postal_code_and_state() {
        let data = AddressData {
            postal_code: "01310-100".into(),
            state: "sp".into(),
            ..address()
        };
        let errors = data.validate().unwrap_err();
        assert_eq!(invalid_fields(errors), vec!["postal_code", "state"]);
    }

    #[test]
    fn vehicle_year_and_plate_are_checked() {
        let data = VehicleData {
            plate: "abc-1234".into(),
            year: 1800,
            ..vehicle()
        };
        let errors = data.validate().unwrap_err();
        assert_eq!(invalid_fields(errors), vec!["plate", "year"]);
    }

    #[test]
    fn display_strings() {
        assert_eq!(
            address().display(),
            "Avenida Paulista, 1000 - Bela Vista, São Paulo/SP"
        );
        assert_eq!(vehicle().display(), "Fiat Uno 2015 - ABC1D23");
    }
}

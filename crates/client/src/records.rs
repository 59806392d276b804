//! Backend record shapes.
//!
//! The backend's field names drifted over time (`socialNumber` vs
//! `document`, `zipCode` vs `cep`), so the aliases below accept both.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use autoshop_core::{AddressId, CustomerId, from_minor_units};
use autoshop_service_orders::{AddressData, AddressRecord, CustomerRecord, DateInput, OwnerData};
use autoshop_service_orders::format;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CustomerDto {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "socialNumber", alias = "cpf")]
    pub document: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phoneNumber", alias = "cellphone")]
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub address: Option<AddressDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddressDto {
    pub id: Uuid,
    #[serde(default, alias = "zipCode", alias = "cep")]
    pub postal_code: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default, alias = "neighborhood")]
    pub district: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl From<AddressDto> for AddressRecord {
    fn from(dto: AddressDto) -> Self {
        AddressRecord {
            id: AddressId::from_uuid(dto.id),
            data: AddressData {
                postal_code: format::digits_only(&dto.postal_code),
                street: dto.street,
                number: dto.number,
                complement: dto.complement.unwrap_or_default(),
                district: dto.district,
                city: dto.city,
                state: dto.state.trim().to_ascii_uppercase(),
            },
        }
    }
}

impl From<CustomerDto> for CustomerRecord {
    fn from(dto: CustomerDto) -> Self {
        CustomerRecord {
            id: CustomerId::from_uuid(dto.id),
            data: OwnerData {
                name: dto.name,
                document: format::digits_only(&dto.document),
                email: dto.email.filter(|e| !e.trim().is_empty()),
                phone: format::digits_only(&dto.phone),
                birth_date: dto
                    .birth_date
                    .filter(|d| !d.trim().is_empty())
                    .map(DateInput::Iso),
            },
            address: dto.address.map(AddressRecord::from),
        }
    }
}

/// Row of the customer listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "socialNumber")]
    pub document: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Row of the vehicle listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummary {
    pub id: Uuid,
    #[serde(default)]
    pub plate: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

/// Row of the service-order listing. Amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderSummary {
    pub id: Uuid,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub opened_at: Option<NaiveDateTime>,
}

impl ServiceOrderSummary {
    pub fn total_amount(&self) -> Decimal {
        from_minor_units(self.total)
    }
}

/// Row of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_payload_is_normalized() {
        let dto: CustomerDto = serde_json::from_value(json!({
            "id": "0190a5f2-7b3c-7d4e-8f00-112233445566",
            "name": "Maria Souza",
            "socialNumber": "529.982.247-25",
            "phoneNumber": "(11) 98765-4321",
            "email": "",
            "birthDate": "1990-05-17T00:00:00",
            "address": {
                "id": "0190a5f2-7b3c-7d4e-8f00-665544332211",
                "zipCode": "01310-100",
                "street": "Avenida Paulista",
                "number": "1000",
                "complement": null,
                "neighborhood": "Bela Vista",
                "city": "São Paulo",
                "state": "sp"
            }
        }))
        .unwrap();

        let record = CustomerRecord::from(dto);
        assert_eq!(record.data.document, "52998224725");
        assert_eq!(record.data.phone, "11987654321");
        assert_eq!(record.data.email, None);
        assert_eq!(
            record.data.birth_date,
            Some(DateInput::Iso("1990-05-17T00:00:00".into()))
        );
        let address = record.address.unwrap();
        assert_eq!(address.data.postal_code, "01310100");
        assert_eq!(address.data.district, "Bela Vista");
        assert_eq!(address.data.state, "SP");
        assert_eq!(address.data.complement, "");
    }

    #[test]
    fn order_rows_report_totals_in_currency() {
        let row: ServiceOrderSummary = serde_json::from_value(json!({
            "id": "0190a5f2-7b3c-7d4e-8f00-000000000009",
            "orderNumber": "20260101-ABC123",
            "total": 23000,
            "openedAt": "2026-01-01T09:30:00"
        }))
        .unwrap();
        assert_eq!(row.total_amount(), Decimal::new(23000, 2));
        assert!(row.opened_at.is_some());
    }
}

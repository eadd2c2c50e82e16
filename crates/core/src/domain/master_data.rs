//! Clinical master data: diagnostic codes, procedure codes, medications and medical supplies.

use super::{check_amount, CodeType, Status};
use crate::constants::{DIAGNOSTIC_CODES, MEDICAL_SUPPLIES, MEDICATIONS, PROCEDURE_CODES};
use crate::entity::EntityKind;
use crate::error::FieldViolation;
use crate::search::search_fields;
use chrono::NaiveDate;
use hmc_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// A diagnosis classification code (ICD-10 and similar).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticCode {
    pub code: NonEmptyText,
    pub description: NonEmptyText,
    pub category: NonEmptyText,
    /// Classification edition, e.g. `ICD-10`.
    pub version: NonEmptyText,
    pub status: Status,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
}

search_fields! {
    DiagnosticCodeField {
        Code => "code",
        Description => "description",
        Category => "category",
    }
}

impl EntityKind for DiagnosticCode {
    type Field = DiagnosticCodeField;
    const COLLECTION: &'static str = DIAGNOSTIC_CODES;
    const ID_PREFIX: &'static str = "dx";

    fn field_text(&self, field: DiagnosticCodeField) -> &str {
        match field {
            DiagnosticCodeField::Code => self.code.as_str(),
            DiagnosticCodeField::Description => self.description.as_str(),
            DiagnosticCodeField::Category => self.category.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.code.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.version.as_str(),
        ]
    }

    fn validate(&self) -> Result<(), FieldViolation> {
        match self.valid_to {
            Some(valid_to) if valid_to < self.valid_from => Err(FieldViolation::new(
                "validTo",
                format!(
                    "must not precede validFrom ({} < {})",
                    valid_to, self.valid_from
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// A billable procedure code (CPT, HCPCS or an internal code).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureCode {
    pub code: NonEmptyText,
    pub description: NonEmptyText,
    pub category: NonEmptyText,
    pub code_type: CodeType,
    pub base_price: Option<f64>,
    pub status: Status,
}

search_fields! {
    ProcedureCodeField {
        Code => "code",
        Description => "description",
        Category => "category",
    }
}

impl EntityKind for ProcedureCode {
    type Field = ProcedureCodeField;
    const COLLECTION: &'static str = PROCEDURE_CODES;
    const ID_PREFIX: &'static str = "proc";

    fn field_text(&self, field: ProcedureCodeField) -> &str {
        match field {
            ProcedureCodeField::Code => self.code.as_str(),
            ProcedureCodeField::Description => self.description.as_str(),
            ProcedureCodeField::Category => self.category.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.code.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.code_type.as_str(),
        ]
    }

    fn validate(&self) -> Result<(), FieldViolation> {
        match self.base_price {
            Some(price) => check_amount("basePrice", price),
            None => Ok(()),
        }
    }
}

/// A formulary entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: NonEmptyText,
    pub generic_name: NonEmptyText,
    pub category: NonEmptyText,
    /// Dosage form, e.g. `Tablet` or `Injection`.
    pub form: NonEmptyText,
    pub strength: NonEmptyText,
    pub manufacturer: NonEmptyText,
    pub requires_prescription: bool,
    pub status: Status,
}

search_fields! {
    MedicationField {
        Name => "name",
        GenericName => "genericName",
        Category => "category",
    }
}

impl EntityKind for Medication {
    type Field = MedicationField;
    const COLLECTION: &'static str = MEDICATIONS;
    const ID_PREFIX: &'static str = "med";

    fn field_text(&self, field: MedicationField) -> &str {
        match field {
            MedicationField::Name => self.name.as_str(),
            MedicationField::GenericName => self.generic_name.as_str(),
            MedicationField::Category => self.category.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.generic_name.as_str(),
            self.category.as_str(),
            self.manufacturer.as_str(),
        ]
    }
}

/// A stocked consumable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalSupply {
    pub name: NonEmptyText,
    pub sku: NonEmptyText,
    pub category: NonEmptyText,
    /// Counting unit, e.g. `Box of 100`.
    pub unit: NonEmptyText,
    pub quantity_on_hand: u32,
    pub reorder_level: u32,
    pub supplier: NonEmptyText,
    pub unit_cost: f64,
    pub status: Status,
}

impl MedicalSupply {
    /// True once stock has fallen to or below the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.quantity_on_hand <= self.reorder_level
    }
}

search_fields! {
    MedicalSupplyField {
        Name => "name",
        Sku => "sku",
        Category => "category",
        Supplier => "supplier",
    }
}

impl EntityKind for MedicalSupply {
    type Field = MedicalSupplyField;
    const COLLECTION: &'static str = MEDICAL_SUPPLIES;
    const ID_PREFIX: &'static str = "sup";

    fn field_text(&self, field: MedicalSupplyField) -> &str {
        match field {
            MedicalSupplyField::Name => self.name.as_str(),
            MedicalSupplyField::Sku => self.sku.as_str(),
            MedicalSupplyField::Category => self.category.as_str(),
            MedicalSupplyField::Supplier => self.supplier.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.sku.as_str(),
            self.category.as_str(),
            self.supplier.as_str(),
        ]
    }

    fn validate(&self) -> Result<(), FieldViolation> {
        check_amount("unitCost", self.unit_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::parse_draft;
    use crate::error::StoreError;
    use serde_json::json;

    fn hypertension() -> serde_json::Value {
        json!({
            "code": "I10",
            "description": "Essential (primary) hypertension",
            "category": "Circulatory System",
            "version": "ICD-10",
            "status": "Active",
            "validFrom": "2022-01-01"
        })
    }

    #[test]
    fn diagnostic_draft_parses_without_valid_to() {
        let code: DiagnosticCode = parse_draft(hypertension()).unwrap();
        assert_eq!(code.code, "I10");
        assert_eq!(code.valid_to, None);
        assert!(code.validate().is_ok());
    }

    #[test]
    fn diagnostic_draft_with_id_is_rejected() {
        let mut draft = hypertension();
        draft["id"] = json!("dx-1");

        let err = parse_draft::<DiagnosticCode>(draft).unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailure { field, .. } if field == "id"));
    }

    #[test]
    fn diagnostic_draft_reports_missing_field() {
        let mut draft = hypertension();
        draft.as_object_mut().unwrap().remove("category");

        let err = parse_draft::<DiagnosticCode>(draft).unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailure { message, .. } if message.contains("category")));
    }

    #[test]
    fn diagnostic_validity_window_must_be_ordered() {
        let mut draft = hypertension();
        draft["validTo"] = json!("2021-12-31");
        let code: DiagnosticCode = parse_draft(draft).unwrap();

        assert_eq!(code.validate().unwrap_err().field, "validTo");
    }

    #[test]
    fn procedure_price_must_not_be_negative() {
        let procedure: ProcedureCode = parse_draft(json!({
            "code": "99213",
            "description": "Office visit, established patient",
            "category": "Evaluation and Management",
            "codeType": "CPT",
            "basePrice": -10.0,
            "status": "Active"
        }))
        .unwrap();

        assert_eq!(procedure.validate().unwrap_err().field, "basePrice");
        assert_eq!(procedure.searchable_text()[3], "CPT");
    }

    #[test]
    fn supply_reorder_threshold_is_inclusive() {
        let mut supply: MedicalSupply = parse_draft(json!({
            "name": "Nitrile gloves",
            "sku": "GLV-NTR-M",
            "category": "PPE",
            "unit": "Box of 100",
            "quantityOnHand": 20,
            "reorderLevel": 20,
            "supplier": "MedSupply Co",
            "unitCost": 8.5,
            "status": "Active"
        }))
        .unwrap();

        assert!(supply.needs_reorder());
        supply.quantity_on_hand = 21;
        assert!(!supply.needs_reorder());
        assert!(supply.validate().is_ok());
    }

    #[test]
    fn medication_field_names_are_camel_case() {
        assert_eq!(
            "genericName".parse::<MedicationField>().unwrap(),
            MedicationField::GenericName
        );
        assert!("generic_name".parse::<MedicationField>().is_err());
    }
}

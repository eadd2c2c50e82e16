//! Console entity kinds.
//!
//! Each kind is a plain serde struct with camelCase wire names plus an [`EntityKind`]
//! implementation telling the store its collection name, id prefix, searchable fields and
//! validation hook.
//!
//! - [`master_data`]: diagnostic codes, procedure codes, medications, medical supplies
//! - [`access`]: permissions, roles, user-role assignments
//! - [`communication`]: referral/message templates, shared calendars, integrations, policies
//! - [`configuration`]: operating hours, service prices and the two singleton documents
//!
//! [`EntityKind`]: crate::entity::EntityKind

pub mod access;
pub mod communication;
pub mod configuration;
pub mod master_data;

pub use access::{Permission, PermissionField, Role, RoleField, UserRole, UserRoleField};
pub use communication::{
    CommunicationPolicy, CommunicationPolicyField, FormField, Integration, IntegrationField,
    MessageTemplate, MessageTemplateField, ReferralTemplate, ReferralTemplateField,
    SharedCalendar, SharedCalendarField,
};
pub use configuration::{
    GeneralSettings, HospitalProfile, OperatingHours, OperatingHoursField, ServicePrice,
    ServicePriceField,
};
pub use master_data::{
    DiagnosticCode, DiagnosticCodeField, MedicalSupply, MedicalSupplyField, Medication,
    MedicationField, ProcedureCode, ProcedureCodeField,
};

use crate::error::FieldViolation;

/// Declares a closed label enum whose variants serialize as the given strings.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s)]
                $variant
            ),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum! {
    /// Activation state shared by most console entities.
    Status {
        Active => "Active",
        Inactive => "Inactive",
    }
}

label_enum! {
    PermissionAction {
        View => "View",
        Create => "Create",
        Edit => "Edit",
        Delete => "Delete",
        Approve => "Approve",
        Export => "Export",
    }
}

label_enum! {
    CodeType {
        Cpt => "CPT",
        Hcpcs => "HCPCS",
        Internal => "Internal",
    }
}

label_enum! {
    Priority {
        Routine => "Routine",
        Urgent => "Urgent",
        Emergency => "Emergency",
    }
}

label_enum! {
    Visibility {
        Public => "Public",
        Department => "Department",
        Private => "Private",
    }
}

label_enum! {
    IntegrationKind {
        Hl7 => "HL7",
        Fhir => "FHIR",
        RestApi => "REST API",
        Database => "Database",
    }
}

label_enum! {
    IntegrationStatus {
        Connected => "Connected",
        Disconnected => "Disconnected",
        Error => "Error",
    }
}

label_enum! {
    DayOfWeek {
        Monday => "Monday",
        Tuesday => "Tuesday",
        Wednesday => "Wednesday",
        Thursday => "Thursday",
        Friday => "Friday",
        Saturday => "Saturday",
        Sunday => "Sunday",
    }
}

label_enum! {
    /// Input type of a field on a referral template form.
    FieldType {
        Text => "text",
        TextArea => "textarea",
        Number => "number",
        Date => "date",
        Select => "select",
        Checkbox => "checkbox",
    }
}

/// Rejects monetary amounts that are negative, NaN or infinite.
pub(crate) fn check_amount(field: &str, amount: f64) -> Result<(), FieldViolation> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FieldViolation::new(
            field,
            format!("must be a non-negative amount, got {amount}"),
        ));
    }
    Ok(())
}

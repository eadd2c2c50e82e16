//! Built-in seed data.
//!
//! The console starts from these records when a collection is empty and seeding is enabled.
//! Ids are fixed so that role and assignment references resolve.

use crate::domain::{
    CodeType, CommunicationPolicy, DayOfWeek, DiagnosticCode, FieldType, FormField,
    GeneralSettings, HospitalProfile, Integration, IntegrationKind, IntegrationStatus,
    MedicalSupply, Medication, MessageTemplate, OperatingHours, Permission, PermissionAction,
    Priority, ProcedureCode, ReferralTemplate, Role, ServicePrice, SharedCalendar, Status,
    UserRole, Visibility,
};
use crate::entity::Record;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use hmc_types::{EmailAddress, NonEmptyText};

pub const ADMIN_ROLE_ID: &str = "role-admin";

fn text(s: &str) -> NonEmptyText {
    NonEmptyText::new(s).expect("fixture text is non-empty")
}

fn email(s: &str) -> EmailAddress {
    EmailAddress::parse(s).expect("fixture email is valid")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("fixture date is valid")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("fixture time is valid")
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0)
        .single()
        .expect("fixture timestamp is valid")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn diagnostic_codes() -> Vec<Record<DiagnosticCode>> {
    let code = |id: &str, code: &str, description: &str, category: &str| {
        Record::seeded(
            id,
            DiagnosticCode {
                code: text(code),
                description: text(description),
                category: text(category),
                version: text("ICD-10"),
                status: Status::Active,
                valid_from: date(2022, 1, 1),
                valid_to: None,
            },
        )
    };

    vec![
        code("dx-i10", "I10", "Essential (primary) hypertension", "Circulatory System"),
        code(
            "dx-e11-9",
            "E11.9",
            "Type 2 diabetes mellitus without complications",
            "Endocrine",
        ),
        code(
            "dx-j45-909",
            "J45.909",
            "Unspecified asthma, uncomplicated",
            "Respiratory System",
        ),
        code("dx-m54-5", "M54.5", "Low back pain", "Musculoskeletal System"),
        code(
            "dx-f32-9",
            "F32.9",
            "Major depressive disorder, single episode, unspecified",
            "Mental and Behavioural",
        ),
    ]
}

pub fn procedure_codes() -> Vec<Record<ProcedureCode>> {
    let procedure =
        |id: &str, code: &str, description: &str, category: &str, code_type, price| {
            Record::seeded(
                id,
                ProcedureCode {
                    code: text(code),
                    description: text(description),
                    category: text(category),
                    code_type,
                    base_price: price,
                    status: Status::Active,
                },
            )
        };

    vec![
        procedure(
            "proc-99213",
            "99213",
            "Office visit, established patient, low complexity",
            "Evaluation and Management",
            CodeType::Cpt,
            Some(110.0),
        ),
        procedure(
            "proc-71046",
            "71046",
            "Chest X-ray, 2 views",
            "Radiology",
            CodeType::Cpt,
            Some(85.0),
        ),
        procedure(
            "proc-93000",
            "93000",
            "Electrocardiogram with interpretation",
            "Cardiology",
            CodeType::Cpt,
            Some(60.0),
        ),
        procedure(
            "proc-j1100",
            "J1100",
            "Injection, dexamethasone sodium phosphate, 1 mg",
            "Drugs Administered",
            CodeType::Hcpcs,
            None,
        ),
    ]
}

pub fn medications() -> Vec<Record<Medication>> {
    let medication = |id: &str,
                      name: &str,
                      generic_name: &str,
                      category: &str,
                      form: &str,
                      strength: &str,
                      manufacturer: &str,
                      requires_prescription: bool| {
        Record::seeded(
            id,
            Medication {
                name: text(name),
                generic_name: text(generic_name),
                category: text(category),
                form: text(form),
                strength: text(strength),
                manufacturer: text(manufacturer),
                requires_prescription,
                status: Status::Active,
            },
        )
    };

    vec![
        medication(
            "med-lisinopril",
            "Zestril",
            "Lisinopril",
            "ACE Inhibitor",
            "Tablet",
            "10 mg",
            "AstraZeneca",
            true,
        ),
        medication(
            "med-metformin",
            "Glucophage",
            "Metformin",
            "Biguanide",
            "Tablet",
            "500 mg",
            "Merck",
            true,
        ),
        medication(
            "med-salbutamol",
            "Ventolin",
            "Salbutamol",
            "Bronchodilator",
            "Inhaler",
            "100 mcg/dose",
            "GSK",
            true,
        ),
        medication(
            "med-paracetamol",
            "Panadol",
            "Paracetamol",
            "Analgesic",
            "Tablet",
            "500 mg",
            "Haleon",
            false,
        ),
    ]
}

pub fn medical_supplies() -> Vec<Record<MedicalSupply>> {
    let supply = |id: &str,
                  name: &str,
                  sku: &str,
                  category: &str,
                  unit: &str,
                  on_hand: u32,
                  reorder: u32,
                  supplier: &str,
                  cost: f64| {
        Record::seeded(
            id,
            MedicalSupply {
                name: text(name),
                sku: text(sku),
                category: text(category),
                unit: text(unit),
                quantity_on_hand: on_hand,
                reorder_level: reorder,
                supplier: text(supplier),
                unit_cost: cost,
                status: Status::Active,
            },
        )
    };

    vec![
        supply(
            "sup-gloves-m",
            "Nitrile examination gloves (M)",
            "GLV-NTR-M",
            "PPE",
            "Box of 100",
            240,
            50,
            "MedSupply Co",
            8.5,
        ),
        supply(
            "sup-syringe-5ml",
            "Syringe 5 ml, luer lock",
            "SYR-5ML-LL",
            "Injection",
            "Box of 100",
            35,
            40,
            "CareLine Medical",
            12.75,
        ),
        supply(
            "sup-gauze",
            "Sterile gauze swabs 10x10 cm",
            "GZE-10X10-S",
            "Wound Care",
            "Pack of 50",
            120,
            30,
            "MedSupply Co",
            4.2,
        ),
    ]
}

pub fn permissions() -> Vec<Record<Permission>> {
    let permission = |id: &str, name: &str, description: &str, module: &str, action| {
        Record::seeded(
            id,
            Permission {
                name: text(name),
                description: text(description),
                module: text(module),
                action,
            },
        )
    };

    vec![
        permission(
            "perm-patients-view",
            "View patients",
            "Read patient lists and demographics",
            "Patients",
            PermissionAction::View,
        ),
        permission(
            "perm-patients-edit",
            "Edit patients",
            "Update patient demographics",
            "Patients",
            PermissionAction::Edit,
        ),
        permission(
            "perm-billing-view",
            "View billing",
            "Read invoices and service prices",
            "Billing",
            PermissionAction::View,
        ),
        permission(
            "perm-billing-approve",
            "Approve billing",
            "Approve invoices and price changes",
            "Billing",
            PermissionAction::Approve,
        ),
        permission(
            "perm-masterdata-edit",
            "Edit master data",
            "Maintain codes, medications and supplies",
            "Master Data",
            PermissionAction::Edit,
        ),
        permission(
            "perm-users-manage",
            "Manage users",
            "Assign roles to staff",
            "Access Control",
            PermissionAction::Edit,
        ),
        permission(
            "perm-settings-edit",
            "Edit settings",
            "Change hospital profile and general settings",
            "Settings",
            PermissionAction::Edit,
        ),
        permission(
            "perm-reports-export",
            "Export reports",
            "Download report data",
            "Reports",
            PermissionAction::Export,
        ),
    ]
}

pub fn roles() -> Vec<Record<Role>> {
    let role = |id: &str, name: &str, description: &str, permissions: &[&str], system, status| {
        Record::seeded(
            id,
            Role {
                name: text(name),
                description: text(description),
                permissions: strings(permissions),
                is_system_role: system,
                status,
            },
        )
        .with_timestamps(at(2024, 1, 15), at(2024, 1, 15))
    };

    vec![
        role(
            ADMIN_ROLE_ID,
            "Administrator",
            "Full system access",
            &[
                "perm-patients-view",
                "perm-patients-edit",
                "perm-billing-view",
                "perm-billing-approve",
                "perm-masterdata-edit",
                "perm-users-manage",
                "perm-settings-edit",
                "perm-reports-export",
            ],
            true,
            Status::Active,
        ),
        role(
            "role-physician",
            "Physician",
            "Clinical staff with patient access",
            &["perm-patients-view", "perm-patients-edit"],
            false,
            Status::Active,
        ),
        role(
            "role-nurse",
            "Nurse",
            "Ward nursing staff",
            &["perm-patients-view"],
            false,
            Status::Active,
        ),
        role(
            "role-billing",
            "Billing Clerk",
            "Prepares and reviews invoices",
            &["perm-billing-view"],
            false,
            Status::Active,
        ),
        role(
            "role-auditor",
            "Auditor",
            "Read-only access for external audits",
            &["perm-billing-view"],
            false,
            Status::Inactive,
        ),
    ]
}

pub fn user_roles() -> Vec<Record<UserRole>> {
    let assignment = |id: &str, user: &str, mail: &str, department: &str, role: &str| {
        Record::seeded(
            id,
            UserRole {
                user_name: text(user),
                email: email(mail),
                department: text(department),
                role: role.to_string(),
                status: Status::Active,
            },
        )
    };

    vec![
        assignment(
            "ur-1",
            "Amelia Hart",
            "amelia.hart@stlukes.example.org",
            "Administration",
            ADMIN_ROLE_ID,
        ),
        assignment(
            "ur-2",
            "Dr. Samuel Okoye",
            "samuel.okoye@stlukes.example.org",
            "Cardiology",
            "role-physician",
        ),
        assignment(
            "ur-3",
            "Priya Raman",
            "priya.raman@stlukes.example.org",
            "Emergency",
            "role-nurse",
        ),
        assignment(
            "ur-4",
            "Lucas Moreno",
            "lucas.moreno@stlukes.example.org",
            "Finance",
            "role-billing",
        ),
    ]
}

pub fn referral_templates() -> Vec<Record<ReferralTemplate>> {
    let field = |label: &str, field_type, required| FormField {
        label: text(label),
        field_type,
        required,
    };

    vec![
        Record::seeded(
            "ref-cardiology",
            ReferralTemplate {
                name: text("Cardiology consult"),
                source_department: text("Emergency"),
                target_department: text("Cardiology"),
                priority: Priority::Urgent,
                description: text("Chest pain and arrhythmia work-up"),
                fields: vec![
                    field("Presenting complaint", FieldType::TextArea, true),
                    field("ECG attached", FieldType::Checkbox, false),
                    field("Troponin (ng/L)", FieldType::Number, false),
                ],
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 2, 1), at(2024, 2, 1)),
        Record::seeded(
            "ref-physio",
            ReferralTemplate {
                name: text("Physiotherapy referral"),
                source_department: text("Orthopaedics"),
                target_department: text("Physiotherapy"),
                priority: Priority::Routine,
                description: text("Post-operative mobilisation"),
                fields: vec![
                    field("Procedure performed", FieldType::Text, true),
                    field("Surgery date", FieldType::Date, true),
                ],
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 2, 3), at(2024, 2, 3)),
    ]
}

pub fn message_templates() -> Vec<Record<MessageTemplate>> {
    vec![
        Record::seeded(
            "msg-appointment-reminder",
            MessageTemplate {
                name: text("Appointment reminder"),
                category: text("Scheduling"),
                subject: text("Your upcoming appointment"),
                body: text(
                    "Dear {{patientName}}, this is a reminder of your appointment with \
                     {{department}} on {{date}} at {{time}}.",
                ),
                variables: strings(&["patientName", "department", "date", "time"]),
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 2, 10), at(2024, 2, 10)),
        Record::seeded(
            "msg-critical-result",
            MessageTemplate {
                name: text("Critical result alert"),
                category: text("Clinical"),
                subject: text("Critical result for {{patientName}}"),
                body: text("{{testName}} returned {{value}}. Please review immediately."),
                variables: strings(&["patientName", "testName", "value"]),
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 2, 12), at(2024, 2, 12)),
    ]
}

pub fn shared_calendars() -> Vec<Record<SharedCalendar>> {
    vec![
        Record::seeded(
            "cal-theatre",
            SharedCalendar {
                name: text("Theatre schedule"),
                description: text("Operating theatre bookings"),
                owner: text("Surgical Services"),
                departments: strings(&["Surgery", "Anaesthetics", "Orthopaedics"]),
                visibility: Visibility::Department,
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 3, 1), at(2024, 3, 1)),
        Record::seeded(
            "cal-on-call",
            SharedCalendar {
                name: text("On-call rota"),
                description: text("Hospital-wide on-call consultants"),
                owner: text("Medical Staffing"),
                departments: strings(&["All"]),
                visibility: Visibility::Public,
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 3, 1), at(2024, 3, 1)),
    ]
}

pub fn integrations() -> Vec<Record<Integration>> {
    vec![
        Record::seeded(
            "int-lis",
            Integration {
                name: text("Laboratory information system"),
                kind: IntegrationKind::Hl7,
                endpoint: text("mllp://lis.stlukes.local:2575"),
                departments: strings(&["Laboratory", "Emergency"]),
                status: IntegrationStatus::Connected,
                last_sync: Some(at(2024, 3, 20)),
            },
        )
        .with_timestamps(at(2024, 1, 20), at(2024, 3, 20)),
        Record::seeded(
            "int-pacs",
            Integration {
                name: text("PACS imaging archive"),
                kind: IntegrationKind::Fhir,
                endpoint: text("https://pacs.stlukes.local/fhir"),
                departments: strings(&["Radiology"]),
                status: IntegrationStatus::Disconnected,
                last_sync: None,
            },
        )
        .with_timestamps(at(2024, 1, 22), at(2024, 1, 22)),
    ]
}

pub fn communication_policies() -> Vec<Record<CommunicationPolicy>> {
    vec![
        Record::seeded(
            "pol-critical-results",
            CommunicationPolicy {
                name: text("Critical result escalation"),
                description: text("Critical laboratory values are phoned through within 30 minutes"),
                category: text("Clinical"),
                rules: strings(&[
                    "Phone the responsible clinician",
                    "Escalate to the on-call consultant after 30 minutes",
                    "Document the call in the record",
                ]),
                applies_to: strings(&["Laboratory", "Radiology"]),
                effective_date: date(2024, 3, 1),
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 2, 20), at(2024, 2, 20)),
        Record::seeded(
            "pol-handover",
            CommunicationPolicy {
                name: text("Shift handover"),
                description: text("Structured handover between nursing shifts"),
                category: text("Nursing"),
                rules: strings(&["Use the SBAR format", "Hand over at the bedside"]),
                applies_to: strings(&["Nursing"]),
                effective_date: date(2024, 4, 1),
                status: Status::Active,
            },
        )
        .with_timestamps(at(2024, 3, 5), at(2024, 3, 5)),
    ]
}

pub fn operating_hours() -> Vec<Record<OperatingHours>> {
    let open = |id: &str, department: &str, day, opens: NaiveTime, closes: NaiveTime| {
        Record::seeded(
            id,
            OperatingHours {
                department: text(department),
                day,
                opens: Some(opens),
                closes: Some(closes),
                closed: false,
            },
        )
    };
    let closed = |id: &str, department: &str, day| {
        Record::seeded(
            id,
            OperatingHours {
                department: text(department),
                day,
                opens: None,
                closes: None,
                closed: true,
            },
        )
    };

    vec![
        open(
            "hours-outpatients-mon",
            "Outpatients",
            DayOfWeek::Monday,
            time(8, 0),
            time(17, 0),
        ),
        open(
            "hours-outpatients-fri",
            "Outpatients",
            DayOfWeek::Friday,
            time(8, 0),
            time(16, 0),
        ),
        closed("hours-outpatients-sun", "Outpatients", DayOfWeek::Sunday),
        open(
            "hours-radiology-sat",
            "Radiology",
            DayOfWeek::Saturday,
            time(9, 0),
            time(13, 0),
        ),
    ]
}

pub fn service_prices() -> Vec<Record<ServicePrice>> {
    let price = |id: &str, service: &str, code: &str, department: &str, amount: f64| {
        Record::seeded(
            id,
            ServicePrice {
                service_name: text(service),
                code: text(code),
                department: text(department),
                price: amount,
                currency: text("USD"),
                status: Status::Active,
            },
        )
    };

    vec![
        price("svc-consult", "General consultation", "SVC-001", "Outpatients", 75.0),
        price("svc-xray", "Chest X-ray", "RAD-001", "Radiology", 120.5),
        price("svc-cbc", "Complete blood count", "LAB-014", "Laboratory", 32.0),
        price("svc-ecg", "12-lead ECG", "CAR-003", "Cardiology", 58.0),
    ]
}

pub fn hospital_profile() -> HospitalProfile {
    HospitalProfile {
        name: text("St. Luke's General Hospital"),
        registration_number: text("HOSP-2024-00172"),
        address: text("1200 Riverside Avenue, Springfield"),
        phone: text("+1 555 0100"),
        email: email("info@stlukes.example.org"),
        website: Some(text("https://stlukes.example.org")),
        bed_capacity: 420,
        accreditation: Some(text("Joint Commission")),
    }
}

pub fn general_settings() -> GeneralSettings {
    GeneralSettings {
        timezone: text("America/Chicago"),
        date_format: text("MM/DD/YYYY"),
        currency: text("USD"),
        language: text("en-US"),
        session_timeout_minutes: 30,
        maintenance_mode: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use std::collections::HashSet;

    fn assert_valid<E: EntityKind>(records: Vec<Record<E>>) {
        assert!(!records.is_empty(), "{} has no fixtures", E::COLLECTION);
        let ids: HashSet<&str> = records.iter().map(Record::id).collect();
        assert_eq!(ids.len(), records.len(), "duplicate ids in {}", E::COLLECTION);
        for record in &records {
            assert!(
                record.data().validate().is_ok(),
                "{} '{}' fails validation",
                E::COLLECTION,
                record.id()
            );
            assert_eq!(
                record.created_at().is_some(),
                E::TRACKS_LIFECYCLE,
                "{} '{}' lifecycle stamps",
                E::COLLECTION,
                record.id()
            );
        }
    }

    #[test]
    fn every_fixture_set_is_valid() {
        assert_valid(diagnostic_codes());
        assert_valid(procedure_codes());
        assert_valid(medications());
        assert_valid(medical_supplies());
        assert_valid(permissions());
        assert_valid(roles());
        assert_valid(user_roles());
        assert_valid(referral_templates());
        assert_valid(message_templates());
        assert_valid(shared_calendars());
        assert_valid(integrations());
        assert_valid(communication_policies());
        assert_valid(operating_hours());
        assert_valid(service_prices());
    }

    #[test]
    fn fixture_references_resolve() {
        let permission_ids: HashSet<String> =
            permissions().iter().map(|r| r.id().to_owned()).collect();
        let roles = roles();
        for role in &roles {
            for id in &role.data().permissions {
                assert!(permission_ids.contains(id), "unknown permission {id}");
            }
        }

        let role_ids: HashSet<&str> = roles.iter().map(Record::id).collect();
        for assignment in user_roles() {
            assert!(role_ids.contains(assignment.data().role.as_str()));
        }
    }

    #[test]
    fn admin_role_is_the_only_system_role() {
        let system: Vec<String> = roles()
            .into_iter()
            .filter(|r| r.data().is_system_role)
            .map(|r| r.id().to_owned())
            .collect();
        assert_eq!(system, vec![ADMIN_ROLE_ID.to_string()]);
    }

    #[test]
    fn settings_fixtures_are_valid() {
        use crate::settings::SettingsKind;
        assert!(general_settings().validate().is_ok());
        assert!(hospital_profile().validate().is_ok());
    }
}

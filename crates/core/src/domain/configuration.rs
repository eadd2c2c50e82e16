//! System configuration: departmental operating hours, service prices, and the hospital profile
//! and general settings documents.

use super::{check_amount, DayOfWeek, Status};
use crate::constants::{GENERAL_SETTINGS, HOSPITAL_PROFILE, OPERATING_HOURS, SERVICE_PRICES};
use crate::entity::EntityKind;
use crate::error::FieldViolation;
use crate::search::search_fields;
use crate::settings::SettingsKind;
use chrono::NaiveTime;
use hmc_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};

/// Opening hours of one department on one weekday.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub department: NonEmptyText,
    pub day: DayOfWeek,
    pub opens: Option<NaiveTime>,
    pub closes: Option<NaiveTime>,
    pub closed: bool,
}

impl OperatingHours {
    /// True when the department is open at `time` (opening inclusive, closing exclusive).
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        match (self.closed, self.opens, self.closes) {
            (false, Some(opens), Some(closes)) => opens <= time && time < closes,
            _ => false,
        }
    }
}

search_fields! {
    OperatingHoursField {
        Department => "department",
        Day => "day",
    }
}

impl EntityKind for OperatingHours {
    type Field = OperatingHoursField;
    const COLLECTION: &'static str = OPERATING_HOURS;
    const ID_PREFIX: &'static str = "hours";

    fn field_text(&self, field: OperatingHoursField) -> &str {
        match field {
            OperatingHoursField::Department => self.department.as_str(),
            OperatingHoursField::Day => self.day.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.department.as_str(), self.day.as_str()]
    }

    fn validate(&self) -> Result<(), FieldViolation> {
        if self.closed {
            return Ok(());
        }
        let opens = self
            .opens
            .ok_or_else(|| FieldViolation::new("opens", "is required unless closed"))?;
        let closes = self
            .closes
            .ok_or_else(|| FieldViolation::new("closes", "is required unless closed"))?;
        if closes <= opens {
            return Err(FieldViolation::new(
                "closes",
                format!("must be after opens ({closes} <= {opens})"),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrice {
    pub service_name: NonEmptyText,
    pub code: NonEmptyText,
    pub department: NonEmptyText,
    pub price: f64,
    /// ISO 4217 code, e.g. `USD`.
    pub currency: NonEmptyText,
    pub status: Status,
}

search_fields! {
    ServicePriceField {
        ServiceName => "serviceName",
        Code => "code",
        Department => "department",
    }
}

impl EntityKind for ServicePrice {
    type Field = ServicePriceField;
    const COLLECTION: &'static str = SERVICE_PRICES;
    const ID_PREFIX: &'static str = "svc";

    fn field_text(&self, field: ServicePriceField) -> &str {
        match field {
            ServicePriceField::ServiceName => self.service_name.as_str(),
            ServicePriceField::Code => self.code.as_str(),
            ServicePriceField::Department => self.department.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.service_name.as_str(),
            self.code.as_str(),
            self.department.as_str(),
        ]
    }

    fn validate(&self) -> Result<(), FieldViolation> {
        check_amount("price", self.price)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalProfile {
    pub name: NonEmptyText,
    pub registration_number: NonEmptyText,
    pub address: NonEmptyText,
    pub phone: NonEmptyText,
    pub email: EmailAddress,
    pub website: Option<NonEmptyText>,
    pub bed_capacity: u32,
    pub accreditation: Option<NonEmptyText>,
}

impl SettingsKind for HospitalProfile {
    const DOCUMENT: &'static str = HOSPITAL_PROFILE;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// IANA zone name, e.g. `America/New_York`.
    pub timezone: NonEmptyText,
    pub date_format: NonEmptyText,
    pub currency: NonEmptyText,
    pub language: NonEmptyText,
    pub session_timeout_minutes: u32,
    pub maintenance_mode: bool,
}

impl SettingsKind for GeneralSettings {
    const DOCUMENT: &'static str = GENERAL_SETTINGS;

    fn validate(&self) -> Result<(), FieldViolation> {
        if self.session_timeout_minutes == 0 {
            return Err(FieldViolation::new(
                "sessionTimeoutMinutes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::parse_draft;
    use serde_json::json;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn hours(opens: Option<NaiveTime>, closes: Option<NaiveTime>, closed: bool) -> OperatingHours {
        OperatingHours {
            department: NonEmptyText::new("Outpatients").unwrap(),
            day: DayOfWeek::Monday,
            opens,
            closes,
            closed,
        }
    }

    #[test]
    fn closed_day_needs_no_times() {
        assert!(hours(None, None, true).validate().is_ok());
        assert!(!hours(None, None, true).is_open_at(time(10, 0)));
    }

    #[test]
    fn open_day_needs_both_times_in_order() {
        assert_eq!(
            hours(None, Some(time(17, 0)), false).validate().unwrap_err().field,
            "opens"
        );
        assert_eq!(
            hours(Some(time(8, 0)), None, false).validate().unwrap_err().field,
            "closes"
        );
        assert_eq!(
            hours(Some(time(17, 0)), Some(time(8, 0)), false)
                .validate()
                .unwrap_err()
                .field,
            "closes"
        );
        assert!(hours(Some(time(8, 0)), Some(time(17, 0)), false)
            .validate()
            .is_ok());
    }

    #[test]
    fn opening_window_is_half_open() {
        let day = hours(Some(time(8, 0)), Some(time(17, 0)), false);
        assert!(day.is_open_at(time(8, 0)));
        assert!(day.is_open_at(time(16, 59)));
        assert!(!day.is_open_at(time(17, 0)));
    }

    #[test]
    fn operating_hours_parse_wire_times() {
        let parsed: OperatingHours = parse_draft(json!({
            "department": "Radiology",
            "day": "Saturday",
            "opens": "09:00:00",
            "closes": "13:30:00",
            "closed": false
        }))
        .unwrap();
        assert_eq!(parsed.closes, Some(time(13, 30)));
    }

    #[test]
    fn service_price_must_be_non_negative() {
        let price: ServicePrice = parse_draft(json!({
            "serviceName": "Chest X-ray",
            "code": "RAD-001",
            "department": "Radiology",
            "price": -5.0,
            "currency": "USD",
            "status": "Active"
        }))
        .unwrap();
        assert_eq!(price.validate().unwrap_err().field, "price");
    }

    #[test]
    fn session_timeout_must_be_positive() {
        let mut settings = GeneralSettings {
            timezone: NonEmptyText::new("UTC").unwrap(),
            date_format: NonEmptyText::new("YYYY-MM-DD").unwrap(),
            currency: NonEmptyText::new("USD").unwrap(),
            language: NonEmptyText::new("en").unwrap(),
            session_timeout_minutes: 30,
            maintenance_mode: false,
        };
        assert!(settings.validate().is_ok());

        settings.session_timeout_minutes = 0;
        assert_eq!(
            settings.validate().unwrap_err().field,
            "sessionTimeoutMinutes"
        );
    }
}

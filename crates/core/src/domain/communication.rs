//! Interdepartmental communication: referral and message templates, shared calendars,
//! integrations and communication policies. Every kind here tracks `createdAt`/`updatedAt`.

use super::{FieldType, IntegrationKind, IntegrationStatus, Priority, Status, Visibility};
use crate::constants::{
    COMMUNICATION_POLICIES, INTEGRATIONS, MESSAGE_TEMPLATES, REFERRAL_TEMPLATES, SHARED_CALENDARS,
};
use crate::entity::EntityKind;
use crate::search::search_fields;
use chrono::{DateTime, NaiveDate, Utc};
use hmc_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// One input on a referral form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub label: NonEmptyText,
    pub field_type: FieldType,
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralTemplate {
    pub name: NonEmptyText,
    pub source_department: NonEmptyText,
    pub target_department: NonEmptyText,
    pub priority: Priority,
    pub description: NonEmptyText,
    pub fields: Vec<FormField>,
    pub status: Status,
}

search_fields! {
    ReferralTemplateField {
        Name => "name",
        SourceDepartment => "sourceDepartment",
        TargetDepartment => "targetDepartment",
        Priority => "priority",
    }
}

impl EntityKind for ReferralTemplate {
    type Field = ReferralTemplateField;
    const COLLECTION: &'static str = REFERRAL_TEMPLATES;
    const ID_PREFIX: &'static str = "ref";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: ReferralTemplateField) -> &str {
        match field {
            ReferralTemplateField::Name => self.name.as_str(),
            ReferralTemplateField::SourceDepartment => self.source_department.as_str(),
            ReferralTemplateField::TargetDepartment => self.target_department.as_str(),
            ReferralTemplateField::Priority => self.priority.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.source_department.as_str(),
            self.target_department.as_str(),
            self.description.as_str(),
        ]
    }
}

/// A reusable notification text with `{{variable}}` placeholders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub subject: NonEmptyText,
    pub body: NonEmptyText,
    /// Placeholder names the body may use.
    pub variables: Vec<String>,
    pub status: Status,
}

search_fields! {
    MessageTemplateField {
        Name => "name",
        Category => "category",
        Subject => "subject",
    }
}

impl EntityKind for MessageTemplate {
    type Field = MessageTemplateField;
    const COLLECTION: &'static str = MESSAGE_TEMPLATES;
    const ID_PREFIX: &'static str = "msg";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: MessageTemplateField) -> &str {
        match field {
            MessageTemplateField::Name => self.name.as_str(),
            MessageTemplateField::Category => self.category.as_str(),
            MessageTemplateField::Subject => self.subject.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.category.as_str(),
            self.subject.as_str(),
            self.body.as_str(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCalendar {
    pub name: NonEmptyText,
    pub description: NonEmptyText,
    pub owner: NonEmptyText,
    pub departments: Vec<String>,
    pub visibility: Visibility,
    pub status: Status,
}

search_fields! {
    SharedCalendarField {
        Name => "name",
        Owner => "owner",
        Visibility => "visibility",
    }
}

impl EntityKind for SharedCalendar {
    type Field = SharedCalendarField;
    const COLLECTION: &'static str = SHARED_CALENDARS;
    const ID_PREFIX: &'static str = "cal";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: SharedCalendarField) -> &str {
        match field {
            SharedCalendarField::Name => self.name.as_str(),
            SharedCalendarField::Owner => self.owner.as_str(),
            SharedCalendarField::Visibility => self.visibility.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.owner.as_str(),
        ]
    }
}

/// A connection to an external clinical system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub name: NonEmptyText,
    pub kind: IntegrationKind,
    pub endpoint: NonEmptyText,
    pub departments: Vec<String>,
    pub status: IntegrationStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

search_fields! {
    IntegrationField {
        Name => "name",
        Kind => "kind",
        Status => "status",
    }
}

impl EntityKind for Integration {
    type Field = IntegrationField;
    const COLLECTION: &'static str = INTEGRATIONS;
    const ID_PREFIX: &'static str = "int";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: IntegrationField) -> &str {
        match field {
            IntegrationField::Name => self.name.as_str(),
            IntegrationField::Kind => self.kind.as_str(),
            IntegrationField::Status => self.status.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.kind.as_str(), self.endpoint.as_str()]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationPolicy {
    pub name: NonEmptyText,
    pub description: NonEmptyText,
    pub category: NonEmptyText,
    pub rules: Vec<String>,
    /// Departments or staff groups the policy binds.
    pub applies_to: Vec<String>,
    pub effective_date: NaiveDate,
    pub status: Status,
}

impl CommunicationPolicy {
    /// True when the policy is active and already in force on `date`.
    pub fn in_effect_on(&self, date: NaiveDate) -> bool {
        self.status == Status::Active && self.effective_date <= date
    }
}

search_fields! {
    CommunicationPolicyField {
        Name => "name",
        Category => "category",
        Status => "status",
    }
}

impl EntityKind for CommunicationPolicy {
    type Field = CommunicationPolicyField;
    const COLLECTION: &'static str = COMMUNICATION_POLICIES;
    const ID_PREFIX: &'static str = "pol";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: CommunicationPolicyField) -> &str {
        match field {
            CommunicationPolicyField::Name => self.name.as_str(),
            CommunicationPolicyField::Category => self.category.as_str(),
            CommunicationPolicyField::Status => self.status.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ]
    }
}

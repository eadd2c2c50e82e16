//! Session registry.
//!
//! [`ConsoleRegistry`] owns one [`EntityStore`] per entity kind plus the two settings documents.
//! Opening it picks a persistence provider for every collection, seeds empty collections from
//! the fixtures when asked to, and wires the integrity rules between the access collections:
//!
//! - a permission cannot be removed while a role grants it
//! - a role cannot be removed while a user-role assignment holds it
//! - roles may only grant existing permissions
//! - assignments may only hold existing roles
//!
//! References are stored as ids and resolved on read ([`ConsoleRegistry::role_permissions`],
//! [`ConsoleRegistry::user_role_view`]); nothing is copied between collections, so no cascade
//! updates are needed.

use crate::config::CoreConfig;
use crate::constants::{
    COMMUNICATION_POLICIES, DIAGNOSTIC_CODES, INTEGRATIONS, MEDICAL_SUPPLIES, MEDICATIONS,
    MESSAGE_TEMPLATES, OPERATING_HOURS, PERMISSIONS, PROCEDURE_CODES, REFERRAL_TEMPLATES, ROLES,
    SERVICE_PRICES, SHARED_CALENDARS, USER_ROLES,
};
use crate::domain::{
    CommunicationPolicy, DiagnosticCode, GeneralSettings, HospitalProfile, Integration,
    MedicalSupply, Medication, MessageTemplate, OperatingHours, Permission, ProcedureCode,
    ReferralTemplate, Role, ServicePrice, SharedCalendar, UserRole,
};
use crate::entity::{EntityKind, Record};
use crate::error::StoreResult;
use crate::fixtures;
use crate::integrity::{ReferenceRule, UsageRule};
use crate::persistence::{MemoryProvider, YamlFileProvider};
use crate::settings::{Document, SettingsDocument, SettingsKind};
use crate::store::EntityStore;
use hmc_ids::IdGenerator;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Every collection name, in console menu order.
pub const COLLECTIONS: &[&str] = &[
    DIAGNOSTIC_CODES,
    PROCEDURE_CODES,
    MEDICATIONS,
    MEDICAL_SUPPLIES,
    PERMISSIONS,
    ROLES,
    USER_ROLES,
    REFERRAL_TEMPLATES,
    MESSAGE_TEMPLATES,
    SHARED_CALENDARS,
    INTEGRATIONS,
    COMMUNICATION_POLICIES,
    OPERATING_HOURS,
    SERVICE_PRICES,
];

/// Entity kinds held by the registry, giving generic access to their store.
pub trait Registered: EntityKind {
    fn store(registry: &ConsoleRegistry) -> &EntityStore<Self>;
    fn store_mut(registry: &mut ConsoleRegistry) -> &mut EntityStore<Self>;
    fn fixtures() -> Vec<Record<Self>>;
}

macro_rules! registered {
    ($($kind:ty => $field:ident, $fixtures:path;)+) => {
        $(
            impl Registered for $kind {
                fn store(registry: &ConsoleRegistry) -> &EntityStore<Self> {
                    &registry.$field
                }

                fn store_mut(registry: &mut ConsoleRegistry) -> &mut EntityStore<Self> {
                    &mut registry.$field
                }

                fn fixtures() -> Vec<Record<Self>> {
                    $fixtures()
                }
            }
        )+
    };
}

registered! {
    DiagnosticCode => diagnostic_codes, fixtures::diagnostic_codes;
    ProcedureCode => procedure_codes, fixtures::procedure_codes;
    Medication => medications, fixtures::medications;
    MedicalSupply => medical_supplies, fixtures::medical_supplies;
    Permission => permissions, fixtures::permissions;
    Role => roles, fixtures::roles;
    UserRole => user_roles, fixtures::user_roles;
    ReferralTemplate => referral_templates, fixtures::referral_templates;
    MessageTemplate => message_templates, fixtures::message_templates;
    SharedCalendar => shared_calendars, fixtures::shared_calendars;
    Integration => integrations, fixtures::integrations;
    CommunicationPolicy => communication_policies, fixtures::communication_policies;
    OperatingHours => operating_hours, fixtures::operating_hours;
    ServicePrice => service_prices, fixtures::service_prices;
}

/// An assignment together with the role it resolves to.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleView {
    pub assignment: Record<UserRole>,
    /// `None` only if the role disappeared from storage outside the console.
    pub role: Option<Record<Role>>,
}

/// Session-scoped owner of all console stores.
#[derive(Debug)]
pub struct ConsoleRegistry {
    diagnostic_codes: EntityStore<DiagnosticCode>,
    procedure_codes: EntityStore<ProcedureCode>,
    medications: EntityStore<Medication>,
    medical_supplies: EntityStore<MedicalSupply>,
    permissions: EntityStore<Permission>,
    roles: EntityStore<Role>,
    user_roles: EntityStore<UserRole>,
    referral_templates: EntityStore<ReferralTemplate>,
    message_templates: EntityStore<MessageTemplate>,
    shared_calendars: EntityStore<SharedCalendar>,
    integrations: EntityStore<Integration>,
    communication_policies: EntityStore<CommunicationPolicy>,
    operating_hours: EntityStore<OperatingHours>,
    service_prices: EntityStore<ServicePrice>,
    hospital_profile: SettingsDocument<HospitalProfile>,
    general_settings: SettingsDocument<GeneralSettings>,
}

struct Opener<'a> {
    data_dir: Option<&'a Path>,
    ids: Arc<dyn IdGenerator>,
    seed: bool,
}

impl Opener<'_> {
    fn store<E: Registered>(&self) -> StoreResult<EntityStore<E>> {
        let mut store = match self.data_dir {
            Some(dir) => EntityStore::open(
                Box::new(YamlFileProvider::<Record<E>>::in_dir(dir, E::COLLECTION)),
                Arc::clone(&self.ids),
            )?,
            None => EntityStore::open(
                Box::new(MemoryProvider::<Record<E>>::new()),
                Arc::clone(&self.ids),
            )?,
        };
        if self.seed {
            store.seed_if_empty(E::fixtures())?;
        }
        Ok(store)
    }

    fn document<T: SettingsKind>(&self, fallback: T) -> StoreResult<SettingsDocument<T>> {
        match self.data_dir {
            Some(dir) => SettingsDocument::open(
                Box::new(YamlFileProvider::<Document<T>>::in_dir(dir, T::DOCUMENT)),
                fallback,
            ),
            None => Ok(SettingsDocument::new(fallback)),
        }
    }
}

impl ConsoleRegistry {
    /// Opens every collection as configured.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if any collection or document cannot be loaded, or
    /// seeding an empty collection cannot be saved.
    pub fn open(config: &CoreConfig) -> StoreResult<Self> {
        let registry = Self::build(Opener {
            data_dir: config.data_dir(),
            ids: config.id_strategy().build(),
            seed: config.seed_fixtures(),
        })?;

        tracing::info!(
            "console registry opened ({}, {} ids)",
            config
                .data_dir()
                .map_or_else(|| "in memory".to_string(), |dir| dir.display().to_string()),
            config.id_strategy()
        );
        Ok(registry)
    }

    /// A memory-only registry seeded with the fixtures.
    pub fn in_memory(ids: Arc<dyn IdGenerator>) -> StoreResult<Self> {
        Self::build(Opener {
            data_dir: None,
            ids,
            seed: true,
        })
    }

    fn build(opener: Opener<'_>) -> StoreResult<Self> {
        let mut registry = Self {
            diagnostic_codes: opener.store()?,
            procedure_codes: opener.store()?,
            medications: opener.store()?,
            medical_supplies: opener.store()?,
            permissions: opener.store()?,
            roles: opener.store()?,
            user_roles: opener.store()?,
            referral_templates: opener.store()?,
            message_templates: opener.store()?,
            shared_calendars: opener.store()?,
            integrations: opener.store()?,
            communication_policies: opener.store()?,
            operating_hours: opener.store()?,
            service_prices: opener.store()?,
            hospital_profile: opener.document(fixtures::hospital_profile())?,
            general_settings: opener.document(fixtures::general_settings())?,
        };
        registry.wire_integrity();
        Ok(registry)
    }

    fn wire_integrity(&mut self) {
        let permissions = self.permissions.reader();
        let roles = self.roles.reader();
        let user_roles = self.user_roles.reader();

        self.permissions
            .guard_mut()
            .add_removal_rule(UsageRule::new(roles.clone(), Role::grants));
        self.roles
            .guard_mut()
            .add_removal_rule(UsageRule::new(user_roles, UserRole::holds_role));
        self.roles.guard_mut().add_reference_check(ReferenceRule::new(
            "permissions",
            permissions,
            Role::permission_ids,
        ));
        self.user_roles.guard_mut().add_reference_check(ReferenceRule::new(
            "role",
            roles,
            UserRole::role_ids,
        ));
    }

    pub fn store<E: Registered>(&self) -> &EntityStore<E> {
        E::store(self)
    }

    pub fn store_mut<E: Registered>(&mut self) -> &mut EntityStore<E> {
        E::store_mut(self)
    }

    pub fn hospital_profile(&self) -> &SettingsDocument<HospitalProfile> {
        &self.hospital_profile
    }

    pub fn hospital_profile_mut(&mut self) -> &mut SettingsDocument<HospitalProfile> {
        &mut self.hospital_profile
    }

    pub fn general_settings(&self) -> &SettingsDocument<GeneralSettings> {
        &self.general_settings
    }

    pub fn general_settings_mut(&mut self) -> &mut SettingsDocument<GeneralSettings> {
        &mut self.general_settings
    }

    /// The permissions granted by a role, in the role's order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the role does not exist.
    pub fn role_permissions(&self, role_id: &str) -> StoreResult<Vec<Record<Permission>>> {
        let role = self.roles.get(role_id)?.into_data();
        let permissions = self.permissions.reader();

        Ok(role
            .permissions
            .iter()
            .filter_map(|id| {
                let found = permissions.get(id);
                if found.is_none() {
                    tracing::warn!("role '{}' grants unknown permission '{}'", role_id, id);
                }
                found
            })
            .collect())
    }

    /// An assignment with its role resolved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the assignment does not exist.
    pub fn user_role_view(&self, user_role_id: &str) -> StoreResult<UserRoleView> {
        let assignment = self.user_roles.get(user_role_id)?;
        let role = self.roles.reader().get(&assignment.data().role);
        Ok(UserRoleView { assignment, role })
    }

    /// Size of every collection, in [`COLLECTIONS`] order.
    pub fn collection_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (DIAGNOSTIC_CODES, self.diagnostic_codes.len()),
            (PROCEDURE_CODES, self.procedure_codes.len()),
            (MEDICATIONS, self.medications.len()),
            (MEDICAL_SUPPLIES, self.medical_supplies.len()),
            (PERMISSIONS, self.permissions.len()),
            (ROLES, self.roles.len()),
            (USER_ROLES, self.user_roles.len()),
            (REFERRAL_TEMPLATES, self.referral_templates.len()),
            (MESSAGE_TEMPLATES, self.message_templates.len()),
            (SHARED_CALENDARS, self.shared_calendars.len()),
            (INTEGRATIONS, self.integrations.len()),
            (COMMUNICATION_POLICIES, self.communication_policies.len()),
            (OPERATING_HOURS, self.operating_hours.len()),
            (SERVICE_PRICES, self.service_prices.len()),
        ]
    }
}

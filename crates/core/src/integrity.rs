//! Referential integrity guard.
//!
//! A store consults its guard before removing an entity and before accepting a create or an
//! update:
//!
//! - **System protection**: kinds flag protected entities through
//!   [`EntityKind::is_protected`]; those are never removable, whatever references them.
//! - **Usage protection**: a [`UsageRule`] denies removal while any entity of a dependent
//!   collection references the target id.
//! - **Reference resolution**: a [`ReferenceRule`] rejects entities that point at ids absent from
//!   the referenced collection.
//!
//! Guards only ever read other collections, through [`CollectionReader`] handles.

use crate::entity::{EntityKind, Record};
use crate::error::FieldViolation;
use crate::store::CollectionReader;
use std::fmt;

/// Why a removal was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    SystemProtected,
    InUse {
        referenced_by: &'static str,
        count: usize,
    },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::SystemProtected => f.write_str("it is a protected system entity"),
            DenialReason::InUse {
                referenced_by,
                count: 1,
            } => write!(f, "it is still referenced by 1 entry in {referenced_by}"),
            DenialReason::InUse {
                referenced_by,
                count,
            } => write!(f, "it is still referenced by {count} entries in {referenced_by}"),
        }
    }
}

/// Outcome of [`IntegrityGuard::can_remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalDecision {
    Allowed,
    Denied(DenialReason),
}

impl RemovalDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RemovalDecision::Allowed)
    }
}

/// A policy that may veto removing an entity of kind `E`.
pub trait RemovalRule<E: EntityKind>: Send + Sync {
    fn check(&self, target: &Record<E>) -> Option<DenialReason>;
}

/// A policy validating the outgoing references of an entity of kind `E`.
pub trait ReferenceCheck<E: EntityKind>: Send + Sync {
    fn check(&self, entity: &E) -> Result<(), FieldViolation>;
}

/// Denies removal while any entity of `D` references the target.
pub struct UsageRule<D: EntityKind> {
    dependents: CollectionReader<D>,
    references: fn(&D, &str) -> bool,
}

impl<D: EntityKind> UsageRule<D> {
    /// `references(dependent, id)` must return true when `dependent` points at `id`.
    pub fn new(dependents: CollectionReader<D>, references: fn(&D, &str) -> bool) -> Self {
        Self {
            dependents,
            references,
        }
    }
}

impl<E: EntityKind, D: EntityKind> RemovalRule<E> for UsageRule<D> {
    fn check(&self, target: &Record<E>) -> Option<DenialReason> {
        let count = self
            .dependents
            .count_where(|dependent| (self.references)(dependent.data(), target.id()));

        (count > 0).then_some(DenialReason::InUse {
            referenced_by: D::COLLECTION,
            count,
        })
    }
}

/// Requires every id extracted from an entity of `E` to exist in the collection of `T`.
pub struct ReferenceRule<E: EntityKind, T: EntityKind> {
    field: &'static str,
    targets: CollectionReader<T>,
    extract: fn(&E) -> Vec<&str>,
}

impl<E: EntityKind, T: EntityKind> ReferenceRule<E, T> {
    pub fn new(field: &'static str, targets: CollectionReader<T>, extract: fn(&E) -> Vec<&str>) -> Self {
        Self {
            field,
            targets,
            extract,
        }
    }
}

impl<E: EntityKind, T: EntityKind> ReferenceCheck<E> for ReferenceRule<E, T> {
    fn check(&self, entity: &E) -> Result<(), FieldViolation> {
        for id in (self.extract)(entity) {
            if !self.targets.contains(id) {
                return Err(FieldViolation::new(
                    self.field,
                    format!("references unknown {} id '{}'", T::COLLECTION, id),
                ));
            }
        }
        Ok(())
    }
}

/// The set of integrity policies configured for one collection.
pub struct IntegrityGuard<E: EntityKind> {
    removal_rules: Vec<Box<dyn RemovalRule<E>>>,
    reference_checks: Vec<Box<dyn ReferenceCheck<E>>>,
}

impl<E: EntityKind> Default for IntegrityGuard<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> IntegrityGuard<E> {
    pub fn new() -> Self {
        Self {
            removal_rules: Vec::new(),
            reference_checks: Vec::new(),
        }
    }

    pub fn add_removal_rule(&mut self, rule: impl RemovalRule<E> + 'static) {
        self.removal_rules.push(Box::new(rule));
    }

    pub fn add_reference_check(&mut self, check: impl ReferenceCheck<E> + 'static) {
        self.reference_checks.push(Box::new(check));
    }

    /// Decides whether `target` may be removed.
    ///
    /// System protection is evaluated first, so a protected entity is reported as
    /// `SystemProtected` even when it is also referenced.
    pub fn can_remove(&self, target: &Record<E>) -> RemovalDecision {
        if target.data().is_protected() {
            return RemovalDecision::Denied(DenialReason::SystemProtected);
        }

        self.removal_rules
            .iter()
            .find_map(|rule| rule.check(target))
            .map_or(RemovalDecision::Allowed, RemovalDecision::Denied)
    }

    /// Runs every reference check against `entity`, stopping at the first violation.
    pub fn check_references(&self, entity: &E) -> Result<(), FieldViolation> {
        self.reference_checks
            .iter()
            .try_for_each(|check| check.check(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Permission, PermissionAction, Role, Status, UserRole};
    use hmc_types::{EmailAddress, NonEmptyText};

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn permission(id: &str) -> Record<Permission> {
        Record::seeded(
            id,
            Permission {
                name: text("View patients"),
                description: text("Read access to patient lists"),
                module: text("Patients"),
                action: PermissionAction::View,
            },
        )
    }

    fn role(id: &str, permissions: &[&str], system: bool) -> Record<Role> {
        Record::seeded(
            id,
            Role {
                name: text("Nurse"),
                description: text("Ward nursing staff"),
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
                is_system_role: system,
                status: Status::Active,
            },
        )
    }

    fn assignment(id: &str, role: &str) -> Record<UserRole> {
        Record::seeded(
            id,
            UserRole {
                user_name: text("Dana Okafor"),
                email: EmailAddress::parse("dana.okafor@hospital.org").unwrap(),
                department: text("Emergency"),
                role: role.to_string(),
                status: Status::Active,
            },
        )
    }

    fn permission_guard(roles: Vec<Record<Role>>) -> IntegrityGuard<Permission> {
        let mut guard = IntegrityGuard::new();
        guard.add_removal_rule(UsageRule::new(
            CollectionReader::from_records(roles),
            Role::grants,
        ));
        guard
    }

    #[test]
    fn unreferenced_entity_is_removable() {
        let guard = permission_guard(vec![role("role-1", &["perm-2"], false)]);
        assert_eq!(guard.can_remove(&permission("perm-1")), RemovalDecision::Allowed);
    }

    #[test]
    fn referenced_entity_reports_usage_count() {
        let guard = permission_guard(vec![
            role("role-1", &["perm-1"], false),
            role("role-2", &["perm-1", "perm-2"], false),
            role("role-3", &[], false),
        ]);

        assert_eq!(
            guard.can_remove(&permission("perm-1")),
            RemovalDecision::Denied(DenialReason::InUse {
                referenced_by: "roles",
                count: 2
            })
        );
    }

    #[test]
    fn system_protection_wins_over_usage() {
        let mut guard = IntegrityGuard::new();
        guard.add_removal_rule(UsageRule::new(
            CollectionReader::from_records(vec![assignment("ur-1", "role-admin")]),
            UserRole::holds_role,
        ));

        assert_eq!(
            guard.can_remove(&role("role-admin", &[], true)),
            RemovalDecision::Denied(DenialReason::SystemProtected)
        );
        assert!(!guard.can_remove(&role("role-admin", &[], false)).is_allowed());
    }

    #[test]
    fn system_protection_applies_without_rules() {
        let guard = IntegrityGuard::<Role>::new();
        assert_eq!(
            guard.can_remove(&role("role-admin", &[], true)),
            RemovalDecision::Denied(DenialReason::SystemProtected)
        );
    }

    #[test]
    fn reference_rule_rejects_unknown_ids() {
        let mut guard = IntegrityGuard::<Role>::new();
        guard.add_reference_check(ReferenceRule::new(
            "permissions",
            CollectionReader::from_records(vec![permission("perm-1")]),
            Role::permission_ids,
        ));

        assert!(guard.check_references(role("r", &["perm-1"], false).data()).is_ok());

        let violation = guard
            .check_references(role("r", &["perm-1", "perm-9"], false).data())
            .unwrap_err();
        assert_eq!(violation.field, "permissions");
        assert!(violation.message.contains("perm-9"));
    }

    #[test]
    fn denial_reason_messages() {
        assert_eq!(
            DenialReason::InUse {
                referenced_by: "user-roles",
                count: 1
            }
            .to_string(),
            "it is still referenced by 1 entry in user-roles"
        );
        assert_eq!(
            DenialReason::InUse {
                referenced_by: "roles",
                count: 3
            }
            .to_string(),
            "it is still referenced by 3 entries in roles"
        );
    }
}

//! Access data: permissions, roles and user-role assignments.
//!
//! Roles reference permissions and assignments reference roles by id only. Resolved views are
//! built on demand by the registry, so renaming a permission never leaves a stale copy behind.

use super::{PermissionAction, Status};
use crate::constants::{PERMISSIONS, ROLES, USER_ROLES};
use crate::entity::EntityKind;
use crate::error::FieldViolation;
use crate::search::search_fields;
use hmc_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub name: NonEmptyText,
    pub description: NonEmptyText,
    /// Console area the permission applies to, e.g. `Patients` or `Billing`.
    pub module: NonEmptyText,
    pub action: PermissionAction,
}

search_fields! {
    PermissionField {
        Name => "name",
        Module => "module",
        Action => "action",
    }
}

impl EntityKind for Permission {
    type Field = PermissionField;
    const COLLECTION: &'static str = PERMISSIONS;
    const ID_PREFIX: &'static str = "perm";

    fn field_text(&self, field: PermissionField) -> &str {
        match field {
            PermissionField::Name => self.name.as_str(),
            PermissionField::Module => self.module.as_str(),
            PermissionField::Action => self.action.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.module.as_str(),
        ]
    }
}

/// A named bundle of permissions.
///
/// System roles ship with the console and can be edited but never removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: NonEmptyText,
    pub description: NonEmptyText,
    /// Ids of granted permissions.
    pub permissions: Vec<String>,
    pub is_system_role: bool,
    pub status: Status,
}

impl Role {
    pub fn grants(&self, permission_id: &str) -> bool {
        self.permissions.iter().any(|id| id == permission_id)
    }

    pub fn permission_ids(&self) -> Vec<&str> {
        self.permissions.iter().map(String::as_str).collect()
    }
}

search_fields! {
    RoleField {
        Name => "name",
        Description => "description",
        Status => "status",
    }
}

impl EntityKind for Role {
    type Field = RoleField;
    const COLLECTION: &'static str = ROLES;
    const ID_PREFIX: &'static str = "role";
    const TRACKS_LIFECYCLE: bool = true;

    fn field_text(&self, field: RoleField) -> &str {
        match field {
            RoleField::Name => self.name.as_str(),
            RoleField::Description => self.description.as_str(),
            RoleField::Status => self.status.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn validate_change(&self, previous: &Self) -> Result<(), FieldViolation> {
        if previous.is_system_role && !self.is_system_role {
            return Err(FieldViolation::new(
                "isSystemRole",
                "a system role cannot be demoted",
            ));
        }
        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.is_system_role
    }
}

/// Assignment of one role to a staff member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub user_name: NonEmptyText,
    pub email: EmailAddress,
    pub department: NonEmptyText,
    /// Id of the assigned role.
    pub role: String,
    pub status: Status,
}

impl UserRole {
    pub fn holds_role(&self, role_id: &str) -> bool {
        self.role == role_id
    }

    pub fn role_ids(&self) -> Vec<&str> {
        vec![self.role.as_str()]
    }
}

search_fields! {
    UserRoleField {
        UserName => "userName",
        Email => "email",
        Department => "department",
        Role => "role",
    }
}

impl EntityKind for UserRole {
    type Field = UserRoleField;
    const COLLECTION: &'static str = USER_ROLES;
    const ID_PREFIX: &'static str = "ur";

    fn field_text(&self, field: UserRoleField) -> &str {
        match field {
            UserRoleField::UserName => self.user_name.as_str(),
            UserRoleField::Email => self.email.as_str(),
            UserRoleField::Department => self.department.as_str(),
            UserRoleField::Role => self.role.as_str(),
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.user_name.as_str(),
            self.email.as_str(),
            self.department.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{parse_draft, Record};
    use crate::error::StoreError;
    use serde_json::json;

    fn admin() -> Role {
        parse_draft(json!({
            "name": "Administrator",
            "description": "Full system access",
            "permissions": ["perm-1", "perm-2"],
            "isSystemRole": true,
            "status": "Active"
        }))
        .unwrap()
    }

    #[test]
    fn system_role_is_protected() {
        let mut role = admin();
        assert!(role.is_protected());
        role.is_system_role = false;
        assert!(!role.is_protected());
    }

    #[test]
    fn system_role_cannot_be_demoted() {
        let previous = admin();
        let mut demoted = previous.clone();
        demoted.is_system_role = false;

        let violation = demoted.validate_change(&previous).unwrap_err();
        assert_eq!(violation.field, "isSystemRole");

        let mut edited = previous.clone();
        edited.description = NonEmptyText::new("Edited").unwrap();
        assert!(edited.validate_change(&previous).is_ok());
        // promotion is allowed
        assert!(previous.validate_change(&demoted).is_ok());
    }

    #[test]
    fn role_reference_helpers() {
        let role = admin();
        assert!(role.grants("perm-2"));
        assert!(!role.grants("perm-3"));
        assert_eq!(role.permission_ids(), vec!["perm-1", "perm-2"]);
    }

    #[test]
    fn role_record_serialises_with_camel_case_keys() {
        let value = serde_json::to_value(Record::seeded("role-admin", admin())).unwrap();
        assert_eq!(value["id"], "role-admin");
        assert_eq!(value["isSystemRole"], true);
        assert_eq!(value["permissions"], json!(["perm-1", "perm-2"]));
    }

    #[test]
    fn user_role_email_is_normalised() {
        let assignment: UserRole = parse_draft(json!({
            "userName": "Dana Okafor",
            "email": "Dana.Okafor@Hospital.org",
            "department": "Emergency",
            "role": "role-nurse",
            "status": "Active"
        }))
        .unwrap();

        assert_eq!(assignment.email.as_str(), "dana.okafor@hospital.org");
        assert!(assignment.holds_role("role-nurse"));
        assert_eq!(
            assignment.field_text(UserRoleField::Email),
            "dana.okafor@hospital.org"
        );
    }

    #[test]
    fn user_role_rejects_invalid_email() {
        let err = parse_draft::<UserRole>(json!({
            "userName": "Dana Okafor",
            "email": "not-an-email",
            "department": "Emergency",
            "role": "role-nurse",
            "status": "Active"
        }))
        .unwrap_err();

        assert!(matches!(err, StoreError::ValidationFailure { field, .. } if field == "email"));
    }

    #[test]
    fn permission_action_is_searchable_by_field() {
        let permission: Permission = parse_draft(json!({
            "name": "Export reports",
            "description": "Download report data",
            "module": "Reports",
            "action": "Export"
        }))
        .unwrap();

        assert_eq!(permission.field_text(PermissionField::Action), "Export");
        assert!(!permission.searchable_text().contains(&"Export"));
    }
}

//! Constants used throughout the console core crate.
//!
//! Collection names double as file stems for the YAML provider, so they must stay stable once
//! data has been written with them.

/// Default directory for collection files when persistence is enabled without an explicit path.
pub const DEFAULT_DATA_DIR: &str = "console_data";

/// File extension used by the YAML persistence provider.
pub const COLLECTION_FILE_EXTENSION: &str = "yaml";

/// Suffix of the temporary file written before an atomic rename.
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Patch and draft keys owned by the store; callers can never set them.
pub const RESERVED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Placeholder used as the field path when a whole value fails to deserialize.
pub const ROOT_FIELD: &str = "<root>";

pub const DIAGNOSTIC_CODES: &str = "diagnostic-codes";
pub const PROCEDURE_CODES: &str = "procedure-codes";
pub const MEDICATIONS: &str = "medications";
pub const MEDICAL_SUPPLIES: &str = "medical-supplies";
pub const PERMISSIONS: &str = "permissions";
pub const ROLES: &str = "roles";
pub const USER_ROLES: &str = "user-roles";
pub const REFERRAL_TEMPLATES: &str = "referral-templates";
pub const MESSAGE_TEMPLATES: &str = "message-templates";
pub const SHARED_CALENDARS: &str = "shared-calendars";
pub const INTEGRATIONS: &str = "integrations";
pub const COMMUNICATION_POLICIES: &str = "communication-policies";
pub const OPERATING_HOURS: &str = "operating-hours";
pub const SERVICE_PRICES: &str = "service-prices";

pub const HOSPITAL_PROFILE: &str = "hospital-profile";
pub const GENERAL_SETTINGS: &str = "general-settings";

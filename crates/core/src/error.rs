use crate::integrity::DenialReason;

/// A single rejected field, produced by validation hooks and reference checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}: no entity with id '{id}'")]
    NotFound {
        collection: &'static str,
        id: String,
    },
    #[error("{collection}: cannot remove '{id}': {reason}")]
    ReferentialIntegrityViolation {
        collection: &'static str,
        id: String,
        reason: DenialReason,
    },
    #[error("invalid {field}: {message}")]
    ValidationFailure { field: String, message: String },
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl StoreError {
    /// Returns the denial reason when this is a blocked removal.
    pub fn denial_reason(&self) -> Option<&DenialReason> {
        match self {
            StoreError::ReferentialIntegrityViolation { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<FieldViolation> for StoreError {
    fn from(violation: FieldViolation) -> Self {
        StoreError::ValidationFailure {
            field: violation.field,
            message: violation.message,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read collection file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write collection file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid id strategy: {0}")]
    IdStrategy(#[from] hmc_ids::IdError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

//! # HMC Core
//!
//! Core logic for the hospital management console.
//!
//! This crate holds the administrative data of the console and the rules around it:
//! - A generic entity store (`EntityStore`) with id assignment, patch-based updates and change
//!   subscriptions
//! - Case-insensitive search over per-kind field sets
//! - Referential integrity between roles, permissions and user-role assignments
//! - A persistence seam with in-memory and YAML file providers
//! - The concrete console entity kinds, their fixtures and a registry that wires them together
//!
//! **No presentation concerns**: pages, forms and command-line handling belong in `hmc-cli`.

pub mod config;
pub mod constants;
pub mod domain;
pub mod entity;
pub mod error;
pub mod fixtures;
pub mod integrity;
pub mod persistence;
pub mod registry;
pub mod search;
pub mod settings;
pub mod store;

pub use config::CoreConfig;
pub use entity::{parse_draft, EntityKind, Patch, Record};
pub use error::{
    ConfigError, ConfigResult, FieldViolation, PersistenceError, PersistenceResult, StoreError,
    StoreResult,
};
pub use integrity::{DenialReason, RemovalDecision};
pub use registry::{ConsoleRegistry, Registered, UserRoleView, COLLECTIONS};
pub use search::{FieldSelector, SearchField, UnknownField};
pub use settings::{Document, SettingsDocument, SettingsKind};
pub use store::{CollectionReader, EntityStore, SubscriptionId};

pub use hmc_ids::{IdGenerator, IdStrategy};

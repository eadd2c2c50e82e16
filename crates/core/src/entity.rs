//! Entity kinds, stored records and patches.
//!
//! A console entity kind (diagnostic code, role, referral template, ...) is a plain serde struct
//! holding only its domain fields. The store wraps each value in a [`Record`] that owns the
//! identifier and the optional lifecycle timestamps, so domain structs never carry an `id` and a
//! draft is simply an unstored value of the kind.
//!
//! Records serialize flat, with camelCase keys:
//!
//! ```text
//! { "id": "role-…", "createdAt": "…", "updatedAt": "…", "name": "Nurse", … }
//! ```

use crate::constants::{RESERVED_FIELDS, ROOT_FIELD};
use crate::error::{FieldViolation, StoreError, StoreResult};
use crate::search::SearchField;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Behaviour every console entity kind provides to the generic store.
pub trait EntityKind:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Fields a caller may select individually when filtering.
    type Field: SearchField;

    /// Stable collection name, also used as the persistence file stem.
    const COLLECTION: &'static str;

    /// Prefix passed to the identifier generator.
    const ID_PREFIX: &'static str;

    /// Whether records of this kind carry `createdAt`/`updatedAt`.
    const TRACKS_LIFECYCLE: bool = false;

    /// Text of one selectable field, as matched by the filter engine.
    fn field_text(&self, field: Self::Field) -> &str;

    /// Texts checked when filtering with [`FieldSelector::All`](crate::search::FieldSelector).
    fn searchable_text(&self) -> Vec<&str>;

    /// Kind-specific checks run on create and on the merged result of an update.
    fn validate(&self) -> Result<(), FieldViolation> {
        Ok(())
    }

    /// Checks that moving from `previous` to `self` is allowed, run on every update after
    /// [`validate`](Self::validate).
    fn validate_change(&self, _previous: &Self) -> Result<(), FieldViolation> {
        Ok(())
    }

    /// Protected entities can never be removed.
    fn is_protected(&self) -> bool {
        false
    }
}

/// A stored entity: identifier, optional lifecycle timestamps and the domain value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    data: E,
}

impl<E> Record<E> {
    /// Builds a record with a known identifier.
    ///
    /// Only fixtures and persistence providers should call this; new entities get their
    /// identifier from [`EntityStore::create`](crate::store::EntityStore::create).
    pub fn seeded(id: impl Into<String>, data: E) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            updated_at: None,
            data,
        }
    }

    /// Sets both lifecycle timestamps.
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    pub(crate) fn stamped(id: String, data: E, now: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            data,
        }
    }

    /// Replaces the domain value, keeping id and `createdAt`.
    pub(crate) fn replaced(self, data: E, now: Option<DateTime<Utc>>) -> Self {
        Self {
            id: self.id,
            created_at: self.created_at.or(now),
            updated_at: now.or(self.updated_at),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn data(&self) -> &E {
        &self.data
    }

    pub fn into_data(self) -> E {
        self.data
    }
}

/// A partial entity: the named fields override, everything else is kept.
///
/// Keys use the wire (camelCase) names of the kind's fields. The merge is shallow: a patch for a
/// list or nested object replaces the whole value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Builds a patch from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FieldViolation::new(
                ROOT_FIELD,
                format!("patch must be an object, got {}", json_kind(&other)),
            )
            .into()),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn reject_reserved<'a>(keys: impl Iterator<Item = &'a str>) -> StoreResult<()> {
    for key in keys {
        if RESERVED_FIELDS.contains(&key) {
            return Err(FieldViolation::new(key, "is managed by the store and cannot be set").into());
        }
    }
    Ok(())
}

/// Deserializes a JSON value, reporting the failing field path on error.
pub(crate) fn parse_value<T: DeserializeOwned>(value: Value) -> StoreResult<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let field = if path.is_empty() || path == "." {
            ROOT_FIELD.to_string()
        } else {
            path
        };
        StoreError::ValidationFailure {
            field,
            message: err.into_inner().to_string(),
        }
    })
}

/// Parses a draft for `E` from JSON, refusing store-managed keys such as `id`.
pub fn parse_draft<E: EntityKind>(value: Value) -> StoreResult<E> {
    let Value::Object(map) = value else {
        return Err(FieldViolation::new(
            ROOT_FIELD,
            format!("draft must be an object, got {}", json_kind(&value)),
        )
        .into());
    };
    reject_reserved(map.keys().map(String::as_str))?;
    parse_value(Value::Object(map))
}

/// Merges `patch` over the serialized form of `current` and deserializes the result.
///
/// Fails with `ValidationFailure` when the patch names a store-managed or unknown field, or
/// when the merged value no longer fits the type.
pub(crate) fn apply_patch<T>(current: &T, patch: &Patch) -> StoreResult<T>
where
    T: Serialize + DeserializeOwned,
{
    reject_reserved(patch.fields())?;

    let mut value = serde_json::to_value(current).map_err(|e| StoreError::ValidationFailure {
        field: ROOT_FIELD.into(),
        message: e.to_string(),
    })?;
    let Some(object) = value.as_object_mut() else {
        return Err(FieldViolation::new(ROOT_FIELD, "value does not serialize to an object").into());
    };

    for (key, new_value) in &patch.0 {
        if !object.contains_key(key) {
            return Err(FieldViolation::new(key.as_str(), "unknown field").into());
        }
        object.insert(key.clone(), new_value.clone());
    }

    parse_value(value)
}

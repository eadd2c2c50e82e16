//! Singleton settings documents.
//!
//! The hospital profile and the general settings are single records rather than collections:
//! they have no id, cannot be created or removed, and are only ever read or patched. A
//! [`SettingsDocument`] applies the same rules as the entity store to that one value. Patches
//! are merged and validated, the result is persisted before it becomes visible, and subscribers
//! are notified afterwards.

use crate::entity::{apply_patch, Patch};
use crate::error::{FieldViolation, PersistenceError, StoreResult};
use crate::persistence::{MemoryProvider, PersistenceProvider};
use crate::store::SubscriptionId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behaviour a settings document type provides.
pub trait SettingsKind:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable document name, also used as the persistence file stem.
    const DOCUMENT: &'static str;

    fn validate(&self) -> Result<(), FieldViolation> {
        Ok(())
    }
}

/// A stored settings value with the time of its last update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    data: T,
}

impl<T> Document<T> {
    pub fn new(data: T) -> Self {
        Self {
            updated_at: None,
            data,
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

type Subscriber<T> = Box<dyn Fn(&Document<T>) + Send + Sync>;

/// Holder of one settings document.
pub struct SettingsDocument<T: SettingsKind> {
    current: Document<T>,
    provider: Box<dyn PersistenceProvider<Document<T>>>,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_subscription: u64,
}

impl<T: SettingsKind> fmt::Debug for SettingsDocument<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsDocument")
            .field("document", &T::DOCUMENT)
            .field("current", &self.current)
            .finish()
    }
}

impl<T: SettingsKind> SettingsDocument<T> {
    /// A memory-backed document starting from `initial`.
    pub fn new(initial: T) -> Self {
        Self::from_parts(Document::new(initial), Box::new(MemoryProvider::new()))
    }

    /// Opens the document stored by `provider`, or starts from `fallback` when nothing has been
    /// saved yet. The fallback is not written until the first update.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if loading fails or more than one document is stored.
    pub fn open(
        provider: Box<dyn PersistenceProvider<Document<T>>>,
        fallback: T,
    ) -> StoreResult<Self> {
        let mut stored = provider.load()?;
        if stored.len() > 1 {
            return Err(PersistenceError::Corrupt(format!(
                "{} holds {} documents, expected at most one",
                T::DOCUMENT,
                stored.len()
            ))
            .into());
        }

        let current = match stored.pop() {
            Some(document) => document,
            None => {
                tracing::debug!("{} not stored yet, using defaults", T::DOCUMENT);
                Document::new(fallback)
            }
        };
        Ok(Self::from_parts(current, provider))
    }

    fn from_parts(current: Document<T>, provider: Box<dyn PersistenceProvider<Document<T>>>) -> Self {
        Self {
            current,
            provider,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn get(&self) -> &T {
        &self.current.data
    }

    pub fn document(&self) -> &Document<T> {
        &self.current
    }

    /// Merges `patch` over the current value.
    ///
    /// # Errors
    ///
    /// - `StoreError::ValidationFailure` if the patch names an unknown or store-managed field or
    ///   the merged value is invalid.
    /// - `StoreError::Persistence` if the new value cannot be saved; the current value is kept.
    pub fn update(&mut self, patch: Patch) -> StoreResult<&Document<T>> {
        let data = apply_patch(&self.current.data, &patch)?;
        data.validate()?;

        let next = Document {
            updated_at: Some(Utc::now()),
            data,
        };
        if let Err(e) = self.provider.save(std::slice::from_ref(&next)) {
            tracing::warn!("failed to save {}: {}", T::DOCUMENT, e);
            return Err(e.into());
        }
        self.current = next;

        tracing::info!("updated {} ({} field(s))", T::DOCUMENT, patch.len());
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.current);
        }
        Ok(&self.current)
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Document<T>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeneralSettings;
    use crate::error::StoreError;
    use crate::persistence::YamlFileProvider;
    use hmc_types::NonEmptyText;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn defaults() -> GeneralSettings {
        GeneralSettings {
            timezone: NonEmptyText::new("UTC").unwrap(),
            date_format: NonEmptyText::new("YYYY-MM-DD").unwrap(),
            currency: NonEmptyText::new("USD").unwrap(),
            language: NonEmptyText::new("en").unwrap(),
            session_timeout_minutes: 30,
            maintenance_mode: false,
        }
    }

    #[test]
    fn update_merges_and_stamps() {
        let mut settings = SettingsDocument::new(defaults());
        assert!(settings.document().updated_at().is_none());

        let document = settings
            .update(Patch::new().set("maintenanceMode", true))
            .unwrap();
        assert!(document.data().maintenance_mode);
        assert!(document.updated_at().is_some());
        assert_eq!(settings.get().currency, "USD");
    }

    #[test]
    fn invalid_update_keeps_current_value() {
        let mut settings = SettingsDocument::new(defaults());

        let err = settings
            .update(Patch::new().set("sessionTimeoutMinutes", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailure { field, .. } if field == "sessionTimeoutMinutes"));

        let err = settings
            .update(Patch::new().set("theme", "dark"))
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailure { field, .. } if field == "theme"));

        assert_eq!(settings.get(), &defaults());
    }

    #[test]
    fn subscribers_see_each_update() {
        let mut settings = SettingsDocument::new(defaults());
        let last_timeout = Arc::new(AtomicU32::new(0));

        let subscription = {
            let last_timeout = Arc::clone(&last_timeout);
            settings.subscribe(move |document| {
                last_timeout.store(document.data().session_timeout_minutes, Ordering::SeqCst);
            })
        };

        settings
            .update(Patch::new().set("sessionTimeoutMinutes", 45))
            .unwrap();
        assert_eq!(last_timeout.load(Ordering::SeqCst), 45);

        assert!(settings.unsubscribe(subscription));
        settings
            .update(Patch::new().set("sessionTimeoutMinutes", 60))
            .unwrap();
        assert_eq!(last_timeout.load(Ordering::SeqCst), 45);
    }

    #[test]
    fn file_backed_document_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let provider = || {
            Box::new(YamlFileProvider::<Document<GeneralSettings>>::in_dir(
                dir.path(),
                GeneralSettings::DOCUMENT,
            ))
        };

        let mut settings = SettingsDocument::open(provider(), defaults()).unwrap();
        assert!(!provider().path().exists());
        settings
            .update(Patch::new().set("language", "fr"))
            .unwrap();

        let reopened = SettingsDocument::open(provider(), defaults()).unwrap();
        assert_eq!(reopened.get().language, "fr");
        assert!(reopened.document().updated_at().is_some());
    }

    #[test]
    fn more_than_one_stored_document_is_corrupt() {
        let provider = MemoryProvider::seeded(vec![Document::new(defaults()), Document::new(defaults())]);
        assert!(matches!(
            SettingsDocument::open(Box::new(provider), defaults()),
            Err(StoreError::Persistence(PersistenceError::Corrupt(_)))
        ));
    }
}

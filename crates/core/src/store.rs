//! Entity collection store.
//!
//! One [`EntityStore`] owns the ordered collection of a single entity kind. It is the only way
//! entities are created, changed or removed:
//!
//! - `create` validates the draft, assigns a fresh identifier and appends the record
//! - `update` merges a [`Patch`] over an existing record, keeping its position
//! - `remove` deletes a record once the [`IntegrityGuard`] allows it
//!
//! Each mutation builds the complete next snapshot, hands it to the persistence provider, and
//! only then swaps it in and notifies subscribers. A failed mutation changes nothing.

use crate::entity::{apply_patch, EntityKind, Patch, Record};
use crate::error::{PersistenceError, StoreError, StoreResult};
use crate::integrity::{IntegrityGuard, RemovalDecision};
use crate::persistence::{MemoryProvider, PersistenceProvider};
use crate::search::{self, FieldSelector};
use chrono::Utc;
use hmc_ids::IdGenerator;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type SharedRecords<E> = Arc<RwLock<Vec<Record<E>>>>;

type Subscriber<E> = Box<dyn Fn(&[Record<E>]) + Send + Sync>;

/// Read-only handle onto another store's current collection.
///
/// Integrity rules hold readers of the collections they inspect. A reader always observes the
/// latest committed snapshot of its store.
pub struct CollectionReader<E> {
    records: SharedRecords<E>,
}

impl<E> Clone for CollectionReader<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: EntityKind> CollectionReader<E> {
    #[cfg(test)]
    pub(crate) fn from_records(records: Vec<Record<E>>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Record<E>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().iter().any(|record| record.id() == id)
    }

    pub fn count_where(&self, predicate: impl Fn(&Record<E>) -> bool) -> usize {
        self.read().iter().filter(|record| predicate(record)).count()
    }

    pub fn get(&self, id: &str) -> Option<Record<E>> {
        self.read().iter().find(|record| record.id() == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Record<E>> {
        self.read().clone()
    }
}

/// Handle returned by [`EntityStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Generic CRUD container for one entity kind.
pub struct EntityStore<E: EntityKind> {
    records: SharedRecords<E>,
    ids: Arc<dyn IdGenerator>,
    guard: IntegrityGuard<E>,
    provider: Box<dyn PersistenceProvider<Record<E>>>,
    subscribers: Vec<(SubscriptionId, Subscriber<E>)>,
    next_subscription: u64,
}

impl<E: EntityKind> fmt::Debug for EntityStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("collection", &E::COLLECTION)
            .field("len", &self.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn ensure_unique_ids<E: EntityKind>(records: &[Record<E>]) -> Result<(), PersistenceError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(PersistenceError::Corrupt(format!(
                "{} contains duplicate id '{}'",
                E::COLLECTION,
                record.id()
            )));
        }
    }
    Ok(())
}

impl<E: EntityKind> EntityStore<E> {
    /// Creates an empty, memory-backed store.
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self::from_parts(Vec::new(), ids, Box::new(MemoryProvider::new()))
    }

    /// Creates a memory-backed store holding `records`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if two records share an id.
    pub fn with_records(ids: Arc<dyn IdGenerator>, records: Vec<Record<E>>) -> StoreResult<Self> {
        ensure_unique_ids(&records)?;
        let provider = Box::new(MemoryProvider::seeded(records.clone()));
        Ok(Self::from_parts(records, ids, provider))
    }

    /// Opens a store over `provider`, loading its current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if loading fails or the loaded records share an id.
    pub fn open(
        provider: Box<dyn PersistenceProvider<Record<E>>>,
        ids: Arc<dyn IdGenerator>,
    ) -> StoreResult<Self> {
        let records = provider.load()?;
        ensure_unique_ids(&records)?;
        tracing::debug!("opened {} with {} record(s)", E::COLLECTION, records.len());
        Ok(Self::from_parts(records, ids, provider))
    }

    fn from_parts(
        records: Vec<Record<E>>,
        ids: Arc<dyn IdGenerator>,
        provider: Box<dyn PersistenceProvider<Record<E>>>,
    ) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            ids,
            guard: IntegrityGuard::new(),
            provider,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Integrity policies applied by this store.
    pub fn guard_mut(&mut self) -> &mut IntegrityGuard<E> {
        &mut self.guard
    }

    /// A read-only handle for other stores' integrity rules.
    pub fn reader(&self) -> CollectionReader<E> {
        CollectionReader {
            records: Arc::clone(&self.records),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Record<E>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record<E>>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound {
            collection: E::COLLECTION,
            id: id.to_owned(),
        }
    }

    /// Returns the current collection in insertion order.
    pub fn list(&self) -> Vec<Record<E>> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has that id.
    pub fn get(&self, id: &str) -> StoreResult<Record<E>> {
        self.read()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    /// Filters the current collection. See [`search::filter`].
    pub fn filter(&self, term: &str, selector: FieldSelector<E::Field>) -> Vec<Record<E>> {
        let result = search::filter(&self.read(), term, selector);
        tracing::debug!(
            "filter {} by {:?} on {}: {} match(es)",
            E::COLLECTION,
            term,
            selector.as_str(),
            result.len()
        );
        result
    }

    fn validate(&self, entity: &E) -> StoreResult<()> {
        entity.validate()?;
        self.guard.check_references(entity)?;
        Ok(())
    }

    /// Draws identifiers until one is free in the current collection.
    ///
    /// Generators never repeat a value and the collection is finite, so this terminates.
    fn allocate_id(&self) -> String {
        let records = self.read();
        loop {
            let id = self.ids.new_id(E::ID_PREFIX);
            if !records.iter().any(|record| record.id() == id) {
                return id;
            }
            tracing::warn!("{}: generated id '{}' already in use, retrying", E::COLLECTION, id);
        }
    }

    /// Adds a new entity built from `draft`.
    ///
    /// Entities that duplicate another's domain key (for example the same `code`) are accepted;
    /// only identifiers are unique.
    ///
    /// # Errors
    ///
    /// - `StoreError::ValidationFailure` if the kind's checks or a reference check fail.
    /// - `StoreError::Persistence` if the new snapshot cannot be saved.
    pub fn create(&mut self, draft: E) -> StoreResult<Record<E>> {
        self.validate(&draft)?;

        let id = self.allocate_id();
        let now = E::TRACKS_LIFECYCLE.then(Utc::now);
        let record = Record::stamped(id, draft, now);

        let mut next = self.list();
        next.push(record.clone());
        self.commit(next)?;

        tracing::info!("created {} '{}'", E::COLLECTION, record.id());
        Ok(record)
    }

    /// Merges `patch` over the entity with `id`, keeping its position in the collection.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no record has that id.
    /// - `StoreError::ValidationFailure` if the patch names a store-managed or unknown field, the
    ///   merged entity is invalid, the kind refuses the change, or a reference no longer
    ///   resolves.
    /// - `StoreError::Persistence` if the new snapshot cannot be saved.
    pub fn update(&mut self, id: &str, patch: Patch) -> StoreResult<Record<E>> {
        let mut next = self.list();
        let position = next
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let data = apply_patch(next[position].data(), &patch)?;
        self.validate(&data)?;
        data.validate_change(next[position].data())?;

        let now = E::TRACKS_LIFECYCLE.then(Utc::now);
        let updated = next[position].clone().replaced(data, now);
        next[position] = updated.clone();
        self.commit(next)?;

        tracing::info!(
            "updated {} '{}' ({} field(s))",
            E::COLLECTION,
            id,
            patch.len()
        );
        Ok(updated)
    }

    /// Asks the integrity guard whether the entity with `id` may be removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has that id.
    pub fn can_remove(&self, id: &str) -> StoreResult<RemovalDecision> {
        let target = self.get(id)?;
        Ok(self.guard.can_remove(&target))
    }

    /// Removes the entity with `id`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no record has that id.
    /// - `StoreError::ReferentialIntegrityViolation` if the guard denies the removal; the
    ///   collection is left untouched.
    /// - `StoreError::Persistence` if the new snapshot cannot be saved.
    pub fn remove(&mut self, id: &str) -> StoreResult<()> {
        if let RemovalDecision::Denied(reason) = self.can_remove(id)? {
            tracing::warn!("refused to remove {} '{}': {}", E::COLLECTION, id, reason);
            return Err(StoreError::ReferentialIntegrityViolation {
                collection: E::COLLECTION,
                id: id.to_owned(),
                reason,
            });
        }

        let next: Vec<Record<E>> = self
            .list()
            .into_iter()
            .filter(|record| record.id() != id)
            .collect();
        self.commit(next)?;

        tracing::info!("removed {} '{}'", E::COLLECTION, id);
        Ok(())
    }

    /// Replaces an empty collection with `records`, bypassing validation.
    ///
    /// Used to seed fixtures. Returns `false` and does nothing if the store already has data.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if the records share an id or cannot be saved.
    pub fn seed_if_empty(&mut self, records: Vec<Record<E>>) -> StoreResult<bool> {
        if !self.is_empty() {
            return Ok(false);
        }
        ensure_unique_ids(&records)?;
        let count = records.len();
        self.commit(records)?;
        tracing::info!("seeded {} with {} record(s)", E::COLLECTION, count);
        Ok(true)
    }

    /// Registers `callback` to receive the full collection after every successful mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&[Record<E>]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn commit(&mut self, next: Vec<Record<E>>) -> StoreResult<()> {
        if let Err(e) = self.provider.save(&next) {
            tracing::warn!("failed to save {}: {}", E::COLLECTION, e);
            return Err(e.into());
        }

        *self.write() = next;

        if !self.subscribers.is_empty() {
            let snapshot = self.list();
            for (_, subscriber) in &self.subscribers {
                subscriber(&snapshot);
            }
        }
        Ok(())
    }
}

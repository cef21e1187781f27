//! Keyed registry with secondary indexes
//!
//! Provides [`KeyedRegistry`], the one store every metadata kind is kept in.
//! Each entry lives under a unique primary key, is reachable through the
//! declaration that owns it, and is listed in any number of secondary index
//! buckets (by parent, by category, by tag, ...).

use crate::decl::{DeclId, Reference};
use crate::error::RegistryError;
use crate::inherit::{ResolveReport, Skipped, Unresolved};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A secondary index membership: `(index name, bucket value)`
pub type IndexValue = (&'static str, String);

/// Metadata that can be stored in a [`KeyedRegistry`]
pub trait Registrable: Clone + fmt::Debug {
    /// Registry kind, used in errors, logs and stats
    const KIND: &'static str;

    /// Primary key
    fn key(&self) -> &str;

    /// Secondary index memberships derivable from the current fields
    ///
    /// Fields still pending inheritance must not contribute values here; they
    /// are indexed once resolution completes them.
    fn index_values(&self) -> Vec<IndexValue> {
        Vec::new()
    }

    /// Parent this entry still has to inherit from, if any
    fn pending_parent(&self) -> Option<&Reference> {
        None
    }

    /// Bucket rank; ranked entries are kept in descending rank order
    fn rank(&self) -> Option<i64> {
        None
    }
}

/// Metadata whose inherited fields are completed by lazy resolution
pub trait Inheriting: Registrable {
    /// Fields pulled from the parent
    type Inherited;

    /// Complete the entry; afterwards [`Registrable::pending_parent`] is `None`
    fn inherit(&mut self, inherited: Self::Inherited);
}

/// Entry returned from registry lookups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry<M> {
    /// Primary key
    pub key: String,

    /// Registered metadata
    pub metadata: M,

    /// Declaration the metadata was attached to
    pub owner: DeclId,
}

/// Result of [`KeyedRegistry::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new entry was inserted
    Inserted,

    /// An existing entry was replaced in place
    Updated,
}

/// Entry counts for one registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Registry kind
    pub kind: &'static str,

    /// Total entries
    pub total: usize,

    /// Entries still pending inheritance
    pub pending: usize,

    /// Entries with all fields known
    pub resolved: usize,

    /// Bucket count per secondary index
    pub indexes: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct State<M> {
    primary: IndexMap<String, Entry<M>>,
    owners: HashMap<DeclId, String>,
    aliases: HashMap<String, String>,
    indexes: BTreeMap<&'static str, IndexMap<String, Vec<String>>>,
    memberships: HashMap<String, Vec<IndexValue>>,
    unresolved: IndexSet<String>,
}

impl<M> Default for State<M> {
    fn default() -> Self {
        Self {
            primary: IndexMap::new(),
            owners: HashMap::new(),
            aliases: HashMap::new(),
            indexes: BTreeMap::new(),
            memberships: HashMap::new(),
            unresolved: IndexSet::new(),
        }
    }
}

impl<M: Registrable> State<M> {
    fn canonical(&self, key: &str) -> Option<&str> {
        if let Some((existing, _)) = self.primary.get_key_value(key) {
            return Some(existing.as_str());
        }
        self.aliases.get(key).map(String::as_str)
    }

    fn is_taken(&self, key: &str) -> bool {
        self.primary.contains_key(key) || self.aliases.contains_key(key)
    }

    fn insert(&mut self, key: String, metadata: M, owner: DeclId) {
        let pending = metadata.pending_parent().is_some();
        let values = metadata.index_values();

        self.owners.insert(owner.clone(), key.clone());
        self.primary.insert(
            key.clone(),
            Entry {
                key: key.clone(),
                metadata,
                owner,
            },
        );
        self.index_insert(&key, values);

        if pending {
            self.unresolved.insert(key);
        }
    }

    fn index_insert(&mut self, key: &str, values: Vec<IndexValue>) {
        let rank = self.primary.get(key).and_then(|e| e.metadata.rank());

        for (index, value) in values {
            let already = self
                .memberships
                .get(key)
                .is_some_and(|m| m.iter().any(|(i, v)| *i == index && *v == value));
            if already {
                continue;
            }

            let primary = &self.primary;
            let bucket = self
                .indexes
                .entry(index)
                .or_default()
                .entry(value.clone())
                .or_default();

            // Stable descending order: after every entry of equal or higher rank
            let position = match rank {
                Some(rank) => bucket
                    .iter()
                    .position(|other| {
                        primary
                            .get(other)
                            .and_then(|e| e.metadata.rank())
                            .unwrap_or(i64::MIN)
                            < rank
                    })
                    .unwrap_or(bucket.len()),
                None => bucket.len(),
            };
            bucket.insert(position, key.to_string());

            self.memberships
                .entry(key.to_string())
                .or_default()
                .push((index, value));
        }
    }

    fn index_remove(&mut self, key: &str) {
        let Some(values) = self.memberships.remove(key) else {
            return;
        };

        for (index, value) in values {
            let Some(buckets) = self.indexes.get_mut(index) else {
                continue;
            };
            if let Some(bucket) = buckets.get_mut(&value) {
                bucket.retain(|k| k != key);
                if bucket.is_empty() {
                    buckets.shift_remove(&value);
                }
            }
        }
    }

    fn rekey(&mut self, old: &str, new: &str) {
        if let Some((position, _, mut entry)) = self.primary.shift_remove_full(old) {
            entry.key = new.to_string();
            self.owners.insert(entry.owner.clone(), new.to_string());
            self.primary.shift_insert(position, new.to_string(), entry);
        }

        for target in self.aliases.values_mut() {
            if target == old {
                *target = new.to_string();
            }
        }
        self.aliases.insert(old.to_string(), new.to_string());

        if let Some(values) = self.memberships.remove(old) {
            for (index, value) in &values {
                let bucket = self
                    .indexes
                    .get_mut(index)
                    .and_then(|buckets| buckets.get_mut(value));
                if let Some(bucket) = bucket {
                    for k in bucket.iter_mut().filter(|k| k.as_str() == old) {
                        *k = new.to_string();
                    }
                }
            }
            self.memberships.insert(new.to_string(), values);
        }
    }
}

impl<M: Inheriting> State<M> {
    fn complete(&mut self, key: &str, inherited: M::Inherited) -> Result<String, Unresolved> {
        let Some(entry) = self.primary.get(key) else {
            return Err(Unresolved::ParentMissing);
        };

        let mut metadata = entry.metadata.clone();
        metadata.inherit(inherited);
        let new_key = metadata.key().to_string();

        if new_key != key {
            if self.is_taken(&new_key) {
                return Err(Unresolved::KeyConflict);
            }
            self.rekey(key, &new_key);
        }

        let values = metadata.index_values();
        if let Some(entry) = self.primary.get_mut(&new_key) {
            entry.metadata = metadata;
        }
        self.index_insert(&new_key, values);
        self.unresolved.shift_remove(key);

        Ok(new_key)
    }
}

/// Multi-index registry for one metadata kind
///
/// State is guarded by a [`RwLock`] so queries take `&self`, which lets lazy
/// resolution complete entries from inside read-style calls.
///
/// # Example
/// ```
/// use waymark_registry::{DeclId, IndexValue, KeyedRegistry, Registrable};
///
/// #[derive(Debug, Clone)]
/// struct Persona {
///     name: String,
///     role: String,
/// }
///
/// impl Registrable for Persona {
///     const KIND: &'static str = "persona";
///
///     fn key(&self) -> &str {
///         &self.name
///     }
///
///     fn index_values(&self) -> Vec<IndexValue> {
///         vec![("role", self.role.clone())]
///     }
/// }
///
/// let registry = KeyedRegistry::new();
/// let shopper = Persona { name: "Shopper".into(), role: "customer".into() };
/// registry.register(shopper, DeclId::new(["people", "Shopper"])).unwrap();
///
/// assert!(registry.get("Shopper").is_some());
/// assert_eq!(registry.by_index("role", "customer").len(), 1);
/// ```
#[derive(Debug)]
pub struct KeyedRegistry<M> {
    state: RwLock<State<M>>,
}

impl<M: Registrable> KeyedRegistry<M> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Registry kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        M::KIND
    }

    /// Register metadata owned by a declaration
    ///
    /// Returns the primary key the entry was stored under.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateKey`] if the key is taken and
    /// [`RegistryError::DuplicateOwner`] if the declaration already owns an
    /// entry. The existing entry is left untouched in both cases.
    pub fn register(&self, metadata: M, owner: DeclId) -> Result<String, RegistryError> {
        let key = metadata.key().to_string();
        let mut state = self.state.write();

        if state.is_taken(&key) {
            return Err(RegistryError::DuplicateKey { kind: M::KIND, key });
        }
        if state.owners.contains_key(&owner) {
            return Err(RegistryError::DuplicateOwner {
                kind: M::KIND,
                owner,
            });
        }

        let pending = metadata.pending_parent().is_some();
        state.insert(key.clone(), metadata, owner);
        tracing::debug!(kind = M::KIND, %key, pending, "registered");

        Ok(key)
    }

    /// Insert, or replace the entry under the same key in place
    ///
    /// Replacing re-derives the entry's index memberships, so a changed rank
    /// moves it within its buckets.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateOwner`] if `owner` already owns a
    /// different entry.
    pub fn upsert(&self, metadata: M, owner: DeclId) -> Result<Upsert, RegistryError> {
        let key = metadata.key().to_string();
        let mut state = self.state.write();

        if let Some(owned) = state.owners.get(&owner) {
            if state.canonical(&key) != Some(owned.as_str()) {
                return Err(RegistryError::DuplicateOwner {
                    kind: M::KIND,
                    owner,
                });
            }
        }

        let Some(existing) = state.canonical(&key).map(str::to_string) else {
            state.insert(key.clone(), metadata, owner);
            tracing::debug!(kind = M::KIND, %key, "registered");
            return Ok(Upsert::Inserted);
        };

        state.index_remove(&existing);
        let pending = metadata.pending_parent().is_some();
        let values = metadata.index_values();
        let previous_owner = state.primary.get(&existing).map(|e| e.owner.clone());
        if let Some(previous_owner) = previous_owner {
            state.owners.remove(&previous_owner);
        }
        state.owners.insert(owner.clone(), existing.clone());
        if let Some(entry) = state.primary.get_mut(&existing) {
            entry.metadata = metadata;
            entry.owner = owner;
        }
        state.index_insert(&existing, values);
        if pending {
            state.unresolved.insert(existing.clone());
        } else {
            state.unresolved.shift_remove(&existing);
        }
        tracing::debug!(kind = M::KIND, key = %existing, "updated in place");

        Ok(Upsert::Updated)
    }

    /// Lookup entry by primary key (or by a key it was registered under)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Entry<M>> {
        let state = self.state.read();
        let key = state.canonical(key)?;
        state.primary.get(key).cloned()
    }

    /// Check if key exists
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.read().canonical(key).is_some()
    }

    /// Lookup entry by owning declaration
    #[must_use]
    pub fn get_by_owner(&self, owner: &DeclId) -> Option<Entry<M>> {
        let state = self.state.read();
        let key = state.owners.get(owner)?;
        state.primary.get(key).cloned()
    }

    /// Primary key of the entry owned by a declaration
    #[must_use]
    pub fn key_for_owner(&self, owner: &DeclId) -> Option<String> {
        self.state.read().owners.get(owner).cloned()
    }

    /// Entries in one secondary index bucket
    ///
    /// Insertion order, or descending rank for ranked kinds.
    #[must_use]
    pub fn by_index(&self, index: &str, value: &str) -> Vec<Entry<M>> {
        let state = self.state.read();
        state
            .indexes
            .get(index)
            .and_then(|buckets| buckets.get(value))
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| state.primary.get(k).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bucket values of one secondary index, in first-seen order
    #[must_use]
    pub fn index_values(&self, index: &str) -> Vec<String> {
        self.state
            .read()
            .indexes
            .get(index)
            .map(|buckets| buckets.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All entries in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<M>> {
        self.state.read().primary.values().cloned().collect()
    }

    /// Entries matching a predicate, in registration order
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Vec<Entry<M>>
    where
        P: FnMut(&M) -> bool,
    {
        self.state
            .read()
            .primary
            .values()
            .filter(|e| predicate(&e.metadata))
            .cloned()
            .collect()
    }

    /// All primary keys in registration order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.read().primary.keys().cloned().collect()
    }

    /// Keys of entries still pending inheritance
    #[must_use]
    pub fn pending_keys(&self) -> Vec<String> {
        self.state.read().unresolved.iter().cloned().collect()
    }

    /// Check if an entry is still pending inheritance
    #[inline]
    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        let state = self.state.read();
        state
            .canonical(key)
            .is_some_and(|k| state.unresolved.contains(k))
    }

    /// Get total entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().primary.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry counts (does not resolve)
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        let total = state.primary.len();
        let pending = state.unresolved.len();

        RegistryStats {
            kind: M::KIND,
            total,
            pending,
            resolved: total - pending,
            indexes: state
                .indexes
                .iter()
                .map(|(name, buckets)| ((*name).to_string(), buckets.len()))
                .collect(),
        }
    }

    /// Remove every entry
    pub fn clear(&self) {
        *self.state.write() = State::default();
    }
}

impl<M: Inheriting> KeyedRegistry<M> {
    /// Run one lazy resolution pass
    ///
    /// `lookup` receives each pending entry with its parent reference and
    /// either returns the inherited fields or the reason the parent is not
    /// usable yet. Entries that resolve are completed, re-keyed if their key
    /// depends on inherited fields (the old key stays valid for [`get`]) and
    /// added to the indexes their new fields determine. Entries that do not
    /// resolve stay pending for the next pass. With nothing pending the pass
    /// is a no-op.
    ///
    /// [`get`]: KeyedRegistry::get
    pub fn resolve_with<F>(&self, lookup: F) -> ResolveReport
    where
        F: FnMut(&Entry<M>, &Reference) -> Result<M::Inherited, Unresolved>,
    {
        self.resolve_staged(lookup, |inherited| inherited, |_| {})
    }

    /// Run one lazy resolution pass, building the inherited fields at commit
    ///
    /// `lookup` runs without the registry locked and returns what the parent
    /// provides. `build` turns that into the inherited fields while the
    /// registry is locked for writing, one entry at a time, and `commit` sees
    /// each entry that was actually completed. An entry rejected with
    /// [`Unresolved::KeyConflict`] reaches `build` but never `commit`, so
    /// anything `build` only peeks at stays unconsumed.
    ///
    /// `build` and `commit` must not call back into this registry.
    pub fn resolve_staged<T, F, B, C>(
        &self,
        mut lookup: F,
        mut build: B,
        mut commit: C,
    ) -> ResolveReport
    where
        F: FnMut(&Entry<M>, &Reference) -> Result<T, Unresolved>,
        B: FnMut(T) -> M::Inherited,
        C: FnMut(&Entry<M>),
    {
        let pending: Vec<(Entry<M>, Reference)> = {
            let state = self.state.read();
            if state.unresolved.is_empty() {
                return ResolveReport::default();
            }
            state
                .unresolved
                .iter()
                .filter_map(|key| state.primary.get(key))
                .filter_map(|e| e.metadata.pending_parent().cloned().map(|p| (e.clone(), p)))
                .collect()
        };

        let mut report = ResolveReport::default();
        let mut found = Vec::new();

        for (entry, parent) in pending {
            match lookup(&entry, &parent) {
                Ok(provided) => found.push((entry.key, parent, provided)),
                Err(reason) => report.skipped.push(Skipped {
                    key: entry.key,
                    parent,
                    reason,
                }),
            }
        }

        if found.is_empty() {
            return report;
        }

        let mut state = self.state.write();
        for (key, parent, provided) in found {
            if !state.unresolved.contains(&key) {
                continue;
            }
            match state.complete(&key, build(provided)) {
                Ok(final_key) => {
                    tracing::debug!(kind = M::KIND, %key, %final_key, "resolved");
                    if let Some(entry) = state.primary.get(&final_key) {
                        commit(entry);
                    }
                    report.resolved.push(final_key);
                }
                Err(reason) => report.skipped.push(Skipped {
                    key,
                    parent,
                    reason,
                }),
            }
        }

        report
    }
}

impl<M: Registrable> Default for KeyedRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

//! In-process store, for tests and embedding
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{EntityStore, Swap, VersionLedger, VersionedStore};
use crate::entity::{Record, SnapshotOf};
use crate::error::{EntityError, Result};
use crate::kind::EntityKind;

/// Both maps sit behind one lock, which is what makes `commit` atomic.
pub struct MemoryStore<K: EntityKind> {
    inner: Mutex<Inner<K>>,
}

struct Inner<K: EntityKind> {
    records: HashMap<String, Record<K>>,
    ledger: BTreeMap<(String, u32), SnapshotOf<K>>,
}

impl<K: EntityKind> Default for MemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityKind> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                ledger: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<K>>> {
        self.inner
            .lock()
            .map_err(|_| EntityError::Other(anyhow::anyhow!("memory store lock poisoned")))
    }
}

impl<K: EntityKind> EntityStore<K> for MemoryStore<K> {
    fn get(&self, id: &str) -> Result<Option<Record<K>>> {
        Ok(self.lock()?.records.get(id).cloned())
    }

    fn insert(&self, entity: &Record<K>) -> Result<Swap> {
        let mut inner = self.lock()?;
        if inner.records.contains_key(&entity.id) {
            return Ok(Swap::Stale);
        }
        inner.records.insert(entity.id.clone(), entity.clone());
        Ok(Swap::Committed)
    }

    fn compare_and_swap(&self, expected: &Record<K>, next: &Record<K>) -> Result<Swap> {
        let mut inner = self.lock()?;
        match inner.records.get_mut(&next.id) {
            Some(current) if current == expected => {
                *current = next.clone();
                Ok(Swap::Committed)
            }
            _ => Ok(Swap::Stale),
        }
    }
}

impl<K: EntityKind> VersionLedger<K> for MemoryStore<K> {
    fn snapshot(&self, entity_id: &str, version: u32) -> Result<Option<SnapshotOf<K>>> {
        Ok(self
            .lock()?
            .ledger
            .get(&(entity_id.to_string(), version))
            .cloned())
    }

    fn history(&self, entity_id: &str) -> Result<Vec<SnapshotOf<K>>> {
        let from = (entity_id.to_string(), 0);
        let to = (entity_id.to_string(), u32::MAX);

        Ok(self
            .lock()?
            .ledger
            .range(from..=to)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }
}

impl<K: EntityKind> VersionedStore<K> for MemoryStore<K> {
    fn commit(
        &self,
        expected: &Record<K>,
        next: &Record<K>,
        snapshot: &SnapshotOf<K>,
    ) -> Result<Swap> {
        let mut inner = self.lock()?;

        if inner.records.get(&next.id) != Some(expected) {
            return Ok(Swap::Stale);
        }

        inner
            .ledger
            .entry((snapshot.entity_id.clone(), snapshot.version))
            .or_insert_with(|| snapshot.clone());
        inner.records.insert(next.id.clone(), next.clone());

        Ok(Swap::Committed)
    }
}

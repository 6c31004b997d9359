//! Persistence collaborators
//!
//! Current records and their snapshots live side by side but apart: one keyed
//! by record id, the other by `(record id, version)`. Every write to an existing
//! record is a compare-and-swap against the exact record the caller read, so
//! concurrent writers cannot silently overwrite one another.

pub mod memory;
pub mod sled;

pub use self::memory::MemoryStore;
pub use self::sled::SledStore;

use crate::entity::{Record, SnapshotOf};
use crate::error::Result;
use crate::kind::EntityKind;

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swap {
    Committed,
    /// The stored record no longer matches what the caller read.
    Stale,
}

/// Current-state records of one kind.
pub trait EntityStore<K: EntityKind>: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Record<K>>>;

    /// Stores a new record. `Stale` if the id is already taken.
    fn insert(&self, entity: &Record<K>) -> Result<Swap>;

    /// Replaces `expected` with `next`, provided the stored record still equals `expected`.
    fn compare_and_swap(&self, expected: &Record<K>, next: &Record<K>) -> Result<Swap>;
}

/// Append-only snapshot history of one kind.
pub trait VersionLedger<K: EntityKind>: Send + Sync {
    fn snapshot(&self, entity_id: &str, version: u32) -> Result<Option<SnapshotOf<K>>>;

    /// All snapshots of a record, oldest version first.
    fn history(&self, entity_id: &str) -> Result<Vec<SnapshotOf<K>>>;
}

/// A store able to append a snapshot and swap its record as one unit.
pub trait VersionedStore<K: EntityKind>: EntityStore<K> + VersionLedger<K> {
    /// Appends `snapshot` and swaps `expected` for `next` atomically.
    ///
    /// Snapshots are write-once: if one already exists at the same
    /// `(entity, version)` it is kept and only the swap happens. On `Stale`
    /// nothing is written.
    fn commit(
        &self,
        expected: &Record<K>,
        next: &Record<K>,
        snapshot: &SnapshotOf<K>,
    ) -> Result<Swap>;
}

//! sled backed store: one tree for records, one for the ledger, per kind
use std::convert::Infallible;
use std::marker::PhantomData;

use sled::transaction::{ConflictableTransactionResult, TransactionError, Transactional};
use sled::{Db, Tree};

use super::{EntityStore, Swap, VersionLedger, VersionedStore};
use crate::entity::{Record, SnapshotOf};
use crate::error::{EntityError, Result};
use crate::kind::EntityKind;
use crate::utils::{ledger_key, ledger_prefix};

#[derive(Debug, Clone)]
pub struct SledStore<K> {
    records: Tree,
    ledger: Tree,
    _kind: PhantomData<fn() -> K>,
}

impl<K: EntityKind> SledStore<K> {
    /// Opens (or creates) the kind's trees inside `db`.
    pub fn open(db: &Db) -> Result<Self> {
        Ok(Self {
            records: db.open_tree(K::RECORD_TREE)?,
            ledger: db.open_tree(K::LEDGER_TREE)?,
            _kind: PhantomData,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.records.flush()?;
        self.ledger.flush()?;
        Ok(())
    }
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>> {
    Ok(minicbor::to_vec(value)?)
}

fn decode<T: for<'b> minicbor::Decode<'b, ()>>(bytes: &[u8]) -> Result<T> {
    Ok(minicbor::decode(bytes)?)
}

impl<K: EntityKind> EntityStore<K> for SledStore<K> {
    fn get(&self, id: &str) -> Result<Option<Record<K>>> {
        self.records
            .get(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn insert(&self, entity: &Record<K>) -> Result<Swap> {
        let bytes = encode(entity)?;
        let res = self
            .records
            .compare_and_swap(entity.id.as_bytes(), None::<&[u8]>, Some(bytes))?;

        Ok(match res {
            Ok(()) => Swap::Committed,
            Err(_) => Swap::Stale,
        })
    }

    fn compare_and_swap(&self, expected: &Record<K>, next: &Record<K>) -> Result<Swap> {
        let old = encode(expected)?;
        let new = encode(next)?;
        let res = self
            .records
            .compare_and_swap(next.id.as_bytes(), Some(old), Some(new))?;

        Ok(match res {
            Ok(()) => Swap::Committed,
            Err(_) => Swap::Stale,
        })
    }
}

impl<K: EntityKind> VersionLedger<K> for SledStore<K> {
    fn snapshot(&self, entity_id: &str, version: u32) -> Result<Option<SnapshotOf<K>>> {
        self.ledger
            .get(ledger_key(entity_id, version))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn history(&self, entity_id: &str) -> Result<Vec<SnapshotOf<K>>> {
        let mut snapshots = Vec::new();

        for item in self.ledger.scan_prefix(ledger_prefix(entity_id)) {
            let (_, value) = item?;
            snapshots.push(decode(&value)?);
        }

        Ok(snapshots)
    }
}

impl<K: EntityKind> VersionedStore<K> for SledStore<K> {
    fn commit(
        &self,
        expected: &Record<K>,
        next: &Record<K>,
        snapshot: &SnapshotOf<K>,
    ) -> Result<Swap> {
        let old = encode(expected)?;
        let new = encode(next)?;
        let snapshot_bytes = encode(snapshot)?;
        let key = ledger_key(&snapshot.entity_id, snapshot.version);

        // both trees commit together or not at all
        let res = (&self.records, &self.ledger).transaction(
            |(records, ledger)| -> ConflictableTransactionResult<Swap, Infallible> {
                let current = records.get(next.id.as_bytes())?;
                if current.as_deref() != Some(old.as_slice()) {
                    return Ok(Swap::Stale);
                }
                if ledger.get(key.as_slice())?.is_none() {
                    ledger.insert(key.as_slice(), snapshot_bytes.as_slice())?;
                }
                records.insert(next.id.as_bytes(), new.as_slice())?;
                Ok(Swap::Committed)
            },
        );

        match res {
            Ok(swap) => Ok(swap),
            Err(TransactionError::Storage(e)) => Err(EntityError::Storage(e)),
            Err(TransactionError::Abort(never)) => match never {},
        }
    }
}

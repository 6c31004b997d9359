//! Versioned record management: edits snapshot the prior state, rollbacks restore it
//!
//! One controller handles one record kind. Current state and history live in a
//! [`VersionedStore`]; who may change what is decided by an [`AuthorizationGate`].
//! The controller keeps no state between calls.
//!
//! Writes are optimistic. Each operation reads the record, decides, then swaps
//! the exact record it read for the new one. If another writer got there
//! first the whole operation runs again on fresh state, up to
//! [`ControllerConfig::max_retries`] times.
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{CollisionPolicy, ControllerConfig};
use crate::entity::{Entity, PatchOf, Payload, Record, SNAPSHOT_HRP, Snapshot, SnapshotOf};
use crate::error::{EntityError, Result};
use crate::gate::{AuthorizationGate, ReferenceResolver};
use crate::kind::{EntityKind, StatusSet};
use crate::store::{EntityStore, Swap, VersionLedger, VersionedStore};
use crate::types::TimeStamp;
use crate::utils::new_uuid_to_bech32;

/// Result of one optimistic attempt.
enum Attempt<T> {
    Done(T),
    /// Lost the race against a writer that moved past `version`.
    Stale { version: u32 },
}

pub struct VersionedEntityController<K: EntityKind, S> {
    store: S,
    gate: Arc<dyn AuthorizationGate>,
    resolver: Arc<dyn ReferenceResolver>,
    config: ControllerConfig,
    _kind: PhantomData<fn() -> K>,
}

impl<K, S> VersionedEntityController<K, S>
where
    K: EntityKind,
    S: VersionedStore<K>,
{
    pub fn new(
        store: S,
        gate: Arc<dyn AuthorizationGate>,
        resolver: Arc<dyn ReferenceResolver>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            gate,
            resolver,
            config,
            _kind: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Creates a record at version 1. No snapshot is written.
    ///
    /// `status` defaults to the kind's initial status.
    pub fn create(
        &self,
        owner: &str,
        fields: K::Fields,
        status: Option<&str>,
    ) -> Result<Record<K>> {
        if !self.resolver.resolves(owner) {
            return Err(EntityError::InvalidReference(format!(
                "owner {owner} does not exist"
            )));
        }
        K::validate(&fields)?;
        let status = match status {
            Some(raw) => Self::parse_status(raw)?,
            None => <K::Status as StatusSet>::INITIAL,
        };

        let now = TimeStamp::new();
        let entity = Entity {
            id: new_uuid_to_bech32(K::HRP)?,
            owner: owner.to_string(),
            payload: Payload::new(status, fields),
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        };

        match self.store.insert(&entity)? {
            Swap::Committed => {
                info!(
                    kind = K::NAME,
                    id = %entity.id,
                    owner,
                    status = status.as_str(),
                    "created"
                );
                Ok(entity)
            }
            Swap::Stale => Err(EntityError::VersionConflict {
                id: entity.id,
                version: 1,
                collision: false,
            }),
        }
    }

    pub fn get(&self, id: &str) -> Result<Record<K>> {
        self.store
            .get(id)?
            .ok_or_else(|| EntityError::NotFound {
                kind: K::NAME,
                id: id.to_string(),
            })
    }

    /// Applies a merge patch, snapshotting the prior state and bumping the version by one.
    ///
    /// The snapshot and the new record are committed together.
    pub fn edit(&self, id: &str, patch: &PatchOf<K>, caller: &str) -> Result<Record<K>> {
        self.with_retries(id, || {
            let current = self.get(id)?;
            self.authorize(caller, &current)?;

            let status = match &patch.status {
                Some(raw) => {
                    let next = Self::parse_status(raw)?;
                    self.check_transition(*current.status(), next)?;
                    next
                }
                None => *current.status(),
            };
            let fields = K::merge(current.fields(), &patch.fields)?;

            if self.store.snapshot(id, current.version)?.is_some() {
                match self.config.on_snapshot_collision {
                    CollisionPolicy::Reject => {
                        // a concurrent edit may have written it after our read
                        if self.store.get(id)?.as_ref() != Some(&current) {
                            return Ok(Attempt::Stale {
                                version: current.version,
                            });
                        }
                        return Err(EntityError::VersionConflict {
                            id: id.to_string(),
                            version: current.version,
                            collision: true,
                        });
                    }
                    CollisionPolicy::Skip => {
                        debug!(
                            kind = K::NAME,
                            id,
                            version = current.version,
                            "snapshot already recorded, keeping it"
                        );
                    }
                }
            }

            let snapshot = Snapshot::capture(new_uuid_to_bech32(SNAPSHOT_HRP)?, &current)?;
            let version = current.version.checked_add(1).ok_or_else(|| {
                anyhow::anyhow!("{} {id} has exhausted its version counter", K::NAME)
            })?;
            let next = Entity {
                payload: Payload::new(status, fields),
                version,
                updated_at: TimeStamp::new(),
                ..current.clone()
            };

            Ok(match self.store.commit(&current, &next, &snapshot)? {
                Swap::Committed => {
                    info!(kind = K::NAME, id, caller, version, "edited");
                    Attempt::Done(next)
                }
                Swap::Stale => Attempt::Stale {
                    version: current.version,
                },
            })
        })
    }

    /// Restores the payload and version captured at `target`. May lower the version.
    ///
    /// Rollback writes no snapshot of its own and ignores the status lifecycle.
    pub fn rollback(&self, id: &str, target: u32, caller: &str) -> Result<Record<K>> {
        self.with_retries(id, || {
            let current = self.get(id)?;
            self.authorize(caller, &current)?;

            let snapshot = self.snapshot(id, target)?;
            if !snapshot.verify()? {
                return Err(EntityError::Corrupted { id: snapshot.id });
            }

            let next = Entity {
                payload: snapshot.payload,
                version: snapshot.version,
                updated_at: TimeStamp::new(),
                ..current.clone()
            };

            Ok(match self.store.compare_and_swap(&current, &next)? {
                Swap::Committed => {
                    info!(
                        kind = K::NAME,
                        id,
                        caller,
                        from = current.version,
                        to = target,
                        "rolled back"
                    );
                    Attempt::Done(next)
                }
                Swap::Stale => Attempt::Stale {
                    version: current.version,
                },
            })
        })
    }

    /// Overwrites the status alone: no version bump, no snapshot.
    pub fn transition_status(&self, id: &str, status: &str, caller: &str) -> Result<Record<K>> {
        self.with_retries(id, || {
            let current = self.get(id)?;
            self.authorize(caller, &current)?;

            let next_status = Self::parse_status(status)?;
            self.check_transition(*current.status(), next_status)?;

            let mut next = current.clone();
            next.payload.status = next_status;
            next.updated_at = TimeStamp::new();

            Ok(match self.store.compare_and_swap(&current, &next)? {
                Swap::Committed => {
                    info!(
                        kind = K::NAME,
                        id,
                        caller,
                        status = next_status.as_str(),
                        "status changed"
                    );
                    Attempt::Done(next)
                }
                Swap::Stale => Attempt::Stale {
                    version: current.version,
                },
            })
        })
    }

    /// The snapshot recorded for `version`.
    pub fn snapshot(&self, id: &str, version: u32) -> Result<SnapshotOf<K>> {
        self.store
            .snapshot(id, version)?
            .ok_or_else(|| EntityError::VersionNotFound {
                kind: K::NAME,
                id: id.to_string(),
                version,
            })
    }

    /// Every snapshot of a record, oldest first.
    pub fn history(&self, id: &str) -> Result<Vec<SnapshotOf<K>>> {
        self.get(id)?;
        self.store.history(id)
    }

    fn authorize(&self, caller: &str, entity: &Record<K>) -> Result<()> {
        if self.gate.can_mutate(caller, entity.entity_ref::<K>()) {
            return Ok(());
        }

        warn!(kind = K::NAME, id = %entity.id, caller, "write refused");
        Err(EntityError::Forbidden {
            kind: K::NAME,
            id: entity.id.clone(),
            caller: caller.to_string(),
        })
    }

    fn parse_status(raw: &str) -> Result<K::Status> {
        <K::Status as StatusSet>::parse(raw).ok_or_else(|| EntityError::InvalidStatus {
            kind: K::NAME,
            value: raw.to_string(),
        })
    }

    fn check_transition(&self, from: K::Status, to: K::Status) -> Result<()> {
        if self.config.strict_transitions && !from.can_transition(to) {
            return Err(EntityError::IllegalTransition {
                from: from.as_str(),
                to: to.as_str(),
            });
        }
        Ok(())
    }

    fn with_retries<T>(
        &self,
        id: &str,
        mut attempt: impl FnMut() -> Result<Attempt<T>>,
    ) -> Result<T> {
        let mut version = 0;

        let attempts = self.config.max_retries.max(1);
        for n in 1..=attempts {
            match attempt()? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Stale { version: seen } => {
                    debug!(
                        kind = K::NAME,
                        id,
                        attempt = n,
                        version = seen,
                        "lost write race, retrying"
                    );
                    version = seen;
                }
            }
        }

        warn!(
            kind = K::NAME,
            id,
            attempts,
            "giving up after repeated write conflicts"
        );
        Err(EntityError::VersionConflict {
            id: id.to_string(),
            version,
            collision: false,
        })
    }
}

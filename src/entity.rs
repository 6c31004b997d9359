//! Current records, their historical snapshots and the merge patch applied by edits
use chrono::Utc;

use crate::error::Result;
use crate::kind::EntityKind;
use crate::types::TimeStamp;

/// bech32 prefix of snapshot ids.
pub const SNAPSHOT_HRP: &str = "snapshot_";

/// Current record of kind `K`.
pub type Record<K> = Entity<<K as EntityKind>::Status, <K as EntityKind>::Fields>;
/// Snapshot of kind `K`.
pub type SnapshotOf<K> = Snapshot<<K as EntityKind>::Status, <K as EntityKind>::Fields>;
/// Merge patch for kind `K`.
pub type PatchOf<K> = Patch<<K as EntityKind>::FieldPatch>;

/// The mutable part of a record, captured whole by snapshots.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Payload<S, F> {
    #[n(0)]
    pub status: S,
    #[n(1)]
    pub fields: F,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Entity<S, F> {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, never changes
    #[n(1)]
    pub owner: String, // owning organization, never changes
    #[n(2)]
    pub payload: Payload<S, F>,
    #[n(3)]
    pub version: u32,
    #[n(4)]
    pub created_at: TimeStamp<Utc>,
    #[n(5)]
    pub updated_at: TimeStamp<Utc>,
}

/// Write-once capture of a record's payload at one version.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Snapshot<S, F> {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub entity_id: String,
    #[n(2)]
    pub version: u32,
    #[n(3)]
    pub payload: Payload<S, F>,
    #[n(4)]
    pub digest: String, // sha256 of the encoded payload
    #[n(5)]
    pub captured_at: TimeStamp<Utc>,
}

/// Edit input. `None` means "leave as is"; there is no way to clear a member.
#[derive(Debug, Default)]
pub struct Patch<P> {
    /// Wire spelling, parsed against the kind's enumeration.
    pub status: Option<String>,
    pub fields: P,
}

/// What an authorization decision gets to see about a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    pub kind: &'static str,
    pub id: &'a str,
    pub owner: &'a str,
}

impl<S, F> Payload<S, F> {
    pub fn new(status: S, fields: F) -> Self {
        Self { status, fields }
    }
}

impl<S, F> Payload<S, F>
where
    S: minicbor::Encode<()>,
    F: minicbor::Encode<()>,
{
    pub fn digest(&self) -> Result<String> {
        let contents = minicbor::to_vec(self)?;
        Ok(sha256::digest(&contents))
    }
}

impl<S, F> Entity<S, F> {
    pub fn status(&self) -> &S {
        &self.payload.status
    }
    pub fn fields(&self) -> &F {
        &self.payload.fields
    }
    pub fn entity_ref<K: EntityKind>(&self) -> EntityRef<'_> {
        EntityRef {
            kind: K::NAME,
            id: &self.id,
            owner: &self.owner,
        }
    }
}

impl<S, F> Snapshot<S, F>
where
    S: minicbor::Encode<()> + Clone,
    F: minicbor::Encode<()> + Clone,
{
    /// Captures the record exactly as it stands, tagged with its current version.
    pub fn capture(id: String, entity: &Entity<S, F>) -> Result<Self> {
        let payload = entity.payload.clone();
        let digest = payload.digest()?;

        Ok(Self {
            id,
            entity_id: entity.id.clone(),
            version: entity.version,
            payload,
            digest,
            captured_at: TimeStamp::new(),
        })
    }

    pub fn verify(&self) -> Result<bool> {
        Ok(self.payload.digest()? == self.digest)
    }
}

impl<P: Default> Patch<P> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
    pub fn with_fields(mut self, fields: P) -> Self {
        self.fields = fields;
        self
    }
}

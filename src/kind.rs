//! Capability set that turns the generic versioning mechanism into a concrete record kind
use std::fmt::Debug;

use crate::error::Result;

/// Closed status enumeration of one record kind.
pub trait StatusSet:
    Copy + Eq + Debug + Send + Sync + minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> + 'static
{
    /// Status a record takes when the caller does not name one.
    const INITIAL: Self;

    /// Parses the wire spelling (`CREATED`, `PUBLISHED`, ...). Case-insensitive.
    fn parse(value: &str) -> Option<Self>;

    fn as_str(&self) -> &'static str;

    /// Whether `self -> next` follows the forward lifecycle. Only consulted in strict mode.
    fn can_transition(&self, next: Self) -> bool;
}

/// A versioned record kind: its status enumeration, payload shape and merge rules.
pub trait EntityKind: Send + Sync + 'static {
    /// Human readable name used in errors and logs.
    const NAME: &'static str;
    /// bech32 human readable prefix for new ids.
    const HRP: &'static str;
    /// sled tree holding current records.
    const RECORD_TREE: &'static str;
    /// sled tree holding snapshots.
    const LEDGER_TREE: &'static str;

    type Status: StatusSet;
    type Fields: Clone
        + Eq
        + Debug
        + Send
        + Sync
        + minicbor::Encode<()>
        + for<'b> minicbor::Decode<'b, ()>
        + 'static;
    /// Field half of a merge patch. Absent members leave the prior value untouched.
    type FieldPatch: Debug + Default;

    /// Shape checks on a complete payload, run on creation.
    fn validate(fields: &Self::Fields) -> Result<()>;

    /// Produces the merged payload. Must not touch immutable members.
    fn merge(fields: &Self::Fields, patch: &Self::FieldPatch) -> Result<Self::Fields>;
}

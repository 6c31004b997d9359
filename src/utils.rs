//! Identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32, the hrp names the record kind
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Ledger key for a snapshot: entity id, a separator, then the big-endian version.
///
/// Big-endian keeps a prefix scan over one entity in ascending version order.
pub fn ledger_key(entity_id: &str, version: u32) -> Vec<u8> {
    let mut key = ledger_prefix(entity_id);
    key.extend_from_slice(&version.to_be_bytes());
    key
}

pub fn ledger_prefix(entity_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(entity_id.len() + 5);
    key.extend_from_slice(entity_id.as_bytes());
    key.push(0);
    key
}

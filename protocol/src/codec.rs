//! # Typed Envelope Codec
//!
//! Every value persisted by the ledger, and every byte string that gets
//! hashed or signed, is wrapped in a one-byte envelope: the record's kind
//! tag followed by its bincode encoding. Callers never store untagged bytes.
//!
//! | Tag | Record              |
//! |-----|---------------------|
//! | 100 | Block               |
//! | 101 | Transaction         |
//! | 102 | Receipt             |
//! | 103 | TransactionWithData |
//! | 111 | AccountState        |
//! | 112 | CurrencyState       |
//!
//! Decoding dispatches on the tag through a match expression; the variant
//! set is closed, so there is no runtime registry to populate.
//!
//! A record's in-memory `hash` field is never serialized (the digest of an
//! encoding cannot be part of that encoding). [`decode`] recomputes it from
//! the input bytes and writes it back, cascading into child records, so a
//! sealed record survives `decode(encode(r)) == r` field-for-field.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::hash::Hash;
use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// The one-byte kind tag stored as the first byte of every encoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    Block = 100,
    Transaction = 101,
    Receipt = 102,
    TransactionWithData = 103,
    AccountState = 111,
    CurrencyState = 112,
}

impl RecordKind {
    /// The raw tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Resolve a tag byte, failing with `UnknownKind` for unregistered tags.
    pub fn from_tag(tag: u8) -> CoreResult<Self> {
        match tag {
            100 => Ok(RecordKind::Block),
            101 => Ok(RecordKind::Transaction),
            102 => Ok(RecordKind::Receipt),
            103 => Ok(RecordKind::TransactionWithData),
            111 => Ok(RecordKind::AccountState),
            112 => Ok(RecordKind::CurrencyState),
            other => Err(CoreError::UnknownKind(other)),
        }
    }

    /// Human-readable name, for messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Block => "block",
            RecordKind::Transaction => "transaction",
            RecordKind::Receipt => "receipt",
            RecordKind::TransactionWithData => "transaction_with_data",
            RecordKind::AccountState => "account_state",
            RecordKind::CurrencyState => "currency_state",
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A typed record that travels through the envelope codec.
pub trait Record: Serialize + DeserializeOwned {
    /// The kind tag this record is stored under.
    const KIND: RecordKind;

    /// Write the content hash back onto the record after encoding or decoding.
    fn set_hash(&mut self, hash: Hash);

    /// Restore the content hashes of any child records after decoding.
    ///
    /// Child hashes are not serialized either, so containers (blocks,
    /// transactions-with-data, receipts) recompute them bottom-up here.
    /// Leaf records keep the default no-op.
    fn seal_children(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode a record: kind tag followed by the bincode body.
pub fn encode<R: Record>(record: &R) -> CoreResult<Vec<u8>> {
    let body = bincode::serialize(record)
        .map_err(|e| CoreError::MalformedPayload(e.to_string()))?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(R::KIND.tag());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a record of a known kind, verifying the tag first.
///
/// The returned record carries its content hash (the digest of `data`) and
/// the recomputed hashes of all its children.
pub fn decode<R: Record>(data: &[u8]) -> CoreResult<R> {
    let kind = peek_kind(data)?;
    if kind != R::KIND {
        return Err(CoreError::MalformedPayload(format!(
            "expected {} data, found {}",
            R::KIND.name(),
            kind.name()
        )));
    }
    let mut record: R = bincode::deserialize(&data[1..])
        .map_err(|e| CoreError::MalformedPayload(e.to_string()))?;
    record.seal_children()?;
    record.set_hash(Hash::of(data));
    Ok(record)
}

/// Read the kind tag of an encoded value without decoding the body.
pub fn peek_kind(data: &[u8]) -> CoreResult<RecordKind> {
    let tag = data
        .first()
        .ok_or_else(|| CoreError::MalformedPayload("empty buffer".to_string()))?;
    RecordKind::from_tag(*tag)
}

/// Best-effort kind name of an encoded value. Debugging helper.
pub fn kind_name(data: &[u8]) -> &'static str {
    match peek_kind(data) {
        Ok(kind) => kind.name(),
        Err(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip_for_every_kind() {
        for kind in [
            RecordKind::Block,
            RecordKind::Transaction,
            RecordKind::Receipt,
            RecordKind::TransactionWithData,
            RecordKind::AccountState,
            RecordKind::CurrencyState,
        ] {
            assert_eq!(RecordKind::from_tag(kind.tag()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        for tag in [0u8, 99, 104, 110, 113, 255] {
            match RecordKind::from_tag(tag) {
                Err(CoreError::UnknownKind(t)) => assert_eq!(t, tag),
                other => panic!("expected UnknownKind, got {:?}", other),
            }
        }
    }

    #[test]
    fn peek_kind_on_empty_buffer() {
        match peek_kind(&[]) {
            Err(CoreError::MalformedPayload(_)) => {}
            other => panic!("expected MalformedPayload, got {:?}", other),
        }
    }

    #[test]
    fn kind_name_is_total() {
        assert_eq!(kind_name(&[100, 1, 2, 3]), "block");
        assert_eq!(kind_name(&[111]), "account_state");
        assert_eq!(kind_name(&[42]), "unknown");
        assert_eq!(kind_name(&[]), "unknown");
    }
}

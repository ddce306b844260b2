//! # Ledger State Records
//!
//! The versioned state mutations a transaction produces. Two variants exist:
//!
//! - [`AccountState`]: an account's balance and sequence counter, keyed by
//!   the account's canonical address text.
//! - [`CurrencyState`]: an issued currency's metadata and supply, keyed by
//!   its symbol.
//!
//! [`State`] is the closed sum over both. The enum discriminant is the kind
//! discriminant; decoding switches on the envelope tag (111 or 112), so each
//! variant keeps its own tag for standalone persistence.
//!
//! State records are never mutated in place. A balance change clones the
//! current record, applies the delta, and persists the clone under the next
//! sequence-versioned index key.

use serde::{Deserialize, Serialize};

use crate::codec::{self, Record, RecordKind};
use crate::crypto::{Address, Hash};
use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// AccountState
// ---------------------------------------------------------------------------

/// The on-chain state of a single account.
///
/// `sequence` is the per-account monotonic counter; `amount` the balance.
/// Every field is consensus-critical.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Content hash of the encoded record. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// Index of the block whose processing produced this version.
    pub block_index: u64,

    /// The account this state belongs to.
    pub account: Address,

    /// Sequence of the last processed transaction from this account.
    pub sequence: u64,

    /// Current balance.
    pub amount: i64,
}

impl AccountState {
    /// The zero state synthesized for an account that has never been seen.
    pub fn zero(account: Address) -> Self {
        Self {
            account,
            ..Default::default()
        }
    }

    /// The lookup key under which this state is indexed.
    pub fn state_key(&self) -> String {
        self.account.to_text()
    }
}

impl Record for AccountState {
    const KIND: RecordKind = RecordKind::AccountState;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }
}

// ---------------------------------------------------------------------------
// CurrencyState
// ---------------------------------------------------------------------------

/// The on-chain state of an issued currency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyState {
    /// Content hash of the encoded record. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// Index of the block whose processing produced this version.
    pub block_index: u64,

    /// The issuing account.
    pub account: Address,

    /// Issuer sequence at the time of issuance.
    pub sequence: u64,

    /// Full currency name, e.g. "Aurum Gold".
    pub name: String,

    /// Ticker symbol, e.g. "AUG". The lookup key for this state.
    pub symbol: String,

    /// Decimal places for display formatting.
    pub decimals: u32,

    /// Total issued supply in the smallest unit.
    pub total_supply: i64,
}

impl CurrencyState {
    /// The lookup key under which this state is indexed.
    pub fn state_key(&self) -> String {
        self.symbol.clone()
    }
}

impl Record for CurrencyState {
    const KIND: RecordKind = RecordKind::CurrencyState;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A state mutation carried by a receipt: one of the closed variant set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Account(AccountState),
    Currency(CurrencyState),
}

impl State {
    /// The envelope kind this variant persists under.
    pub fn kind(&self) -> RecordKind {
        match self {
            State::Account(_) => RecordKind::AccountState,
            State::Currency(_) => RecordKind::CurrencyState,
        }
    }

    /// The content hash of the encoded record.
    pub fn hash(&self) -> Hash {
        match self {
            State::Account(s) => s.hash,
            State::Currency(s) => s.hash,
        }
    }

    /// Write the content hash back onto the record.
    pub fn set_hash(&mut self, hash: Hash) {
        match self {
            State::Account(s) => s.hash = hash,
            State::Currency(s) => s.hash = hash,
        }
    }

    /// Index of the block whose processing produced this version.
    pub fn block_index(&self) -> u64 {
        match self {
            State::Account(s) => s.block_index,
            State::Currency(s) => s.block_index,
        }
    }

    /// Stamp the producing block's index onto the record.
    pub fn set_block_index(&mut self, index: u64) {
        match self {
            State::Account(s) => s.block_index = index,
            State::Currency(s) => s.block_index = index,
        }
    }

    /// The lookup key used for index derivation (address text or symbol).
    pub fn state_key(&self) -> String {
        match self {
            State::Account(s) => s.state_key(),
            State::Currency(s) => s.state_key(),
        }
    }

    /// The version number used for index derivation (the sequence).
    pub fn index(&self) -> u64 {
        match self {
            State::Account(s) => s.sequence,
            State::Currency(s) => s.sequence,
        }
    }

    /// Encode this state under its variant's own envelope tag.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        match self {
            State::Account(s) => codec::encode(s),
            State::Currency(s) => codec::encode(s),
        }
    }

    /// Decode a state, dispatching on the envelope tag.
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        match codec::peek_kind(data)? {
            RecordKind::AccountState => Ok(State::Account(codec::decode(data)?)),
            RecordKind::CurrencyState => Ok(State::Currency(codec::decode(data)?)),
            other => Err(CoreError::MalformedPayload(format!(
                "expected state data, found {}",
                other.name()
            ))),
        }
    }

    /// Encode, hash, and write the hash back. Returns (hash, bytes).
    pub fn seal(&mut self) -> CoreResult<(Hash, Vec<u8>)> {
        let bytes = self.to_bytes()?;
        let hash = Hash::of(&bytes);
        self.set_hash(hash);
        Ok((hash, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_state() -> AccountState {
        AccountState {
            hash: Hash::ZERO,
            block_index: 2,
            account: Address::from_bytes([5u8; 32]),
            sequence: 1,
            amount: 100,
        }
    }

    fn currency_state() -> CurrencyState {
        CurrencyState {
            hash: Hash::ZERO,
            block_index: 3,
            account: Address::from_bytes([6u8; 32]),
            sequence: 4,
            name: "Aurum Gold".to_string(),
            symbol: "AUG".to_string(),
            decimals: 8,
            total_supply: 1_000_000_000,
        }
    }

    #[test]
    fn account_state_roundtrip() {
        let mut state = State::Account(account_state());
        let (hash, bytes) = state.seal().unwrap();
        assert_eq!(bytes[0], 111);

        let recovered = State::from_bytes(&bytes).unwrap();
        assert_eq!(recovered, state);
        assert_eq!(recovered.hash(), hash);
    }

    #[test]
    fn currency_state_roundtrip() {
        let mut state = State::Currency(currency_state());
        let (hash, bytes) = state.seal().unwrap();
        assert_eq!(bytes[0], 112);

        let recovered = State::from_bytes(&bytes).unwrap();
        assert_eq!(recovered, state);
        assert_eq!(recovered.hash(), hash);
    }

    #[test]
    fn state_keys() {
        let account = account_state();
        assert_eq!(
            State::Account(account.clone()).state_key(),
            account.account.to_text()
        );
        assert_eq!(State::Currency(currency_state()).state_key(), "AUG");
    }

    #[test]
    fn index_is_sequence() {
        assert_eq!(State::Account(account_state()).index(), 1);
        assert_eq!(State::Currency(currency_state()).index(), 4);
    }

    #[test]
    fn from_bytes_rejects_non_state_kinds() {
        // A transaction-tagged buffer is not a state.
        let data = [RecordKind::Transaction.tag(), 0, 0, 0];
        assert!(matches!(
            State::from_bytes(&data),
            Err(CoreError::MalformedPayload(_))
        ));
    }

    #[test]
    fn from_bytes_rejects_unknown_tag() {
        assert!(matches!(
            State::from_bytes(&[0u8, 1, 2]),
            Err(CoreError::UnknownKind(0))
        ));
    }

    #[test]
    fn zero_state_has_no_history() {
        let account = Address::from_bytes([1u8; 32]);
        let zero = AccountState::zero(account);
        assert_eq!(zero.sequence, 0);
        assert_eq!(zero.amount, 0);
        assert_eq!(zero.block_index, 0);
        assert_eq!(zero.account, account);
    }
}

//! # Receipts
//!
//! A receipt records the outcome of processing one transaction: a result
//! code and the ordered state mutations the transaction caused. Receipts are
//! persisted in the receipt trie alongside the states they carry.

use serde::{Deserialize, Serialize};

use crate::codec::{Record, RecordKind};
use crate::crypto::Hash;
use crate::error::CoreResult;
use crate::ledger::state::State;

/// Result code of a successfully processed transaction.
pub const RESULT_OK: u32 = 0;

/// The record of state changes produced by one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Content hash of the encoded record. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// Status code; [`RESULT_OK`] means success.
    pub transaction_result: u32,

    /// The state mutations, in the order they were computed.
    pub states: Vec<State>,
}

impl Receipt {
    /// A successful receipt over the given state mutations.
    pub fn success(states: Vec<State>) -> Self {
        Self {
            hash: Hash::ZERO,
            transaction_result: RESULT_OK,
            states,
        }
    }

    /// `true` if the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.transaction_result == RESULT_OK
    }
}

impl Record for Receipt {
    const KIND: RecordKind = RecordKind::Receipt;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }

    fn seal_children(&mut self) -> CoreResult<()> {
        for state in &mut self.states {
            state.seal()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::crypto::{seal, Address};
    use crate::ledger::state::AccountState;

    fn sample_receipt() -> Receipt {
        let account = Address::from_bytes([5u8; 32]);
        let s1 = State::Account(AccountState {
            hash: Hash::ZERO,
            block_index: 2,
            account,
            sequence: 1,
            amount: 100,
        });
        let s2 = State::Account(AccountState {
            hash: Hash::ZERO,
            block_index: 2,
            account: Address::from_bytes([6u8; 32]),
            sequence: 3,
            amount: 250,
        });
        Receipt::success(vec![s1, s2])
    }

    #[test]
    fn roundtrip_restores_all_hashes() {
        let mut receipt = sample_receipt();
        receipt.seal_children().unwrap();
        let (hash, bytes) = seal(&mut receipt).unwrap();
        assert_eq!(bytes[0], 102);

        let recovered: Receipt = codec::decode(&bytes).unwrap();
        assert_eq!(recovered, receipt);
        assert_eq!(recovered.hash, hash);
        // Child hashes were recomputed, not defaulted.
        for state in &recovered.states {
            assert!(!state.hash().is_zero());
        }
    }

    #[test]
    fn success_code_is_zero() {
        let receipt = sample_receipt();
        assert_eq!(receipt.transaction_result, RESULT_OK);
        assert!(receipt.is_success());
    }

    #[test]
    fn states_preserve_order() {
        let receipt = sample_receipt();
        assert_eq!(receipt.states[0].index(), 1);
        assert_eq!(receipt.states[1].index(), 3);
    }
}

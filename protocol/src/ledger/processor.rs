//! # Transaction Processing
//!
//! The state machine that turns a signed transaction into a set of balance
//! deltas and a receipt. A transaction moves through
//! `Constructed -> Signed -> Verified -> Processed -> Receipted`; this module
//! owns the Verified and Processed steps.
//!
//! [`TransactionProcessor::verify`] is read-only: a rejection (bad signature,
//! wrong sequence, short funds) never mutates ledger state and the caller may
//! resubmit a corrected transaction. [`TransactionProcessor::process`]
//! computes the deltas but does not persist anything either; persistence is
//! a separate [`LedgerStore::put_transaction`] call.

use crate::codec::Record;
use crate::config::ChainConfig;
use crate::crypto::{self, Address};
use crate::error::{CoreError, CoreResult};
use crate::ledger::receipt::Receipt;
use crate::ledger::state::{AccountState, State};
use crate::ledger::transaction::{Transaction, TransactionWithData};
use crate::storage::store::LedgerStore;

/// Verifies transactions against current ledger state and computes the
/// balance mutations of accepted ones.
pub struct TransactionProcessor {
    /// Account credited with the gas of every processed transaction.
    gas_account: Address,
}

impl TransactionProcessor {
    /// A processor crediting gas to the given collector account.
    pub fn new(gas_account: Address) -> Self {
        Self { gas_account }
    }

    /// A processor using the configured gas collector.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.gas_account)
    }

    /// Check a transaction against current ledger state without mutating it.
    ///
    /// In order:
    /// 1. Cryptographic verification (`BadSignature` / `AddressMismatch`).
    /// 2. Sequence: must be exactly the account's current sequence plus one;
    ///    an account that has never been seen sits at the implicit
    ///    `{sequence: 0, amount: 0}` (`SequenceMismatch`).
    /// 3. Funds: the balance must cover amount plus gas
    ///    (`InsufficientFunds`).
    pub fn verify(&self, tx: &Transaction, store: &LedgerStore) -> CoreResult<()> {
        crypto::verify(tx)?;

        let current = store.get_account(&tx.account.to_text())?;
        let (current_sequence, balance) = current
            .map(|state| (state.sequence, state.amount))
            .unwrap_or((0, 0));

        let expected = current_sequence + 1;
        if tx.sequence != expected {
            return Err(CoreError::SequenceMismatch {
                expected,
                got: tx.sequence,
            });
        }

        let required = tx.amount + tx.gas;
        if balance - required < 0 {
            return Err(CoreError::InsufficientFunds { balance, required });
        }
        Ok(())
    }

    /// Compute the three balance deltas of an accepted transaction and wrap
    /// them into a receipt.
    ///
    /// Each delta is computed independently by reading the account's current
    /// state (or synthesizing the zero state) and applying the adjustment:
    ///
    /// 1. gas collector: `+gas`
    /// 2. sender: `-(amount + gas)`, sequence incremented
    /// 3. destination: `+amount`
    ///
    /// When two of the three addresses coincide, the deltas are computed
    /// from the same stale read and the last one persisted wins; see the
    /// `self_transfer_reads_stale_state` test pinning that behavior.
    pub fn process(&self, tx: &Transaction, store: &LedgerStore) -> CoreResult<TransactionWithData> {
        let gas_delta = self.adjusted(store, &self.gas_account, tx.gas, false)?;
        let sender_delta = self.adjusted(store, &tx.account, -(tx.amount + tx.gas), true)?;
        let destination_delta = self.adjusted(store, &tx.destination, tx.amount, false)?;

        tracing::debug!(
            sender = %tx.account,
            sequence = tx.sequence,
            amount = tx.amount,
            gas = tx.gas,
            "processed transaction"
        );

        let receipt = Receipt::success(vec![
            State::Account(gas_delta),
            State::Account(sender_delta),
            State::Account(destination_delta),
        ]);

        let mut twd = TransactionWithData::new(tx.clone(), receipt);
        twd.seal_children()?;
        crypto::seal(&mut twd)?;
        Ok(twd)
    }

    /// Clone the account's current state (or synthesize the zero state) and
    /// apply a signed balance adjustment. Sender deltas also advance the
    /// sequence.
    fn adjusted(
        &self,
        store: &LedgerStore,
        account: &Address,
        delta: i64,
        is_sender: bool,
    ) -> CoreResult<AccountState> {
        let mut state = store
            .get_account(&account.to_text())?
            .unwrap_or_else(|| AccountState::zero(*account));
        state.amount += delta;
        if is_sender {
            state.sequence += 1;
        }
        Ok(state)
    }
}

//! # Ledger Domain
//!
//! The typed, hashable, signable records of the chain (blocks, transactions,
//! receipts, states) and the processor that enforces the balance-transfer
//! invariants over them.

pub mod block;
pub mod processor;
pub mod receipt;
pub mod state;
pub mod transaction;

pub use block::Block;
pub use processor::TransactionProcessor;
pub use receipt::Receipt;
pub use state::{AccountState, CurrencyState, State};
pub use transaction::{Transaction, TransactionType, TransactionWithData};

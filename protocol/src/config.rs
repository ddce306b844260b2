//! # Chain Configuration & Constants
//!
//! Every magic number in the ledger core lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team coffee.

use std::path::PathBuf;

use crate::crypto::address::Address;

/// Human-readable prefix for Bech32 addresses.
pub const ADDRESS_HRP: &str = "aurum";

/// Block index of the genesis block. Chains count from zero.
pub const GENESIS_INDEX: u64 = 0;

/// Sequence number expected from an account's first transaction.
/// Sequence 0 is the implicit state of a never-seen account.
pub const FIRST_SEQUENCE: u64 = 1;

/// Runtime configuration for the ledger core.
///
/// Deliberately small: the process bootstrap (CLI parsing, config files) is
/// somebody else's job. This is just the handful of values the storage and
/// processing layers need at runtime.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Directory holding the four key-value namespaces.
    pub data_dir: PathBuf,
    /// Account credited with the gas of every processed transaction.
    pub gas_account: Address,
}

impl ChainConfig {
    /// Build a configuration for the given data directory and gas collector.
    pub fn new(data_dir: impl Into<PathBuf>, gas_account: Address) -> Self {
        Self {
            data_dir: data_dir.into(),
            gas_account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_carries_gas_account() {
        let gas = Address::from_bytes([3u8; 32]);
        let config = ChainConfig::new("/tmp/aurum-test", gas);
        assert_eq!(config.gas_account, gas);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/aurum-test"));
    }
}

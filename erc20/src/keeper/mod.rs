//! ERC20 module keeper
//!
//! The keeper owns no state of its own; everything lives in the context's
//! store. It holds the static configuration, the plain native ledger keeper,
//! and a handle to the contract execution substrate.
//!
//! - `token_pairs` - Registry reads and writes
//! - `params` - Bridging switch and precompile sets
//! - `registration` - Governance and automatic pair creation
//! - `evm` - Privileged contract calls
//! - `convert` - Conversions between the two ledgers
//! - `precompiles` - Native contract handlers for token pairs
//! - `ibc_callbacks` - Transfer packet lifecycle decisions
//! - `bank_bridge` - Hooks used by the dual-ledger bank facade
//! - `invariants` - Escrow/supply checks

mod bank_bridge;
mod convert;
mod evm;
mod ibc_callbacks;
mod invariants;
mod params;
mod precompiles;
mod registration;
mod token_pairs;

use std::sync::Arc;

use alloy_primitives::Address;

use bank::config::{ERC20, GOV};
use bank::BankKeeper;
use common::address::{module_address, to_hex, DEFAULT_HRP};

use crate::error::Erc20Error;
use crate::expected_keepers::EvmKeeper;

pub use evm::{monitor_approval_event, Erc20Data};
pub use ibc_callbacks::ReceiveOutcome;
pub use precompiles::{Erc20Precompile, PrecompileRegistrar};
pub(crate) use params::load_params;
pub(crate) use token_pairs::load_pair_by_address;

/// Static ERC20 module configuration
#[derive(Clone, Debug)]
pub struct Erc20Config {
    /// Account allowed to run governance operations
    pub authority: Address,
    /// Name of the module account used as conversion escrow
    pub module_name: String,
    /// Staking denom; never converted
    pub bond_denom: String,
    /// Bech32 prefix of local accounts
    pub hrp: String,
    /// Denom namespaces that are never bridged (e.g. token factory coins)
    pub non_bridgeable_prefixes: Vec<String>,
}

impl Default for Erc20Config {
    fn default() -> Self {
        Self {
            authority: module_address(GOV),
            module_name: ERC20.to_string(),
            bond_denom: "aISLM".to_string(),
            hrp: DEFAULT_HRP.to_string(),
            non_bridgeable_prefixes: vec!["factory/".to_string()],
        }
    }
}

#[derive(Clone)]
pub struct Keeper {
    config: Erc20Config,
    bank: BankKeeper,
    evm: Arc<dyn EvmKeeper>,
}

impl Keeper {
    pub fn new(config: Erc20Config, bank: BankKeeper, evm: Arc<dyn EvmKeeper>) -> Self {
        Self { config, bank, evm }
    }

    pub fn config(&self) -> &Erc20Config {
        &self.config
    }

    pub fn bank(&self) -> &BankKeeper {
        &self.bank
    }

    pub fn evm(&self) -> &dyn EvmKeeper {
        self.evm.as_ref()
    }

    /// Escrow account and owner of every module-deployed contract
    pub fn module_address(&self) -> Address {
        module_address(&self.config.module_name)
    }

    pub fn ensure_authority(&self, sender: &Address) -> Result<(), Erc20Error> {
        if *sender != self.config.authority {
            return Err(Erc20Error::Unauthorized {
                expected: to_hex(&self.config.authority),
                actual: to_hex(sender),
            });
        }
        Ok(())
    }
}

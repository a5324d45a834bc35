//! State definitions for the ERC20 module
//!
//! Token pairs are keyed by their id, `sha256("<checksum address>|<denom>")`,
//! with secondary indexes from denom and from contract address back to the
//! id. Module parameters live in a single item.

use alloy_primitives::Address;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, StdError, StdResult, Uint256};
use cw_storage_plus::{Item, Map};

use common::address::{parse_evm_address, to_hex};
use common::coin::validate_denom;
use common::hash::sha256;

/// Module name recorded with cw2
pub const MODULE_NAME: &str = "crates.io:erc20-module";
/// Module version recorded with cw2
pub const MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Token Pairs
// ============================================================================

/// Who controls the contract side of a pair
#[cw_serde]
pub enum Owner {
    Unspecified,
    /// Synthetic contract (or precompile) minted and burned by the module
    Module,
    /// Independently deployed contract; the module only escrows it
    External,
}

/// Binding between a native denom and a token contract
#[cw_serde]
pub struct TokenPair {
    /// EIP-55 hex address of the token contract
    pub erc20_address: String,
    pub denom: String,
    pub enabled: bool,
    pub contract_owner: Owner,
}

impl TokenPair {
    pub fn new(address: Address, denom: impl Into<String>, owner: Owner) -> Self {
        Self {
            erc20_address: to_hex(&address),
            denom: denom.into(),
            enabled: true,
            contract_owner: owner,
        }
    }

    pub fn id(&self) -> Vec<u8> {
        token_pair_id(&self.erc20_address, &self.denom)
    }

    pub fn address(&self) -> StdResult<Address> {
        parse_evm_address(&self.erc20_address).map(Address::from)
    }

    pub fn validate(&self) -> StdResult<()> {
        validate_denom(&self.denom)?;
        self.address()?;
        if self.contract_owner == Owner::Unspecified {
            return Err(StdError::generic_err(format!(
                "token pair {} has no owner",
                self.denom
            )));
        }
        Ok(())
    }

    /// The native coin is the original; the contract is module-minted
    pub fn is_native_coin(&self) -> bool {
        self.contract_owner == Owner::Module
    }

    /// The contract is the original; the native coin is module-minted
    pub fn is_native_erc20(&self) -> bool {
        self.contract_owner == Owner::External
    }
}

/// Deterministic pair id over the canonical `address|denom` string
pub fn token_pair_id(erc20_address: &str, denom: &str) -> Vec<u8> {
    sha256(format!("{erc20_address}|{denom}").as_bytes()).to_vec()
}

/// id -> pair
pub const TOKEN_PAIRS: Map<&[u8], TokenPair> = Map::new("erc20_token_pairs");

/// denom -> id
pub const TOKEN_PAIR_ID_BY_DENOM: Map<&str, Binary> = Map::new("erc20_pair_id_by_denom");

/// contract address bytes -> id
pub const TOKEN_PAIR_ID_BY_ERC20: Map<&[u8], Binary> = Map::new("erc20_pair_id_by_erc20");

// ============================================================================
// Parameters
// ============================================================================

#[cw_serde]
pub struct Params {
    /// Global bridging switch
    pub enable_erc20: bool,
    /// Precompiles of coins native to this chain
    pub native_precompiles: Vec<String>,
    /// Precompiles activated for onboarded cross-chain coins
    pub dynamic_precompiles: Vec<String>,
    /// Channels whose counterparty shares this chain's account derivation
    pub evm_channels: Vec<String>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            enable_erc20: true,
            native_precompiles: vec![],
            dynamic_precompiles: vec![],
            evm_channels: vec![],
        }
    }
}

impl Params {
    pub fn validate(&self) -> StdResult<()> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in self.native_precompiles.iter().chain(&self.dynamic_precompiles) {
            let addr = parse_evm_address(entry)?;
            if !seen.insert(addr) {
                return Err(StdError::generic_err(format!(
                    "duplicate precompile {entry}"
                )));
            }
        }

        let mut channels = std::collections::BTreeSet::new();
        for channel in &self.evm_channels {
            let valid = channel
                .strip_prefix("channel-")
                .is_some_and(|n| n.parse::<u64>().is_ok());
            if !valid {
                return Err(StdError::generic_err(format!("invalid channel id {channel}")));
            }
            if !channels.insert(channel) {
                return Err(StdError::generic_err(format!("duplicate channel {channel}")));
            }
        }
        Ok(())
    }

    pub fn is_native_precompile(&self, address: &Address) -> bool {
        contains_address(&self.native_precompiles, address)
    }

    pub fn is_dynamic_precompile(&self, address: &Address) -> bool {
        contains_address(&self.dynamic_precompiles, address)
    }

    pub fn is_precompile(&self, address: &Address) -> bool {
        self.is_native_precompile(address) || self.is_dynamic_precompile(address)
    }

    pub fn is_evm_channel(&self, channel: &str) -> bool {
        self.evm_channels.iter().any(|c| c == channel)
    }
}

fn contains_address(list: &[String], address: &Address) -> bool {
    list.iter()
        .any(|entry| parse_evm_address(entry).is_ok_and(|raw| raw == address.0 .0))
}

pub const PARAMS: Item<Params> = Item::new("erc20_params");

// ============================================================================
// Precompile Allowances
// ============================================================================

/// (token contract, owner, spender) -> allowance, for precompile-backed tokens
pub const ALLOWANCES: Map<(&[u8], &[u8], &[u8]), Uint256> = Map::new("erc20_allowances");

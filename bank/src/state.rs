//! State definitions for the bank module

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;
use cw_storage_plus::{Item, Map};

use common::Coin;
use common::Metadata;

/// Module name recorded with cw2
pub const MODULE_NAME: &str = "crates.io:bank-module";
/// Module version recorded with cw2
pub const MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Ledger
// ============================================================================

/// (address bytes, denom) -> balance
pub const BALANCES: Map<(&[u8], &str), Uint256> = Map::new("bank_balances");

/// denom -> total supply
pub const SUPPLY: Map<&str, Uint256> = Map::new("bank_supply");

/// (address bytes, denom) -> amount that may not be spent (vesting, bonding)
pub const LOCKED: Map<(&[u8], &str), Uint256> = Map::new("bank_locked");

// ============================================================================
// Accounts & Metadata
// ============================================================================

#[cw_serde]
pub struct AccountInfo {
    pub account_number: u64,
    /// Block height the account was first materialized at
    pub created_at: u64,
}

pub const ACCOUNTS: Map<&[u8], AccountInfo> = Map::new("bank_accounts");

pub const NEXT_ACCOUNT_NUMBER: Item<u64> = Item::new("bank_next_account_number");

pub const DENOM_METADATA: Map<&str, Metadata> = Map::new("bank_denom_metadata");

// ============================================================================
// Fee Pool
// ============================================================================

/// Raw key of the distribution fee pool. It is owned by the distribution
/// module and only ever read and written as a whole blob.
pub const FEE_POOL_KEY: &[u8] = b"distribution_fee_pool";

#[cw_serde]
#[derive(Default)]
pub struct FeePool {
    pub community_pool: Vec<Coin>,
}

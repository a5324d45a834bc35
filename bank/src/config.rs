//! Static bank module configuration

use cosmwasm_schema::cw_serde;

pub const FEE_COLLECTOR: &str = "fee_collector";
pub const DISTRIBUTION: &str = "distribution";
pub const BONDED_POOL: &str = "bonded_tokens_pool";
pub const NOT_BONDED_POOL: &str = "not_bonded_tokens_pool";
pub const GOV: &str = "gov";
pub const MINT: &str = "mint";
pub const ERC20: &str = "erc20";
pub const TRANSFER: &str = "transfer";

/// Bank configuration, fixed at node start
#[cw_serde]
pub struct BankConfig {
    /// Bech32 prefix used when rendering accounts in events
    pub hrp: String,
    /// Module accounts known to the ledger
    pub module_accounts: Vec<String>,
    /// Module accounts that cannot receive funds through user sends
    pub blocked_modules: Vec<String>,
    /// Modules whose burns are redirected to the community pool
    pub community_pool_burners: Vec<String>,
    /// Module that holds community pool funds
    pub distribution_module: String,
}

impl Default for BankConfig {
    fn default() -> Self {
        let modules = [
            FEE_COLLECTOR,
            DISTRIBUTION,
            BONDED_POOL,
            NOT_BONDED_POOL,
            GOV,
            MINT,
            ERC20,
            TRANSFER,
        ];
        Self {
            hrp: common::address::DEFAULT_HRP.to_string(),
            module_accounts: modules.iter().map(|m| m.to_string()).collect(),
            blocked_modules: [FEE_COLLECTOR, BONDED_POOL, NOT_BONDED_POOL, MINT, ERC20, TRANSFER]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            community_pool_burners: [GOV, BONDED_POOL, NOT_BONDED_POOL]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            distribution_module: DISTRIBUTION.to_string(),
        }
    }
}

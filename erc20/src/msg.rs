//! Message types for the ERC20 module

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Uint256};

use common::{Coin, Metadata};

use crate::state::{Params, TokenPair};

#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // User Operations
    // ========================================================================
    /// Convert native coins of the signer into contract tokens
    ConvertCoin {
        coin: Coin,
        /// Hex or bech32 address receiving the tokens
        receiver: String,
    },

    /// Convert contract tokens of the signer into native coins
    ConvertErc20 {
        contract_address: String,
        amount: Uint256,
        /// Hex or bech32 address receiving the coins
        receiver: String,
    },

    // ========================================================================
    // Governance Operations
    // ========================================================================
    UpdateParams { params: Params },

    /// Deploy a module-owned contract for an existing native coin
    RegisterCoin { metadata: Metadata },

    /// Onboard an externally deployed contract
    RegisterErc20 { contract_address: String },

    /// Enable or disable conversions of a pair (denom, address or id)
    ToggleConversion { token: String },

    DeleteTokenPair { token: String },

    /// Replace a drained module-owned contract with a precompile
    MigrateToPrecompile { token: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Registered pairs in id order
    #[returns(TokenPairsResponse)]
    TokenPairs {
        start_after: Option<Binary>,
        limit: Option<u32>,
    },

    /// One pair by denom, hex address or id
    #[returns(TokenPairResponse)]
    TokenPair { token: String },

    #[returns(Params)]
    Params {},

    #[returns(PrecompileAvailableResponse)]
    IsPrecompileAvailable { address: String },

    /// Supply conservation check over every enabled bytecode pair
    #[returns(InvariantResponse)]
    EscrowInvariant {},
}

#[cw_serde]
pub struct TokenPairResponse {
    pub id: Binary,
    pub token_pair: TokenPair,
}

#[cw_serde]
pub struct TokenPairsResponse {
    pub token_pairs: Vec<TokenPairResponse>,
}

#[cw_serde]
pub struct PrecompileAvailableResponse {
    pub available: bool,
}

#[cw_serde]
pub struct InvariantResponse {
    pub broken: bool,
    pub violations: Vec<String>,
}

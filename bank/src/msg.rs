//! Message types for the bank module

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint256;

use common::{Coin, Metadata};

use crate::state::FeePool;

#[cw_serde]
pub enum ExecuteMsg {
    /// Send coins from the signer to another account
    Send {
        to_address: String,
        amount: Vec<Coin>,
    },
    /// Send coins from the signer to several accounts at once
    MultiSend { outputs: Vec<Output> },
}

#[cw_serde]
pub struct Output {
    pub address: String,
    pub coins: Vec<Coin>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Combined native and contract-side balance of one denom
    #[returns(BalanceResponse)]
    Balance { address: String, denom: String },

    #[returns(AllBalancesResponse)]
    AllBalances { address: String },

    #[returns(AllBalancesResponse)]
    SpendableBalances { address: String },

    #[returns(SupplyResponse)]
    Supply { denom: String },

    #[returns(DenomMetadataResponse)]
    DenomMetadata { denom: String },

    #[returns(FeePool)]
    CommunityPool {},
}

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Coin,
}

#[cw_serde]
pub struct AllBalancesResponse {
    pub balances: Vec<Coin>,
}

#[cw_serde]
pub struct SupplyResponse {
    pub amount: Uint256,
}

#[cw_serde]
pub struct DenomMetadataResponse {
    pub metadata: Option<Metadata>,
}

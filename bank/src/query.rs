use cosmwasm_std::{to_json_binary, Binary, Storage};

use common::address::parse_account;
use common::{BlockInfo, Context};

use crate::error::BankError;
use crate::msg::{
    AllBalancesResponse, BalanceResponse, DenomMetadataResponse, QueryMsg, SupplyResponse,
};
use crate::wrapped::{Erc20Keeper, WrappedKeeper};

pub fn query<E: Erc20Keeper>(
    store: &dyn Storage,
    block: &BlockInfo,
    keeper: &WrappedKeeper<E>,
    msg: QueryMsg,
) -> Result<Binary, E::Error> {
    Context::read_only(store, block, |ctx| match msg {
        QueryMsg::Balance { address, denom } => {
            let addr = parse_address(&address)?;
            let balance = keeper.balance(ctx, &addr, &denom)?;
            Ok(to_json_binary(&BalanceResponse { balance })?)
        }
        QueryMsg::AllBalances { address } => {
            let addr = parse_address(&address)?;
            let balances = keeper.all_balances(ctx, &addr)?;
            Ok(to_json_binary(&AllBalancesResponse { balances })?)
        }
        QueryMsg::SpendableBalances { address } => {
            let addr = parse_address(&address)?;
            let balances = keeper.spendable_balances(ctx, &addr)?;
            Ok(to_json_binary(&AllBalancesResponse { balances })?)
        }
        QueryMsg::Supply { denom } => {
            let amount = keeper.bank().supply(ctx.store, &denom)?;
            Ok(to_json_binary(&SupplyResponse { amount })?)
        }
        QueryMsg::DenomMetadata { denom } => {
            let metadata = keeper.bank().denom_metadata(ctx.store, &denom)?;
            Ok(to_json_binary(&DenomMetadataResponse { metadata })?)
        }
        QueryMsg::CommunityPool {} => Ok(to_json_binary(&keeper.bank().fee_pool(ctx.store)?)?),
    })
}

fn parse_address(address: &str) -> Result<alloy_primitives::Address, BankError> {
    parse_account(address).map_err(|e| BankError::InvalidAddress {
        reason: e.to_string(),
    })
}

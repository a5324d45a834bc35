//! ERC20 module entry points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use alloy_primitives::Address;
use cosmwasm_std::{to_json_binary, Binary, Response, Storage};

use common::{BlockInfo, Context};

use crate::error::Erc20Error;
use crate::execute::{
    execute_convert_coin, execute_convert_erc20, execute_delete_token_pair,
    execute_migrate_to_precompile, execute_register_coin, execute_register_erc20,
    execute_toggle_conversion, execute_update_params,
};
use crate::keeper::Keeper;
use crate::msg::{ExecuteMsg, QueryMsg};
use crate::query::{
    query_escrow_invariant, query_is_precompile_available, query_token_pair, query_token_pairs,
};

// ============================================================================
// Execute
// ============================================================================

/// Run one message signed by `sender`. A failing message leaves no writes
/// and no events behind.
pub fn execute(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    msg: ExecuteMsg,
) -> Result<Response, Erc20Error> {
    ctx.cached(|ctx| match msg {
        // User operations
        ExecuteMsg::ConvertCoin { coin, receiver } => {
            execute_convert_coin(ctx, keeper, sender, coin, receiver)
        }
        ExecuteMsg::ConvertErc20 {
            contract_address,
            amount,
            receiver,
        } => execute_convert_erc20(ctx, keeper, sender, contract_address, amount, receiver),

        // Governance operations
        ExecuteMsg::UpdateParams { params } => execute_update_params(ctx, keeper, sender, params),
        ExecuteMsg::RegisterCoin { metadata } => {
            execute_register_coin(ctx, keeper, sender, metadata)
        }
        ExecuteMsg::RegisterErc20 { contract_address } => {
            execute_register_erc20(ctx, keeper, sender, contract_address)
        }
        ExecuteMsg::ToggleConversion { token } => {
            execute_toggle_conversion(ctx, keeper, sender, token)
        }
        ExecuteMsg::DeleteTokenPair { token } => {
            execute_delete_token_pair(ctx, keeper, sender, token)
        }
        ExecuteMsg::MigrateToPrecompile { token } => {
            execute_migrate_to_precompile(ctx, keeper, sender, token)
        }
    })
}

// ============================================================================
// Query
// ============================================================================

pub fn query(
    store: &dyn Storage,
    block: &BlockInfo,
    keeper: &Keeper,
    msg: QueryMsg,
) -> Result<Binary, Erc20Error> {
    Context::read_only(store, block, |ctx| match msg {
        QueryMsg::TokenPairs { start_after, limit } => Ok(to_json_binary(&query_token_pairs(
            ctx.store,
            keeper,
            start_after,
            limit,
        )?)?),
        QueryMsg::TokenPair { token } => {
            Ok(to_json_binary(&query_token_pair(ctx.store, keeper, &token)?)?)
        }
        QueryMsg::Params {} => Ok(to_json_binary(&keeper.params(ctx.store)?)?),
        QueryMsg::IsPrecompileAvailable { address } => Ok(to_json_binary(
            &query_is_precompile_available(ctx.store, keeper, &address)?,
        )?),
        QueryMsg::EscrowInvariant {} => {
            Ok(to_json_binary(&query_escrow_invariant(ctx, keeper)?)?)
        }
    })
}

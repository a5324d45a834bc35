//! Governance handlers.
//!
//! Every handler checks the signer against the configured authority first.

use alloy_primitives::Address;
use cosmwasm_std::Response;

use common::address::parse_evm_address;
use common::{Context, Metadata};

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::{Params, TokenPair};

fn pair_response(method: &str, pair: TokenPair) -> Response {
    Response::new()
        .add_attribute("method", method)
        .add_attribute("cosmos_coin", pair.denom)
        .add_attribute("erc20_token", pair.erc20_address)
        .add_attribute("enabled", pair.enabled.to_string())
}

// ============================================================================
// Parameters
// ============================================================================

pub fn execute_update_params(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    params: Params,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    keeper.set_params(ctx, &params)?;

    tracing::info!(
        target: "erc20::registry",
        enable_erc20 = params.enable_erc20,
        "updated params"
    );
    Ok(Response::new()
        .add_attribute("method", "update_params")
        .add_attribute("enable_erc20", params.enable_erc20.to_string()))
}

// ============================================================================
// Registration
// ============================================================================

pub fn execute_register_coin(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    metadata: Metadata,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    let pair = keeper.register_coin(ctx, &metadata)?;
    Ok(pair_response("register_coin", pair))
}

pub fn execute_register_erc20(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    contract_address: String,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    let contract = parse_evm_address(&contract_address)
        .map(Address::from)
        .map_err(|e| Erc20Error::InvalidAddress {
            reason: format!("contract {contract_address}: {e}"),
        })?;
    let pair = keeper.register_erc20(ctx, contract)?;
    Ok(pair_response("register_erc20", pair))
}

// ============================================================================
// Pair Lifecycle
// ============================================================================

pub fn execute_toggle_conversion(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    token: String,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    let pair = keeper.toggle_conversion(ctx, &token)?;
    Ok(pair_response("toggle_conversion", pair))
}

pub fn execute_delete_token_pair(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    token: String,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    let pair = keeper.delete_token_pair(ctx, &token)?;
    Ok(pair_response("delete_token_pair", pair))
}

pub fn execute_migrate_to_precompile(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    token: String,
) -> Result<Response, Erc20Error> {
    keeper.ensure_authority(sender)?;
    let pair = keeper.migrate_to_precompile(ctx, &token)?;
    Ok(pair_response("migrate_to_precompile", pair))
}

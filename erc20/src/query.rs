//! Query handlers for the ERC20 module.

use alloy_primitives::Address;
use cosmwasm_std::{Binary, Storage};

use common::address::parse_evm_address;
use common::Context;

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::msg::{
    InvariantResponse, PrecompileAvailableResponse, TokenPairResponse, TokenPairsResponse,
};

pub fn query_token_pairs(
    store: &dyn Storage,
    keeper: &Keeper,
    start_after: Option<Binary>,
    limit: Option<u32>,
) -> Result<TokenPairsResponse, Erc20Error> {
    let token_pairs = keeper
        .token_pairs_paged(store, start_after, limit)?
        .into_iter()
        .map(|(id, token_pair)| TokenPairResponse { id, token_pair })
        .collect();
    Ok(TokenPairsResponse { token_pairs })
}

pub fn query_token_pair(
    store: &dyn Storage,
    keeper: &Keeper,
    token: &str,
) -> Result<TokenPairResponse, Erc20Error> {
    let token_pair = keeper
        .lookup_token_pair(store, token)?
        .ok_or_else(|| Erc20Error::TokenPairNotFound {
            token: token.to_string(),
        })?;
    Ok(TokenPairResponse {
        id: Binary::from(token_pair.id()),
        token_pair,
    })
}

pub fn query_is_precompile_available(
    store: &dyn Storage,
    keeper: &Keeper,
    address: &str,
) -> Result<PrecompileAvailableResponse, Erc20Error> {
    let address = parse_evm_address(address).map_err(|e| Erc20Error::InvalidAddress {
        reason: e.to_string(),
    })?;
    let available = keeper.params(store)?.is_precompile(&Address::from(address));
    Ok(PrecompileAvailableResponse { available })
}

pub fn query_escrow_invariant(
    ctx: &mut Context,
    keeper: &Keeper,
) -> Result<InvariantResponse, Erc20Error> {
    let violations = keeper.escrow_invariant(ctx)?;
    Ok(InvariantResponse {
        broken: !violations.is_empty(),
        violations,
    })
}

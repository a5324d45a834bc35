use alloy_primitives::Address;
use cosmwasm_std::{Binary, Order, StdResult, Storage};
use cw_storage_plus::Bound;

use common::address::parse_evm_address;
use common::Context;

use crate::keeper::Keeper;
use crate::state::{TokenPair, TOKEN_PAIRS, TOKEN_PAIR_ID_BY_DENOM, TOKEN_PAIR_ID_BY_ERC20};

/// Default page size for paged registry reads
pub const DEFAULT_LIMIT: u32 = 10;
/// Maximum page size for paged registry reads
pub const MAX_LIMIT: u32 = 100;

pub(crate) fn load_pair_by_denom(store: &dyn Storage, denom: &str) -> StdResult<Option<TokenPair>> {
    match TOKEN_PAIR_ID_BY_DENOM.may_load(store, denom)? {
        Some(id) => TOKEN_PAIRS.may_load(store, id.as_slice()),
        None => Ok(None),
    }
}

pub(crate) fn load_pair_by_address(
    store: &dyn Storage,
    address: &Address,
) -> StdResult<Option<TokenPair>> {
    match TOKEN_PAIR_ID_BY_ERC20.may_load(store, address.as_slice())? {
        Some(id) => TOKEN_PAIRS.may_load(store, id.as_slice()),
        None => Ok(None),
    }
}

impl Keeper {
    // ========================================================================
    // Reads
    // ========================================================================

    pub fn token_pair(&self, store: &dyn Storage, id: &[u8]) -> StdResult<Option<TokenPair>> {
        TOKEN_PAIRS.may_load(store, id)
    }

    pub fn token_pair_by_denom(
        &self,
        store: &dyn Storage,
        denom: &str,
    ) -> StdResult<Option<TokenPair>> {
        load_pair_by_denom(store, denom)
    }

    pub fn token_pair_by_address(
        &self,
        store: &dyn Storage,
        address: &Address,
    ) -> StdResult<Option<TokenPair>> {
        load_pair_by_address(store, address)
    }

    /// Resolve a user-supplied token reference: a `0x` contract address, a
    /// 64 character hex pair id, or a denom.
    pub fn lookup_token_pair(&self, store: &dyn Storage, token: &str) -> StdResult<Option<TokenPair>> {
        if token.starts_with("0x") {
            let address = Address::from(parse_evm_address(token)?);
            return load_pair_by_address(store, &address);
        }
        if token.len() == 64 {
            if let Ok(id) = hex::decode(token) {
                if let Some(pair) = TOKEN_PAIRS.may_load(store, &id)? {
                    return Ok(Some(pair));
                }
            }
        }
        load_pair_by_denom(store, token)
    }

    /// All pairs in id order
    pub fn token_pairs(&self, store: &dyn Storage) -> StdResult<Vec<TokenPair>> {
        TOKEN_PAIRS
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(_, pair)| pair))
            .collect()
    }

    /// One page of pairs in id order, with their ids
    pub fn token_pairs_paged(
        &self,
        store: &dyn Storage,
        start_after: Option<Binary>,
        limit: Option<u32>,
    ) -> StdResult<Vec<(Binary, TokenPair)>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
        let start = start_after.as_ref().map(|id| Bound::exclusive(id.as_slice()));

        TOKEN_PAIRS
            .range(store, start, None, Order::Ascending)
            .take(limit)
            .map(|item| item.map(|(id, pair)| (Binary::from(id), pair)))
            .collect()
    }

    pub fn is_token_pair_registered(&self, store: &dyn Storage, id: &[u8]) -> bool {
        TOKEN_PAIRS.has(store, id)
    }

    pub fn is_denom_registered(&self, store: &dyn Storage, denom: &str) -> bool {
        TOKEN_PAIR_ID_BY_DENOM.has(store, denom)
    }

    pub fn is_erc20_registered(&self, store: &dyn Storage, address: &Address) -> bool {
        TOKEN_PAIR_ID_BY_ERC20.has(store, address.as_slice())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Store a pair and both of its indexes
    pub fn set_token_pair(&self, ctx: &mut Context, pair: &TokenPair) -> StdResult<()> {
        let id = pair.id();
        let address = pair.address()?;
        TOKEN_PAIRS.save(ctx.store, &id, pair)?;
        TOKEN_PAIR_ID_BY_DENOM.save(ctx.store, &pair.denom, &Binary::from(id.clone()))?;
        TOKEN_PAIR_ID_BY_ERC20.save(ctx.store, address.as_slice(), &Binary::from(id))?;
        Ok(())
    }

    /// Remove a pair and both of its indexes
    pub fn remove_token_pair(&self, ctx: &mut Context, pair: &TokenPair) -> StdResult<()> {
        let address = pair.address()?;
        TOKEN_PAIRS.remove(ctx.store, &pair.id());
        TOKEN_PAIR_ID_BY_DENOM.remove(ctx.store, &pair.denom);
        TOKEN_PAIR_ID_BY_ERC20.remove(ctx.store, address.as_slice());
        Ok(())
    }
}

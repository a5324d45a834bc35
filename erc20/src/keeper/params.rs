use alloy_primitives::Address;
use cosmwasm_std::{StdResult, Storage};

use common::address::to_hex;
use common::Context;

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::{Params, PARAMS};

/// Stored parameters, or the defaults before genesis
pub(crate) fn load_params(store: &dyn Storage) -> StdResult<Params> {
    Ok(PARAMS.may_load(store)?.unwrap_or_default())
}

impl Keeper {
    pub fn params(&self, store: &dyn Storage) -> StdResult<Params> {
        load_params(store)
    }

    pub fn set_params(&self, ctx: &mut Context, params: &Params) -> Result<(), Erc20Error> {
        params.validate()?;
        PARAMS.save(ctx.store, params)?;
        Ok(())
    }

    pub fn is_erc20_enabled(&self, store: &dyn Storage) -> StdResult<bool> {
        Ok(load_params(store)?.enable_erc20)
    }

    /// Add `address` to the precompiles of onboarded cross-chain coins
    pub fn enable_dynamic_precompile(
        &self,
        ctx: &mut Context,
        address: &Address,
    ) -> Result<(), Erc20Error> {
        let mut params = load_params(ctx.store)?;
        if params.is_precompile(address) {
            return Ok(());
        }
        params.dynamic_precompiles.push(to_hex(address));
        params.dynamic_precompiles.sort();
        self.set_params(ctx, &params)
    }

    /// Add `address` to the precompiles of coins native to this chain
    pub fn enable_native_precompile(
        &self,
        ctx: &mut Context,
        address: &Address,
    ) -> Result<(), Erc20Error> {
        let mut params = load_params(ctx.store)?;
        if params.is_precompile(address) {
            return Ok(());
        }
        params.native_precompiles.push(to_hex(address));
        params.native_precompiles.sort();
        self.set_params(ctx, &params)
    }

    /// Drop `address` from both precompile sets
    pub fn disable_precompile(&self, ctx: &mut Context, address: &Address) -> Result<(), Erc20Error> {
        let mut params = load_params(ctx.store)?;
        if !params.is_precompile(address) {
            return Ok(());
        }
        let hex = to_hex(address);
        params
            .native_precompiles
            .retain(|entry| !entry.eq_ignore_ascii_case(&hex));
        params
            .dynamic_precompiles
            .retain(|entry| !entry.eq_ignore_ascii_case(&hex));
        self.set_params(ctx, &params)
    }
}

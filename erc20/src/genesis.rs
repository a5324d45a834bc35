//! ERC20 genesis import and export

use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Storage};
use cw2::set_contract_version;

use common::Context;

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::{Params, TokenPair, MODULE_NAME, MODULE_VERSION};

#[cw_serde]
#[derive(Default)]
pub struct GenesisState {
    pub params: Params,
    pub token_pairs: Vec<TokenPair>,
}

impl GenesisState {
    /// Pairs must be valid and unique by id, denom and address
    pub fn validate(&self) -> StdResult<()> {
        self.params.validate()?;

        let mut ids = BTreeSet::new();
        let mut denoms = BTreeSet::new();
        let mut addresses = BTreeSet::new();
        for pair in &self.token_pairs {
            pair.validate()?;
            if !ids.insert(pair.id()) {
                return Err(StdError::generic_err(format!(
                    "duplicate token pair {} / {}",
                    pair.erc20_address, pair.denom
                )));
            }
            if !denoms.insert(pair.denom.as_str()) {
                return Err(StdError::generic_err(format!(
                    "duplicate denom {}",
                    pair.denom
                )));
            }
            if !addresses.insert(pair.address()?) {
                return Err(StdError::generic_err(format!(
                    "duplicate erc20 address {}",
                    pair.erc20_address
                )));
            }
        }
        Ok(())
    }
}

impl Keeper {
    pub fn init_genesis(&self, ctx: &mut Context, genesis: &GenesisState) -> Result<(), Erc20Error> {
        genesis.validate()?;
        set_contract_version(ctx.store, MODULE_NAME, MODULE_VERSION)?;

        self.set_params(ctx, &genesis.params)?;
        for pair in &genesis.token_pairs {
            self.set_token_pair(ctx, pair)?;
        }

        tracing::info!(
            target: "erc20::registry",
            pairs = genesis.token_pairs.len(),
            "initialized erc20 genesis"
        );
        Ok(())
    }

    pub fn export_genesis(&self, store: &dyn Storage) -> StdResult<GenesisState> {
        Ok(GenesisState {
            params: self.params(store)?,
            token_pairs: self.token_pairs(store)?,
        })
    }
}

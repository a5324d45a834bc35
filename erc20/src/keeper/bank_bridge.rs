//! The ERC20 side of the dual-ledger bank facade

use alloy_primitives::Address;
use cosmwasm_std::{Storage, Uint256};

use bank::{DualPair, Erc20Keeper};
use common::address::parse_evm_address;
use common::Context;

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::{Owner, Params, TokenPair};

/// Pairs whose contract keeps a ledger of its own. Precompile pairs read
/// the native ledger and would be counted twice.
fn is_dual(params: &Params, pair: &TokenPair) -> bool {
    pair.enabled
        && pair.contract_owner != Owner::Unspecified
        && pair
            .address()
            .is_ok_and(|address| !params.is_precompile(&address))
}

fn dual_pair(pair: TokenPair) -> DualPair {
    DualPair {
        denom: pair.denom,
        contract: pair.erc20_address,
    }
}

fn contract_address(pair: &DualPair) -> Result<Address, Erc20Error> {
    Ok(Address::from(parse_evm_address(&pair.contract)?))
}

impl Erc20Keeper for Keeper {
    type Error = Erc20Error;

    fn dual_pair(&self, store: &dyn Storage, denom: &str) -> Result<Option<DualPair>, Erc20Error> {
        let params = self.params(store)?;
        if !params.enable_erc20 {
            return Ok(None);
        }
        Ok(self
            .token_pair_by_denom(store, denom)?
            .filter(|pair| is_dual(&params, pair))
            .map(dual_pair))
    }

    fn dual_pairs(&self, store: &dyn Storage) -> Result<Vec<DualPair>, Erc20Error> {
        let params = self.params(store)?;
        if !params.enable_erc20 {
            return Ok(vec![]);
        }
        Ok(self
            .token_pairs(store)?
            .into_iter()
            .filter(|pair| is_dual(&params, pair))
            .map(dual_pair)
            .collect())
    }

    fn contract_balance(
        &self,
        ctx: &mut Context,
        pair: &DualPair,
        account: &Address,
    ) -> Result<Uint256, Erc20Error> {
        self.balance_of(ctx, contract_address(pair)?, *account)
    }

    fn convert_to_native(
        &self,
        ctx: &mut Context,
        pair: &DualPair,
        account: &Address,
        amount: Uint256,
    ) -> Result<(), Erc20Error> {
        let contract = contract_address(pair)?;
        self.convert_erc20(ctx, *account, *account, contract, amount)?;
        Ok(())
    }
}

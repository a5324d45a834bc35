//! Burn routing
//!
//! Burns requested by governance or the staking pools do not destroy supply.
//! The coins move to the distribution module and are credited to the
//! community pool instead.

use cosmwasm_std::{from_json, to_json_vec, Event, StdResult, Storage};

use common::coin::{coins_to_string, validate_coins};
use common::{Coin, Context};

use crate::error::BankError;
use crate::keeper::BankKeeper;
use crate::state::{FeePool, FEE_POOL_KEY};

impl BankKeeper {
    /// Burn coins held by `module`.
    pub fn burn_coins(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        validate_coins(coins).map_err(|e| BankError::InvalidCoins {
            reason: e.to_string(),
        })?;

        if self.config().community_pool_burners.iter().any(|m| m == module) {
            return self.fund_community_pool_from_module(ctx, module, coins);
        }

        self.destroy_coins(ctx, module, coins)
    }

    fn fund_community_pool_from_module(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let distribution = self.config().distribution_module.clone();
        self.send_coins_from_module_to_module(ctx, module, &distribution, coins)?;

        let mut pool = self.fee_pool(ctx.store)?;
        for coin in coins {
            add_coin(&mut pool.community_pool, coin)?;
        }
        ctx.store.set(FEE_POOL_KEY, &to_json_vec(&pool)?);

        tracing::info!(
            target: "bank::burn",
            module,
            amount = %coins_to_string(coins),
            "burn redirected to community pool"
        );
        ctx.emit(
            Event::new("fund_community_pool")
                .add_attribute("module", module)
                .add_attribute("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    /// Current fee pool, decoded from its raw bytes
    pub fn fee_pool(&self, store: &dyn Storage) -> StdResult<FeePool> {
        match store.get(FEE_POOL_KEY) {
            Some(bytes) => from_json(bytes),
            None => Ok(FeePool::default()),
        }
    }
}

fn add_coin(pool: &mut Vec<Coin>, coin: &Coin) -> Result<(), BankError> {
    match pool.iter_mut().find(|c| c.denom == coin.denom) {
        Some(existing) => existing.amount = existing.amount.checked_add(coin.amount)?,
        None => {
            pool.push(coin.clone());
            pool.sort_by(|a, b| a.denom.cmp(&b.denom));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BankConfig, BONDED_POOL, DISTRIBUTION, FEE_COLLECTOR, GOV};
    use common::{module_address, BlockInfo};
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::Uint256;

    fn setup(store: &mut MockStorage, module: &str, amount: u128) -> BankKeeper {
        let keeper = BankKeeper::new(BankConfig::default());
        let mut ctx = Context::new(store, BlockInfo::default());
        keeper
            .mint_coins(&mut ctx, module, &[Coin::new(amount, "aislm")])
            .unwrap();
        keeper
    }

    #[test]
    fn test_gov_burn_goes_to_community_pool() {
        let mut store = MockStorage::new();
        let keeper = setup(&mut store, GOV, 100);
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        keeper
            .burn_coins(&mut ctx, GOV, &[Coin::new(40u128, "aislm")])
            .unwrap();
        keeper
            .burn_coins(&mut ctx, GOV, &[Coin::new(10u128, "aislm")])
            .unwrap();

        // supply untouched, funds moved, pool credited once per burn
        assert_eq!(keeper.supply(ctx.store, "aislm").unwrap(), Uint256::from(100u128));
        assert_eq!(
            keeper.balance(ctx.store, &module_address(DISTRIBUTION), "aislm").unwrap(),
            Uint256::from(50u128)
        );
        let pool = keeper.fee_pool(ctx.store).unwrap();
        assert_eq!(pool.community_pool, vec![Coin::new(50u128, "aislm")]);
    }

    #[test]
    fn test_bonded_pool_burn_is_redirected() {
        let mut store = MockStorage::new();
        let keeper = setup(&mut store, BONDED_POOL, 10);
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        keeper
            .burn_coins(&mut ctx, BONDED_POOL, &[Coin::new(10u128, "aislm")])
            .unwrap();
        assert_eq!(
            keeper.fee_pool(ctx.store).unwrap().community_pool,
            vec![Coin::new(10u128, "aislm")]
        );
    }

    #[test]
    fn test_other_modules_burn_for_real() {
        let mut store = MockStorage::new();
        let keeper = setup(&mut store, FEE_COLLECTOR, 100);
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        keeper
            .burn_coins(&mut ctx, FEE_COLLECTOR, &[Coin::new(30u128, "aislm")])
            .unwrap();
        assert_eq!(keeper.supply(ctx.store, "aislm").unwrap(), Uint256::from(70u128));
        assert!(keeper.fee_pool(ctx.store).unwrap().community_pool.is_empty());
    }

    #[test]
    fn test_redirected_burn_requires_funds() {
        let mut store = MockStorage::new();
        let keeper = setup(&mut store, GOV, 5);
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let err = keeper
            .burn_coins(&mut ctx, GOV, &[Coin::new(6u128, "aislm")])
            .unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));
    }
}

//! Bank genesis import and export

use alloy_primitives::Address;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_vec, Order, StdError, StdResult, Storage};
use cw2::set_contract_version;

use common::address::{parse_account, to_hex};
use common::coin::validate_coins;
use common::{Coin, Context, Metadata};

use crate::error::BankError;
use crate::keeper::BankKeeper;
use crate::state::{FeePool, BALANCES, FEE_POOL_KEY, MODULE_NAME, MODULE_VERSION, SUPPLY};

#[cw_serde]
pub struct Balance {
    /// Hex or bech32 account address
    pub address: String,
    pub coins: Vec<Coin>,
}

#[cw_serde]
#[derive(Default)]
pub struct GenesisState {
    pub balances: Vec<Balance>,
    pub denom_metadata: Vec<Metadata>,
    pub fee_pool: FeePool,
}

impl GenesisState {
    pub fn validate(&self) -> StdResult<()> {
        for balance in &self.balances {
            parse_account(&balance.address)?;
            validate_coins(&balance.coins)?;
        }
        for metadata in &self.denom_metadata {
            metadata.validate()?;
        }
        Ok(())
    }
}

impl BankKeeper {
    /// Write the genesis ledger. Supply is recomputed from balances.
    pub fn init_genesis(&self, ctx: &mut Context, genesis: &GenesisState) -> Result<(), BankError> {
        genesis.validate()?;
        set_contract_version(ctx.store, MODULE_NAME, MODULE_VERSION)?;

        for balance in &genesis.balances {
            let addr = parse_account(&balance.address)?;
            for coin in &balance.coins {
                let amount = self.balance(ctx.store, &addr, &coin.denom)?.checked_add(coin.amount)?;
                self.set_balance(ctx.store, &addr, &coin.denom, amount)?;
                let supply = self.supply(ctx.store, &coin.denom)?.checked_add(coin.amount)?;
                SUPPLY.save(ctx.store, &coin.denom, &supply)?;
            }
            self.ensure_account(ctx, &addr)?;
        }

        for metadata in &genesis.denom_metadata {
            self.set_denom_metadata(ctx, metadata)?;
        }

        ctx.store.set(FEE_POOL_KEY, &to_json_vec(&genesis.fee_pool)?);
        Ok(())
    }

    pub fn export_genesis(&self, store: &dyn Storage) -> StdResult<GenesisState> {
        let mut balances: Vec<Balance> = vec![];
        for item in BALANCES.range(store, None, None, Order::Ascending) {
            let ((addr, denom), amount) = item?;
            let raw = <[u8; 20]>::try_from(addr.as_slice())
                .map_err(|_| StdError::generic_err("corrupt balance key"))?;
            let address = to_hex(&Address::from(raw));
            let coin = Coin { denom, amount };
            match balances.last_mut() {
                Some(last) if last.address == address => last.coins.push(coin),
                _ => balances.push(Balance {
                    address,
                    coins: vec![coin],
                }),
            }
        }

        Ok(GenesisState {
            balances,
            denom_metadata: self.all_denom_metadata(store)?,
            fee_pool: self.fee_pool(store)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BankConfig;
    use common::BlockInfo;
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::Uint256;

    #[test]
    fn test_genesis_roundtrip_recomputes_supply() {
        let keeper = BankKeeper::new(BankConfig::default());
        let mut store = MockStorage::new();
        let genesis = GenesisState {
            balances: vec![
                Balance {
                    address: "0x1111111111111111111111111111111111111111".to_string(),
                    coins: vec![Coin::new(10u128, "aislm"), Coin::new(5u128, "uatom")],
                },
                Balance {
                    address: "0x2222222222222222222222222222222222222222".to_string(),
                    coins: vec![Coin::new(7u128, "aislm")],
                },
            ],
            ..GenesisState::default()
        };

        let mut ctx = Context::new(&mut store, BlockInfo::default());
        keeper.init_genesis(&mut ctx, &genesis).unwrap();
        assert_eq!(keeper.supply(ctx.store, "aislm").unwrap(), Uint256::from(17u128));

        let exported = keeper.export_genesis(ctx.store).unwrap();
        assert_eq!(exported.balances.len(), 2);
        assert_eq!(exported.balances[0].coins.len(), 2);
        assert_eq!(
            cw2::get_contract_version(ctx.store).unwrap().contract,
            MODULE_NAME
        );
    }

    #[test]
    fn test_genesis_rejects_zero_coins() {
        let genesis = GenesisState {
            balances: vec![Balance {
                address: "0x1111111111111111111111111111111111111111".to_string(),
                coins: vec![Coin::new(0u128, "aislm")],
            }],
            ..GenesisState::default()
        };
        assert!(genesis.validate().is_err());
    }
}

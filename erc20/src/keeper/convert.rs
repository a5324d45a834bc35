//! Conversions between the native and the contract ledger
//!
//! The direction of value creation depends on who owns the contract:
//!
//! | owner    | convert coin                      | convert ERC20                      |
//! |----------|-----------------------------------|------------------------------------|
//! | Module   | escrow native, mint tokens        | burn tokens, release native        |
//! | External | burn native, release tokens       | escrow tokens, mint native         |
//!
//! Each flow checks the balance it just changed against the requested amount
//! and rejects contracts that emit an `Approval` along the way. Every flow
//! runs in a staged context so a failure leaves both ledgers untouched.

use alloy_primitives::Address;
use cosmwasm_std::{Event, Storage, Uint256};

use common::address::to_hex;
use common::{Coin, Context};

use crate::error::Erc20Error;
use crate::events::{
    ATTRIBUTE_AMOUNT, ATTRIBUTE_COSMOS_COIN, ATTRIBUTE_ERC20_TOKEN, ATTRIBUTE_RECEIVER,
    ATTRIBUTE_SENDER, EVENT_CONVERT_COIN, EVENT_CONVERT_ERC20,
};
use crate::keeper::evm::monitor_approval_event;
use crate::keeper::Keeper;
use crate::state::{Owner, TokenPair};

impl Keeper {
    /// Convert `coin` held natively by `sender` into contract tokens owned by
    /// `receiver`.
    pub fn convert_coin(
        &self,
        ctx: &mut Context,
        sender: Address,
        receiver: Address,
        coin: &Coin,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            if coin.amount.is_zero() {
                return Err(Erc20Error::InvalidAmount);
            }
            let pair = self.conversion_pair(ctx.store, &coin.denom)?;
            let contract = pair.address()?;

            let spendable = self.bank.spendable(ctx.store, &sender, &coin.denom)?;
            if spendable < coin.amount {
                return Err(Erc20Error::InsufficientFunds {
                    token: coin.denom.clone(),
                    available: spendable,
                    required: coin.amount,
                });
            }

            match pair.contract_owner {
                Owner::Module => {
                    self.convert_coin_native_coin(ctx, contract, sender, receiver, coin)?
                }
                Owner::External => {
                    self.convert_coin_native_erc20(ctx, contract, sender, receiver, coin)?
                }
                Owner::Unspecified => {
                    return Err(Erc20Error::UndefinedOwner {
                        token: pair.erc20_address,
                    })
                }
            }

            tracing::info!(
                target: "erc20::convert",
                sender = %sender,
                receiver = %receiver,
                amount = %coin,
                erc20 = %pair.erc20_address,
                "converted coin to erc20"
            );
            ctx.emit(
                Event::new(EVENT_CONVERT_COIN)
                    .add_attribute(ATTRIBUTE_SENDER, self.bank.display(&sender))
                    .add_attribute(ATTRIBUTE_RECEIVER, to_hex(&receiver))
                    .add_attribute(ATTRIBUTE_AMOUNT, coin.amount.to_string())
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &coin.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    /// Convert `amount` contract tokens held by `sender` into native coins
    /// owned by `receiver`.
    pub fn convert_erc20(
        &self,
        ctx: &mut Context,
        sender: Address,
        receiver: Address,
        contract: Address,
        amount: Uint256,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            if amount.is_zero() {
                return Err(Erc20Error::InvalidAmount);
            }
            let pair = match self.token_pair_by_address(ctx.store, &contract)? {
                Some(pair) => pair,
                None => {
                    return Err(Erc20Error::TokenPairNotFound {
                        token: to_hex(&contract),
                    })
                }
            };
            let pair = self.conversion_pair(ctx.store, &pair.denom)?;

            if self.bank.is_blocked(&receiver) {
                return Err(bank::BankError::BlockedAddress {
                    address: self.bank.display(&receiver),
                }
                .into());
            }

            let available = self.balance_of(ctx, contract, sender)?;
            if available < amount {
                return Err(Erc20Error::InsufficientFunds {
                    token: pair.erc20_address,
                    available,
                    required: amount,
                });
            }

            let coin = Coin::new(amount, pair.denom.clone());
            match pair.contract_owner {
                Owner::Module => {
                    self.convert_erc20_native_coin(ctx, contract, sender, receiver, &coin)?
                }
                Owner::External => {
                    self.convert_erc20_native_token(ctx, contract, sender, receiver, &coin)?
                }
                Owner::Unspecified => {
                    return Err(Erc20Error::UndefinedOwner {
                        token: pair.erc20_address,
                    })
                }
            }

            tracing::info!(
                target: "erc20::convert",
                sender = %sender,
                receiver = %receiver,
                amount = %coin,
                erc20 = %pair.erc20_address,
                "converted erc20 to coin"
            );
            ctx.emit(
                Event::new(EVENT_CONVERT_ERC20)
                    .add_attribute(ATTRIBUTE_SENDER, to_hex(&sender))
                    .add_attribute(ATTRIBUTE_RECEIVER, self.bank.display(&receiver))
                    .add_attribute(ATTRIBUTE_AMOUNT, amount.to_string())
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    /// The pair for `denom`, if bridging is on and the pair is convertible
    fn conversion_pair(&self, store: &dyn Storage, denom: &str) -> Result<TokenPair, Erc20Error> {
        let params = self.params(store)?;
        if !params.enable_erc20 {
            return Err(Erc20Error::Erc20Disabled);
        }
        let pair = self
            .token_pair_by_denom(store, denom)?
            .ok_or_else(|| Erc20Error::TokenPairNotFound {
                token: denom.to_string(),
            })?;
        if !pair.enabled {
            return Err(Erc20Error::PairDisabled {
                token: denom.to_string(),
            });
        }
        if params.is_precompile(&pair.address()?) {
            return Err(Erc20Error::NativeConversionDisabled {
                denom: denom.to_string(),
            });
        }
        Ok(pair)
    }

    // ========================================================================
    // Coin -> ERC20
    // ========================================================================

    /// Escrow the native coin and mint the same amount on the contract
    fn convert_coin_native_coin(
        &self,
        ctx: &mut Context,
        contract: Address,
        sender: Address,
        receiver: Address,
        coin: &Coin,
    ) -> Result<(), Erc20Error> {
        let before = self.balance_of(ctx, contract, receiver)?;

        let module = self.config.module_name.clone();
        self.bank
            .send_coins_from_account_to_module(ctx, &sender, &module, &[coin.clone()])?;

        let res = self.mint(ctx, contract, receiver, coin.amount)?;
        monitor_approval_event(contract, &res)?;

        let after = self.balance_of(ctx, contract, receiver)?;
        check_increase(before, after, coin.amount)
    }

    /// Burn the native representation and release escrowed tokens
    fn convert_coin_native_erc20(
        &self,
        ctx: &mut Context,
        contract: Address,
        sender: Address,
        receiver: Address,
        coin: &Coin,
    ) -> Result<(), Erc20Error> {
        let before = self.balance_of(ctx, contract, receiver)?;

        let module = self.config.module_name.clone();
        let coins = [coin.clone()];
        self.bank
            .send_coins_from_account_to_module(ctx, &sender, &module, &coins)?;
        self.bank.burn_coins(ctx, &module, &coins)?;

        let res = self.transfer(ctx, contract, self.module_address(), receiver, coin.amount)?;
        monitor_approval_event(contract, &res)?;

        let after = self.balance_of(ctx, contract, receiver)?;
        check_increase(before, after, coin.amount)
    }

    // ========================================================================
    // ERC20 -> Coin
    // ========================================================================

    /// Burn the sender's tokens and release the escrowed native coin
    fn convert_erc20_native_coin(
        &self,
        ctx: &mut Context,
        contract: Address,
        sender: Address,
        receiver: Address,
        coin: &Coin,
    ) -> Result<(), Erc20Error> {
        let before_tokens = self.balance_of(ctx, contract, sender)?;
        let before_coins = self.bank.balance(ctx.store, &receiver, &coin.denom)?;

        let res = self.burn_tokens(ctx, contract, sender, coin.amount)?;
        monitor_approval_event(contract, &res)?;

        let after_tokens = self.balance_of(ctx, contract, sender)?;
        check_decrease(before_tokens, after_tokens, coin.amount)?;

        let module = self.config.module_name.clone();
        self.bank
            .send_coins_from_module_to_account(ctx, &module, &receiver, &[coin.clone()])?;

        let after_coins = self.bank.balance(ctx.store, &receiver, &coin.denom)?;
        check_increase(before_coins, after_coins, coin.amount)
    }

    /// Escrow the sender's tokens and mint the native representation
    fn convert_erc20_native_token(
        &self,
        ctx: &mut Context,
        contract: Address,
        sender: Address,
        receiver: Address,
        coin: &Coin,
    ) -> Result<(), Erc20Error> {
        let escrow = self.module_address();
        let before_escrow = self.balance_of(ctx, contract, escrow)?;
        let before_coins = self.bank.balance(ctx.store, &receiver, &coin.denom)?;

        let res = self.transfer(ctx, contract, sender, escrow, coin.amount)?;
        monitor_approval_event(contract, &res)?;

        // a fee-on-transfer token would leave the escrow short here
        let after_escrow = self.balance_of(ctx, contract, escrow)?;
        check_increase(before_escrow, after_escrow, coin.amount)?;

        let module = self.config.module_name.clone();
        let coins = [coin.clone()];
        self.bank.mint_coins(ctx, &module, &coins)?;
        self.bank
            .send_coins_from_module_to_account(ctx, &module, &receiver, &coins)?;

        let after_coins = self.bank.balance(ctx.store, &receiver, &coin.denom)?;
        check_increase(before_coins, after_coins, coin.amount)
    }
}

fn check_increase(before: Uint256, after: Uint256, expected: Uint256) -> Result<(), Erc20Error> {
    let actual = after.saturating_sub(before);
    if after < before || actual != expected {
        return Err(Erc20Error::BalanceInvariance { expected, actual });
    }
    Ok(())
}

fn check_decrease(before: Uint256, after: Uint256, expected: Uint256) -> Result<(), Erc20Error> {
    let actual = before.saturating_sub(after);
    if after > before || actual != expected {
        return Err(Erc20Error::BalanceInvariance { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_checks() {
        let ten = Uint256::from(10u128);
        assert!(check_increase(Uint256::from(5u128), Uint256::from(15u128), ten).is_ok());
        assert_eq!(
            check_increase(Uint256::from(5u128), Uint256::from(14u128), ten).unwrap_err(),
            Erc20Error::BalanceInvariance {
                expected: ten,
                actual: Uint256::from(9u128)
            }
        );
        assert!(check_increase(Uint256::from(5u128), Uint256::from(1u128), ten).is_err());

        assert!(check_decrease(Uint256::from(15u128), Uint256::from(5u128), ten).is_ok());
        assert!(check_decrease(Uint256::from(15u128), Uint256::from(6u128), ten).is_err());
        assert!(check_decrease(Uint256::from(5u128), Uint256::from(15u128), ten).is_err());
    }
}

//! Dual-ledger bank facade
//!
//! Wraps the native ledger so that a send of a bridged denom is satisfied
//! from the sender's contract-side balance when the native side falls short,
//! and so that balance queries report both ledgers combined.
//!
//! The facade reaches the ERC20 module through the [`Erc20Keeper`] trait.
//! The ERC20 module in turn only ever uses the plain [`BankKeeper`], so the
//! two are built independently and combined here.

use alloy_primitives::Address;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, Storage, Uint256};

use common::{Coin, Context};

use crate::error::BankError;
use crate::keeper::BankKeeper;

/// A token pair whose contract ledger is separate from the native ledger
#[cw_serde]
pub struct DualPair {
    pub denom: String,
    /// Hex address of the token contract
    pub contract: String,
}

/// What the facade needs from the ERC20 module
pub trait Erc20Keeper {
    type Error: From<BankError> + From<StdError>;

    /// Enabled pair for `denom` backed by a bytecode contract, if any.
    /// Returns `None` when bridging is switched off globally.
    fn dual_pair(&self, store: &dyn Storage, denom: &str) -> Result<Option<DualPair>, Self::Error>;

    /// Every pair [`Erc20Keeper::dual_pair`] would return
    fn dual_pairs(&self, store: &dyn Storage) -> Result<Vec<DualPair>, Self::Error>;

    fn contract_balance(
        &self,
        ctx: &mut Context,
        pair: &DualPair,
        account: &Address,
    ) -> Result<Uint256, Self::Error>;

    /// Move `amount` of `account`'s contract-side balance onto the native
    /// ledger.
    fn convert_to_native(
        &self,
        ctx: &mut Context,
        pair: &DualPair,
        account: &Address,
        amount: Uint256,
    ) -> Result<(), Self::Error>;
}

#[derive(Clone)]
pub struct WrappedKeeper<E> {
    bank: BankKeeper,
    erc20: E,
}

impl<E> WrappedKeeper<E>
where
    E: Erc20Keeper,
{
    pub fn new(bank: BankKeeper, erc20: E) -> Self {
        Self { bank, erc20 }
    }

    pub fn bank(&self) -> &BankKeeper {
        &self.bank
    }

    pub fn erc20(&self) -> &E {
        &self.erc20
    }

    // ========================================================================
    // Sends
    // ========================================================================

    /// Send coins, converting any native shortfall from the contract ledger
    /// first. All coins move or none do.
    pub fn send_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), E::Error> {
        ctx.cached(|ctx| {
            for coin in coins {
                self.ensure_native(ctx, from, coin)?;
            }
            self.bank.send_coins(ctx, from, to, coins)?;
            Ok(())
        })
    }

    pub fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context,
        from: &Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), E::Error> {
        ctx.cached(|ctx| {
            for coin in coins {
                self.ensure_native(ctx, from, coin)?;
            }
            self.bank
                .send_coins_from_account_to_module(ctx, from, module, coins)?;
            Ok(())
        })
    }

    /// Top up `from`'s native balance of `coin.denom` from its contract-side
    /// balance so that `coin.amount` is spendable.
    fn ensure_native(&self, ctx: &mut Context, from: &Address, coin: &Coin) -> Result<(), E::Error> {
        let Some(pair) = self.erc20.dual_pair(ctx.store, &coin.denom)? else {
            return Ok(());
        };

        let spendable = self.bank.spendable(ctx.store, from, &coin.denom)?;
        if spendable >= coin.amount {
            return Ok(());
        }
        let shortfall = coin.amount - spendable;

        let before = self.erc20.contract_balance(ctx, &pair, from)?;
        if before < shortfall {
            return Err(BankError::InsufficientFunds {
                denom: coin.denom.clone(),
                available: spendable.saturating_add(before),
                required: coin.amount,
            }
            .into());
        }

        self.erc20.convert_to_native(ctx, &pair, from, shortfall)?;

        let after = self.erc20.contract_balance(ctx, &pair, from)?;
        let moved = before.saturating_sub(after);
        if after > before || moved != shortfall {
            return Err(BankError::BalanceInvariance {
                denom: coin.denom.clone(),
                expected: shortfall,
                actual: moved,
            }
            .into());
        }

        tracing::info!(
            target: "bank::wrapped",
            account = %from,
            denom = %coin.denom,
            %shortfall,
            "converted contract balance to cover send"
        );
        Ok(())
    }

    // ========================================================================
    // Balance view
    // ========================================================================

    /// Native plus contract-side balance of `denom`
    pub fn balance(&self, ctx: &mut Context, addr: &Address, denom: &str) -> Result<Coin, E::Error> {
        let native = self.bank.balance(ctx.store, addr, denom)?;
        let contract = match self.erc20.dual_pair(ctx.store, denom)? {
            Some(pair) => self.erc20.contract_balance(ctx, &pair, addr)?,
            None => Uint256::zero(),
        };
        Ok(Coin::new(add(native, contract)?, denom))
    }

    pub fn all_balances(&self, ctx: &mut Context, addr: &Address) -> Result<Vec<Coin>, E::Error> {
        let native = self.bank.all_balances(ctx.store, addr)?;
        self.merge_contract_balances(ctx, addr, native)
    }

    pub fn spendable_balances(
        &self,
        ctx: &mut Context,
        addr: &Address,
    ) -> Result<Vec<Coin>, E::Error> {
        let native = self.bank.spendable_coins(ctx.store, addr)?;
        self.merge_contract_balances(ctx, addr, native)
    }

    fn merge_contract_balances(
        &self,
        ctx: &mut Context,
        addr: &Address,
        mut coins: Vec<Coin>,
    ) -> Result<Vec<Coin>, E::Error> {
        for pair in self.erc20.dual_pairs(ctx.store)? {
            let contract = self.erc20.contract_balance(ctx, &pair, addr)?;
            if contract.is_zero() {
                continue;
            }
            match coins.iter_mut().find(|c| c.denom == pair.denom) {
                Some(coin) => coin.amount = add(coin.amount, contract)?,
                None => coins.push(Coin::new(contract, pair.denom)),
            }
        }
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        Ok(coins)
    }
}

fn add(a: Uint256, b: Uint256) -> Result<Uint256, BankError> {
    Ok(a.checked_add(b)?)
}

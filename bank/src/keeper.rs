//! Native ledger keeper
//!
//! Balances, supply, locks, accounts and denomination metadata. The keeper is
//! unaware of the contract ledger; [`crate::wrapped::WrappedKeeper`] layers
//! the ERC20 behaviour on top.

use alloy_primitives::Address;
use cosmwasm_std::{Event, Order, StdResult, Storage, Uint256};

use common::address::{module_address, to_bech32};
use common::coin::{coins_to_string, validate_coins};
use common::{Coin, Context, Metadata};

use crate::config::BankConfig;
use crate::error::BankError;
use crate::state::{
    AccountInfo, ACCOUNTS, BALANCES, DENOM_METADATA, LOCKED, NEXT_ACCOUNT_NUMBER, SUPPLY,
};

#[derive(Clone, Debug)]
pub struct BankKeeper {
    config: BankConfig,
}

impl BankKeeper {
    pub fn new(config: BankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Address of a configured module account
    pub fn module_address(&self, name: &str) -> Result<Address, BankError> {
        if !self.config.module_accounts.iter().any(|m| m == name) {
            return Err(BankError::UnknownModule {
                name: name.to_string(),
            });
        }
        Ok(module_address(name))
    }

    pub fn is_module_account(&self, addr: &Address) -> bool {
        self.config
            .module_accounts
            .iter()
            .any(|m| module_address(m) == *addr)
    }

    pub fn is_blocked(&self, addr: &Address) -> bool {
        self.config
            .blocked_modules
            .iter()
            .any(|m| module_address(m) == *addr)
    }

    pub fn has_account(&self, store: &dyn Storage, addr: &Address) -> bool {
        ACCOUNTS.has(store, addr.as_slice())
    }

    pub fn account(&self, store: &dyn Storage, addr: &Address) -> StdResult<Option<AccountInfo>> {
        ACCOUNTS.may_load(store, addr.as_slice())
    }

    /// Materialize `addr` if it has never been seen. Returns whether a new
    /// account was created.
    pub fn ensure_account(&self, ctx: &mut Context, addr: &Address) -> StdResult<bool> {
        if self.has_account(ctx.store, addr) {
            return Ok(false);
        }
        let number = NEXT_ACCOUNT_NUMBER.may_load(ctx.store)?.unwrap_or_default();
        ACCOUNTS.save(
            ctx.store,
            addr.as_slice(),
            &AccountInfo {
                account_number: number,
                created_at: ctx.block.height,
            },
        )?;
        NEXT_ACCOUNT_NUMBER.save(ctx.store, &(number + 1))?;
        tracing::debug!(target: "bank::keeper", account = %addr, number, "created account");
        Ok(true)
    }

    /// Render an address for events
    pub fn display(&self, addr: &Address) -> String {
        to_bech32(addr, &self.config.hrp).unwrap_or_else(|_| addr.to_string())
    }

    // ========================================================================
    // Balances
    // ========================================================================

    pub fn balance(&self, store: &dyn Storage, addr: &Address, denom: &str) -> StdResult<Uint256> {
        Ok(BALANCES
            .may_load(store, (addr.as_slice(), denom))?
            .unwrap_or_default())
    }

    pub fn all_balances(&self, store: &dyn Storage, addr: &Address) -> StdResult<Vec<Coin>> {
        BALANCES
            .prefix(addr.as_slice())
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(denom, amount)| Coin { denom, amount }))
            .collect()
    }

    pub fn locked(&self, store: &dyn Storage, addr: &Address, denom: &str) -> StdResult<Uint256> {
        Ok(LOCKED
            .may_load(store, (addr.as_slice(), denom))?
            .unwrap_or_default())
    }

    /// Set the locked amount of `coin.denom` for `addr`; zero clears it.
    pub fn set_locked(&self, ctx: &mut Context, addr: &Address, coin: &Coin) -> StdResult<()> {
        if coin.amount.is_zero() {
            LOCKED.remove(ctx.store, (addr.as_slice(), &coin.denom));
            return Ok(());
        }
        LOCKED.save(ctx.store, (addr.as_slice(), &coin.denom), &coin.amount)
    }

    /// Balance minus locked amount, floored at zero
    pub fn spendable(&self, store: &dyn Storage, addr: &Address, denom: &str) -> StdResult<Uint256> {
        let balance = self.balance(store, addr, denom)?;
        let locked = self.locked(store, addr, denom)?;
        Ok(balance.saturating_sub(locked))
    }

    pub fn spendable_coins(&self, store: &dyn Storage, addr: &Address) -> StdResult<Vec<Coin>> {
        let mut coins = Vec::new();
        for coin in self.all_balances(store, addr)? {
            let amount = self.spendable(store, addr, &coin.denom)?;
            if !amount.is_zero() {
                coins.push(Coin::new(amount, coin.denom));
            }
        }
        Ok(coins)
    }

    // ========================================================================
    // Supply
    // ========================================================================

    pub fn supply(&self, store: &dyn Storage, denom: &str) -> StdResult<Uint256> {
        Ok(SUPPLY.may_load(store, denom)?.unwrap_or_default())
    }

    pub fn has_supply(&self, store: &dyn Storage, denom: &str) -> StdResult<bool> {
        Ok(!self.supply(store, denom)?.is_zero())
    }

    pub fn total_supply(&self, store: &dyn Storage) -> StdResult<Vec<Coin>> {
        SUPPLY
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(denom, amount)| Coin { denom, amount }))
            .collect()
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn denom_metadata(&self, store: &dyn Storage, denom: &str) -> StdResult<Option<Metadata>> {
        DENOM_METADATA.may_load(store, denom)
    }

    pub fn set_denom_metadata(&self, ctx: &mut Context, metadata: &Metadata) -> StdResult<()> {
        DENOM_METADATA.save(ctx.store, &metadata.base, metadata)
    }

    pub fn all_denom_metadata(&self, store: &dyn Storage) -> StdResult<Vec<Metadata>> {
        DENOM_METADATA
            .range(store, None, None, Order::Ascending)
            .map(|item| item.map(|(_, meta)| meta))
            .collect()
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Move coins between two accounts. The recipient account is created on
    /// first receipt. All coins move or none do.
    pub fn send_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        validate_coins(coins).map_err(|e| BankError::InvalidCoins {
            reason: e.to_string(),
        })?;

        ctx.cached(|ctx| {
            self.sub_unlocked_coins(ctx, from, coins)?;
            self.add_coins(ctx, to, coins)?;
            self.ensure_account(ctx, to)?;

            ctx.emit(
                Event::new("transfer")
                    .add_attribute("recipient", self.display(to))
                    .add_attribute("sender", self.display(from))
                    .add_attribute("amount", coins_to_string(coins)),
            );
            Ok(())
        })
    }

    pub fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context,
        from: &Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let to = self.module_address(module)?;
        self.send_coins(ctx, from, &to, coins)
    }

    pub fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context,
        module: &str,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let from = self.module_address(module)?;
        self.send_coins(ctx, &from, to, coins)
    }

    pub fn send_coins_from_module_to_module(
        &self,
        ctx: &mut Context,
        from_module: &str,
        to_module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let from = self.module_address(from_module)?;
        let to = self.module_address(to_module)?;
        self.send_coins(ctx, &from, &to, coins)
    }

    /// Create new coins into a module account
    pub fn mint_coins(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        validate_coins(coins).map_err(|e| BankError::InvalidCoins {
            reason: e.to_string(),
        })?;
        let addr = self.module_address(module)?;

        self.add_coins(ctx, &addr, coins)?;
        for coin in coins {
            let supply = self.supply(ctx.store, &coin.denom)?.checked_add(coin.amount)?;
            SUPPLY.save(ctx.store, &coin.denom, &supply)?;
        }

        ctx.emit(
            Event::new("mint")
                .add_attribute("minter", self.display(&addr))
                .add_attribute("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    /// Destroy coins held by a module account, reducing supply. Callers that
    /// need the community pool policy go through [`BankKeeper::burn_coins`].
    pub(crate) fn destroy_coins(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let addr = self.module_address(module)?;

        self.sub_unlocked_coins(ctx, &addr, coins)?;
        for coin in coins {
            let supply = self.supply(ctx.store, &coin.denom)?.checked_sub(coin.amount)?;
            if supply.is_zero() {
                SUPPLY.remove(ctx.store, &coin.denom);
            } else {
                SUPPLY.save(ctx.store, &coin.denom, &supply)?;
            }
        }

        ctx.emit(
            Event::new("burn")
                .add_attribute("burner", self.display(&addr))
                .add_attribute("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    fn sub_unlocked_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        for coin in coins {
            let spendable = self.spendable(ctx.store, addr, &coin.denom)?;
            if spendable < coin.amount {
                return Err(BankError::InsufficientFunds {
                    denom: coin.denom.clone(),
                    available: spendable,
                    required: coin.amount,
                });
            }
            let balance = self.balance(ctx.store, addr, &coin.denom)?;
            self.set_balance(ctx.store, addr, &coin.denom, balance.checked_sub(coin.amount)?)?;
        }

        ctx.emit(
            Event::new("coin_spent")
                .add_attribute("spender", self.display(addr))
                .add_attribute("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    fn add_coins(&self, ctx: &mut Context, addr: &Address, coins: &[Coin]) -> Result<(), BankError> {
        for coin in coins {
            let balance = self.balance(ctx.store, addr, &coin.denom)?;
            self.set_balance(ctx.store, addr, &coin.denom, balance.checked_add(coin.amount)?)?;
        }

        ctx.emit(
            Event::new("coin_received")
                .add_attribute("receiver", self.display(addr))
                .add_attribute("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    pub(crate) fn set_balance(
        &self,
        store: &mut dyn Storage,
        addr: &Address,
        denom: &str,
        amount: Uint256,
    ) -> StdResult<()> {
        if amount.is_zero() {
            BALANCES.remove(store, (addr.as_slice(), denom));
            return Ok(());
        }
        BALANCES.save(store, (addr.as_slice(), denom), &amount)
    }
}

//! Precompile registrar
//!
//! Pairs listed in the native or dynamic precompile sets have no bytecode.
//! Calls to their address are served by an [`Erc20Precompile`] that reads
//! and moves balances on the native ledger directly, so there is only one
//! ledger for those denoms.

use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::{SolEvent, SolInterface, SolValue};
use cosmwasm_std::{Storage, Uint256};

use bank::BankKeeper;
use common::address::to_hex;
use common::coin::{from_u256, to_u256};
use common::{Coin, Context};

use crate::abi::IERC20::{self, IERC20Calls};
use crate::error::Erc20Error;
use crate::expected_keepers::{Precompile, PrecompileOutput, PrecompileSet};
use crate::keeper::{load_pair_by_address, load_params};
use crate::state::ALLOWANCES;

#[derive(Clone, Debug)]
pub struct PrecompileRegistrar {
    bank: BankKeeper,
}

impl PrecompileRegistrar {
    pub fn new(bank: BankKeeper) -> Self {
        Self { bank }
    }
}

impl PrecompileSet for PrecompileRegistrar {
    fn is_available(&self, store: &dyn Storage, address: Address) -> bool {
        load_params(store)
            .map(|params| params.is_precompile(&address))
            .unwrap_or(false)
    }

    fn instantiate(
        &self,
        store: &dyn Storage,
        address: Address,
    ) -> Result<Box<dyn Precompile>, Erc20Error> {
        let not_found = || Erc20Error::PrecompileNotFound {
            address: to_hex(&address),
        };
        if !self.is_available(store, address) {
            return Err(not_found());
        }
        // a disabled pair is a plain native coin; its contract interface is down
        let pair = load_pair_by_address(store, &address)?
            .filter(|pair| pair.enabled)
            .ok_or_else(not_found)?;

        tracing::debug!(
            target: "erc20::precompile",
            address = %address,
            denom = %pair.denom,
            "instantiated token precompile"
        );
        Ok(Box::new(Erc20Precompile {
            address,
            denom: pair.denom,
            bank: self.bank.clone(),
        }))
    }
}

/// ERC20 interface over one native denom
#[derive(Clone, Debug)]
pub struct Erc20Precompile {
    address: Address,
    denom: String,
    bank: BankKeeper,
}

impl Precompile for Erc20Precompile {
    fn address(&self) -> Address {
        self.address
    }

    fn run(
        &self,
        ctx: &mut Context,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, Erc20Error> {
        let call = IERC20Calls::abi_decode(input).map_err(|e| Erc20Error::EvmCallFailed {
            method: "precompile".to_string(),
            reason: format!("invalid input: {e}"),
        })?;

        let output = match call {
            IERC20Calls::name(_) => {
                let (name, _, _) = self.token_info(ctx.store)?;
                returns(name.abi_encode())
            }
            IERC20Calls::symbol(_) => {
                let (_, symbol, _) = self.token_info(ctx.store)?;
                returns(symbol.abi_encode())
            }
            IERC20Calls::decimals(_) => {
                let (_, _, decimals) = self.token_info(ctx.store)?;
                returns(U256::from(decimals).abi_encode())
            }
            IERC20Calls::totalSupply(_) => {
                let supply = self.bank.supply(ctx.store, &self.denom)?;
                returns(to_u256(supply).abi_encode())
            }
            IERC20Calls::balanceOf(c) => {
                let balance = self.bank.balance(ctx.store, &c.account, &self.denom)?;
                returns(to_u256(balance).abi_encode())
            }
            IERC20Calls::allowance(c) => {
                let allowance = self.allowance(ctx.store, &c.owner, &c.spender)?;
                returns(to_u256(allowance).abi_encode())
            }
            IERC20Calls::approve(c) => {
                let amount = from_u256(c.amount);
                self.set_allowance(ctx, &caller, &c.spender, amount)?;
                let event = IERC20::Approval {
                    owner: caller,
                    spender: c.spender,
                    value: c.amount,
                };
                self.with_log(true.abi_encode(), event.encode_log_data())
            }
            IERC20Calls::transfer(c) => {
                self.move_coins(ctx, &caller, &c.to, c.amount)?;
                self.transfer_output(caller, c.to, c.amount)
            }
            IERC20Calls::transferFrom(c) => {
                if caller != c.from {
                    let allowance = self.allowance(ctx.store, &c.from, &caller)?;
                    let amount = from_u256(c.amount);
                    let remaining = allowance.checked_sub(amount).map_err(|_| {
                        Erc20Error::InsufficientFunds {
                            token: format!("allowance of {}", to_hex(&caller)),
                            available: allowance,
                            required: amount,
                        }
                    })?;
                    self.set_allowance(ctx, &c.from, &caller, remaining)?;
                }
                self.move_coins(ctx, &c.from, &c.to, c.amount)?;
                self.transfer_output(c.from, c.to, c.amount)
            }
            IERC20Calls::mint(_) | IERC20Calls::burnCoins(_) => {
                return Err(Erc20Error::EvmCallFailed {
                    method: "precompile".to_string(),
                    reason: "supply of a precompile token is managed by the bank".to_string(),
                })
            }
        };
        Ok(output)
    }
}

impl Erc20Precompile {
    /// Name, symbol and decimals from the bank metadata, falling back to the
    /// denom itself
    fn token_info(&self, store: &dyn Storage) -> Result<(String, String, u8), Erc20Error> {
        Ok(match self.bank.denom_metadata(store, &self.denom)? {
            Some(metadata) => {
                let decimals = metadata.decimals();
                (metadata.name, metadata.symbol, decimals)
            }
            None => (self.denom.clone(), self.denom.clone(), 0),
        })
    }

    fn allowance(
        &self,
        store: &dyn Storage,
        owner: &Address,
        spender: &Address,
    ) -> Result<Uint256, Erc20Error> {
        let key = (self.address.as_slice(), owner.as_slice(), spender.as_slice());
        Ok(ALLOWANCES.may_load(store, key)?.unwrap_or_default())
    }

    fn set_allowance(
        &self,
        ctx: &mut Context,
        owner: &Address,
        spender: &Address,
        amount: Uint256,
    ) -> Result<(), Erc20Error> {
        let key = (self.address.as_slice(), owner.as_slice(), spender.as_slice());
        if amount.is_zero() {
            ALLOWANCES.remove(ctx.store, key);
        } else {
            ALLOWANCES.save(ctx.store, key, &amount)?;
        }
        Ok(())
    }

    fn move_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), Erc20Error> {
        let amount = from_u256(amount);
        if amount.is_zero() {
            return Ok(());
        }
        self.bank
            .send_coins(ctx, from, to, &[Coin::new(amount, self.denom.clone())])?;
        tracing::debug!(
            target: "erc20::precompile",
            denom = %self.denom,
            from = %from,
            to = %to,
            %amount,
            "precompile transfer"
        );
        Ok(())
    }

    fn transfer_output(&self, from: Address, to: Address, value: U256) -> PrecompileOutput {
        let event = IERC20::Transfer { from, to, value };
        self.with_log(true.abi_encode(), event.encode_log_data())
    }

    fn with_log(&self, ret: Vec<u8>, data: alloy_primitives::LogData) -> PrecompileOutput {
        PrecompileOutput {
            ret,
            logs: vec![Log {
                address: self.address,
                data,
            }],
        }
    }
}

fn returns(ret: Vec<u8>) -> PrecompileOutput {
    PrecompileOutput { ret, logs: vec![] }
}

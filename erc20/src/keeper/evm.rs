//! Privileged calls into token contracts
//!
//! Every call goes through [`Keeper::call_evm`], which turns a revert into
//! [`Erc20Error::EvmCallFailed`]. Return data is decoded with the `sol!`
//! bindings in [`crate::abi`].

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolEvent, SolType, SolValue};
use cosmwasm_std::Uint256;

use common::address::to_hex;
use common::coin::{from_u256, to_u256};
use common::Context;

use crate::abi::IERC20;
use crate::error::Erc20Error;
use crate::expected_keepers::{CallResponse, EvmCall};
use crate::keeper::Keeper;

/// The read interface every registered contract must expose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Data {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Keeper {
    /// Call `contract` as `from`. A revert becomes an error and leaves no
    /// state behind.
    pub fn call_evm(
        &self,
        ctx: &mut Context,
        from: Address,
        contract: Address,
        method: &str,
        input: Vec<u8>,
        commit: bool,
    ) -> Result<CallResponse, Erc20Error> {
        let res = self
            .evm
            .call(
                ctx,
                EvmCall {
                    from,
                    to: contract,
                    input,
                    commit,
                },
            )
            .map_err(|e| Erc20Error::EvmCallFailed {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(reason) = res.vm_error {
            tracing::warn!(
                target: "erc20::evm",
                contract = %contract,
                method,
                %reason,
                "contract call reverted"
            );
            return Err(Erc20Error::EvmCallFailed {
                method: method.to_string(),
                reason,
            });
        }
        Ok(res)
    }

    fn query_value<T>(
        &self,
        ctx: &mut Context,
        contract: Address,
        method: &str,
        input: Vec<u8>,
    ) -> Result<T, Erc20Error>
    where
        T: SolValue + From<<T::SolType as SolType>::RustType>,
    {
        let res = self.call_evm(ctx, self.module_address(), contract, method, input, false)?;
        T::abi_decode(&res.ret).map_err(|e| Erc20Error::EvmCallFailed {
            method: method.to_string(),
            reason: format!("failed to decode return data: {e}"),
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read name, symbol and decimals, and make sure the contract answers
    /// balance and transfer calls. Any failure means the contract is not a
    /// usable ERC20.
    pub fn query_erc20(&self, ctx: &mut Context, contract: Address) -> Result<Erc20Data, Erc20Error> {
        let not_erc20 = |err: Erc20Error| Erc20Error::NotErc20 {
            contract: to_hex(&contract),
            reason: err.to_string(),
        };

        let name: String = self
            .query_value(ctx, contract, "name", IERC20::nameCall {}.abi_encode())
            .map_err(not_erc20)?;
        let symbol: String = self
            .query_value(ctx, contract, "symbol", IERC20::symbolCall {}.abi_encode())
            .map_err(not_erc20)?;
        let decimals: U256 = self
            .query_value(ctx, contract, "decimals", IERC20::decimalsCall {}.abi_encode())
            .map_err(not_erc20)?;
        let decimals = u8::try_from(decimals).map_err(|_| {
            not_erc20(Erc20Error::EvmCallFailed {
                method: "decimals".to_string(),
                reason: format!("decimals {decimals} out of range"),
            })
        })?;

        let module = self.module_address();
        self.balance_of(ctx, contract, module).map_err(not_erc20)?;
        let probe = IERC20::transferCall {
            to: module,
            amount: U256::ZERO,
        };
        self.call_evm(ctx, module, contract, "transfer", probe.abi_encode(), false)
            .map_err(not_erc20)?;

        Ok(Erc20Data {
            name,
            symbol,
            decimals,
        })
    }

    pub fn balance_of(
        &self,
        ctx: &mut Context,
        contract: Address,
        account: Address,
    ) -> Result<Uint256, Erc20Error> {
        let input = IERC20::balanceOfCall { account }.abi_encode();
        let balance: U256 = self.query_value(ctx, contract, "balanceOf", input)?;
        Ok(from_u256(balance))
    }

    pub fn total_supply(&self, ctx: &mut Context, contract: Address) -> Result<Uint256, Erc20Error> {
        let input = IERC20::totalSupplyCall {}.abi_encode();
        let supply: U256 = self.query_value(ctx, contract, "totalSupply", input)?;
        Ok(from_u256(supply))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Mint on a module-owned contract
    pub fn mint(
        &self,
        ctx: &mut Context,
        contract: Address,
        to: Address,
        amount: Uint256,
    ) -> Result<CallResponse, Erc20Error> {
        let input = IERC20::mintCall {
            to,
            amount: to_u256(amount),
        }
        .abi_encode();
        self.call_evm(ctx, self.module_address(), contract, "mint", input, true)
    }

    /// Burn `from`'s tokens on a module-owned contract
    pub fn burn_tokens(
        &self,
        ctx: &mut Context,
        contract: Address,
        from: Address,
        amount: Uint256,
    ) -> Result<CallResponse, Erc20Error> {
        let input = IERC20::burnCoinsCall {
            from,
            amount: to_u256(amount),
        }
        .abi_encode();
        self.call_evm(ctx, self.module_address(), contract, "burnCoins", input, true)
    }

    /// `transfer` executed as `from`. A contract that returns `false` instead
    /// of reverting is treated as a failure too.
    pub fn transfer(
        &self,
        ctx: &mut Context,
        contract: Address,
        from: Address,
        to: Address,
        amount: Uint256,
    ) -> Result<CallResponse, Erc20Error> {
        let input = IERC20::transferCall {
            to,
            amount: to_u256(amount),
        }
        .abi_encode();
        let res = self.call_evm(ctx, from, contract, "transfer", input, true)?;

        // empty return data is accepted for tokens that predate the bool return
        if !res.ret.is_empty() {
            let ok = bool::abi_decode(&res.ret).map_err(|e| Erc20Error::EvmCallFailed {
                method: "transfer".to_string(),
                reason: format!("failed to decode return data: {e}"),
            })?;
            if !ok {
                return Err(Erc20Error::EvmCallFailed {
                    method: "transfer".to_string(),
                    reason: "transfer returned false".to_string(),
                });
            }
        }
        Ok(res)
    }
}

/// Reject a call whose logs contain an `Approval` event. Conversions never
/// approve anything, so one showing up means the contract did something on
/// the side.
pub fn monitor_approval_event(contract: Address, res: &CallResponse) -> Result<(), Erc20Error> {
    let approval = IERC20::Approval::SIGNATURE_HASH;
    let found = res
        .logs
        .iter()
        .any(|log| log.data.topics().first() == Some(&approval));
    if found {
        tracing::warn!(target: "erc20::evm", contract = %contract, "unexpected Approval event");
        return Err(Erc20Error::UnexpectedApprovalEvent {
            contract: to_hex(&contract),
        });
    }
    Ok(())
}

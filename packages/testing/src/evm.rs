//! In-storage contract execution model
//!
//! Token contracts are kept in the context's store, so the staging of
//! [`Context::cached`] covers them exactly like native ledger writes. Calls
//! to addresses in the precompile set are handed to the installed
//! [`PrecompileSet`] instead.

use std::sync::OnceLock;

use alloy_primitives::{Address, Log, LogData, U256};
use alloy_sol_types::{SolEvent, SolInterface, SolValue};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Order, StdError, StdResult, Storage, Uint256};
use cw_storage_plus::Map;

use common::address::to_hex;
use common::coin::{from_u256, to_u256};
use common::Context;
use erc20::abi::IERC20::{self, IERC20Calls};
use erc20::expected_keepers::{CallResponse, EvmCall, EvmKeeper, PrecompileSet};
use erc20::EvmError;

/// Behaviour of a deployed token
#[cw_serde]
pub enum TokenKind {
    /// Plain owner-mintable ERC20
    Standard,
    /// Emits an `Approval` next to every transfer
    MaliciousApproval,
    /// Burns 1% (rounded up) of every transfer
    FeeSkimming,
    /// Reverts on every call
    NonErc20,
}

#[cw_serde]
pub struct TokenContract {
    pub kind: TokenKind,
    /// Hex address allowed to mint and burn
    pub owner: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

const CONTRACTS: Map<&[u8], TokenContract> = Map::new("evm_contracts");
const TOKEN_BALANCES: Map<(&[u8], &[u8]), Uint256> = Map::new("evm_balances");
const TOKEN_SUPPLY: Map<&[u8], Uint256> = Map::new("evm_supply");
const TOKEN_ALLOWANCES: Map<(&[u8], &[u8], &[u8]), Uint256> = Map::new("evm_allowances");
const NONCES: Map<&[u8], u64> = Map::new("evm_nonces");

type Output = Result<(Vec<u8>, Vec<Log>), String>;

#[derive(Default)]
pub struct MockEvm {
    precompiles: OnceLock<Box<dyn PrecompileSet>>,
}

impl MockEvm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the precompile set once the keepers it depends on exist
    pub fn install_precompiles(&self, set: Box<dyn PrecompileSet>) -> StdResult<()> {
        self.precompiles
            .set(set)
            .map_err(|_| StdError::generic_err("precompiles already installed"))
    }

    /// Deploy a token of any kind at the next address of `deployer`
    pub fn deploy(
        &self,
        ctx: &mut Context,
        deployer: Address,
        kind: TokenKind,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> StdResult<Address> {
        let nonce = NONCES.may_load(ctx.store, deployer.as_slice())?.unwrap_or_default();
        NONCES.save(ctx.store, deployer.as_slice(), &(nonce + 1))?;

        let address = deployer.create(nonce);
        CONTRACTS.save(
            ctx.store,
            address.as_slice(),
            &TokenContract {
                kind,
                owner: to_hex(&deployer),
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
            },
        )?;
        tracing::debug!(target: "testing::evm", %address, name, "deployed token");
        Ok(address)
    }

    /// Credit tokens without going through the owner check
    pub fn mint_unchecked(
        &self,
        ctx: &mut Context,
        contract: Address,
        to: Address,
        amount: Uint256,
    ) -> StdResult<()> {
        add_balance(ctx.store, &contract, &to, amount)?;
        let supply = token_supply(ctx.store, &contract)?.checked_add(amount)?;
        TOKEN_SUPPLY.save(ctx.store, contract.as_slice(), &supply)
    }

    pub fn contract(&self, store: &dyn Storage, address: Address) -> StdResult<Option<TokenContract>> {
        CONTRACTS.may_load(store, address.as_slice())
    }

    pub fn token_balance(
        &self,
        store: &dyn Storage,
        contract: Address,
        account: Address,
    ) -> StdResult<Uint256> {
        token_balance(store, &contract, &account)
    }

    pub fn token_supply(&self, store: &dyn Storage, contract: Address) -> StdResult<Uint256> {
        token_supply(store, &contract)
    }

    fn precompile_set(&self, store: &dyn Storage, address: Address) -> Option<&dyn PrecompileSet> {
        self.precompiles
            .get()
            .map(|set| set.as_ref())
            .filter(|set| set.is_available(store, address))
    }
}

impl EvmKeeper for MockEvm {
    fn call(&self, ctx: &mut Context, call: EvmCall) -> Result<CallResponse, EvmError> {
        if let Some(set) = self.precompile_set(ctx.store, call.to) {
            // a listed address whose pair cannot be served reverts the call
            let precompile = match set.instantiate(ctx.store, call.to) {
                Ok(precompile) => precompile,
                Err(err) => {
                    return Ok(CallResponse {
                        vm_error: Some(err.to_string()),
                        ..CallResponse::default()
                    })
                }
            };
            return Ok(staged(ctx, call.commit, |ctx| {
                precompile
                    .run(ctx, call.from, &call.input)
                    .map(|out| (out.ret, out.logs))
                    .map_err(|e| e.to_string())
            }));
        }

        let token = CONTRACTS
            .may_load(ctx.store, call.to.as_slice())?
            .ok_or_else(|| EvmError::ContractNotFound {
                address: to_hex(&call.to),
            })?;
        Ok(staged(ctx, call.commit, |ctx| {
            execute_token(ctx, &token, call.to, call.from, &call.input)
        }))
    }

    fn deploy_erc20(
        &self,
        ctx: &mut Context,
        deployer: Address,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<Address, EvmError> {
        self.deploy(ctx, deployer, TokenKind::Standard, name, symbol, decimals)
            .map_err(|e| EvmError::DeployFailed {
                reason: e.to_string(),
            })
    }

    fn self_destruct(&self, ctx: &mut Context, contract: Address) -> Result<(), EvmError> {
        if !CONTRACTS.has(ctx.store, contract.as_slice()) {
            return Err(EvmError::ContractNotFound {
                address: to_hex(&contract),
            });
        }
        let holders: Vec<Vec<u8>> = TOKEN_BALANCES
            .prefix(contract.as_slice())
            .keys(ctx.store, None, None, Order::Ascending)
            .collect::<StdResult<_>>()?;
        for holder in holders {
            TOKEN_BALANCES.remove(ctx.store, (contract.as_slice(), holder.as_slice()));
        }
        TOKEN_SUPPLY.remove(ctx.store, contract.as_slice());
        CONTRACTS.remove(ctx.store, contract.as_slice());
        Ok(())
    }

    fn is_contract(&self, store: &dyn Storage, address: Address) -> bool {
        CONTRACTS.has(store, address.as_slice()) || self.precompile_set(store, address).is_some()
    }
}

/// Run a call in an overlay: committed on success when requested, always
/// discarded on revert.
fn staged(
    ctx: &mut Context,
    commit: bool,
    f: impl FnOnce(&mut Context<'_>) -> Output,
) -> CallResponse {
    let result = if commit {
        ctx.cached(f)
    } else {
        ctx.simulate(f)
    };
    match result {
        Ok((ret, logs)) => CallResponse {
            ret,
            logs,
            vm_error: None,
        },
        Err(reason) => CallResponse {
            vm_error: Some(reason),
            ..CallResponse::default()
        },
    }
}

// ============================================================================
// Token execution
// ============================================================================

fn execute_token(
    ctx: &mut Context,
    token: &TokenContract,
    contract: Address,
    caller: Address,
    input: &[u8],
) -> Output {
    if token.kind == TokenKind::NonErc20 {
        return Err("execution reverted".to_string());
    }
    let call = IERC20Calls::abi_decode(input).map_err(|e| e.to_string())?;
    let store_err = |e: StdError| e.to_string();

    let out = match call {
        IERC20Calls::name(_) => (token.name.abi_encode(), vec![]),
        IERC20Calls::symbol(_) => (token.symbol.abi_encode(), vec![]),
        IERC20Calls::decimals(_) => (U256::from(token.decimals).abi_encode(), vec![]),
        IERC20Calls::totalSupply(_) => {
            let supply = token_supply(ctx.store, &contract).map_err(store_err)?;
            (to_u256(supply).abi_encode(), vec![])
        }
        IERC20Calls::balanceOf(c) => {
            let balance = token_balance(ctx.store, &contract, &c.account).map_err(store_err)?;
            (to_u256(balance).abi_encode(), vec![])
        }
        IERC20Calls::allowance(c) => {
            let key = (contract.as_slice(), c.owner.as_slice(), c.spender.as_slice());
            let allowance = TOKEN_ALLOWANCES
                .may_load(ctx.store, key)
                .map_err(store_err)?
                .unwrap_or_default();
            (to_u256(allowance).abi_encode(), vec![])
        }
        IERC20Calls::approve(c) => {
            let key = (contract.as_slice(), caller.as_slice(), c.spender.as_slice());
            TOKEN_ALLOWANCES
                .save(ctx.store, key, &from_u256(c.amount))
                .map_err(store_err)?;
            let log = approval_log(contract, caller, c.spender, c.amount);
            (true.abi_encode(), vec![log])
        }
        IERC20Calls::transfer(c) => {
            let logs = transfer(ctx, token, contract, caller, c.to, c.amount)?;
            (true.abi_encode(), logs)
        }
        IERC20Calls::transferFrom(c) => {
            if caller != c.from {
                let key = (contract.as_slice(), c.from.as_slice(), caller.as_slice());
                let allowance = TOKEN_ALLOWANCES
                    .may_load(ctx.store, key)
                    .map_err(store_err)?
                    .unwrap_or_default();
                let remaining = allowance
                    .checked_sub(from_u256(c.amount))
                    .map_err(|_| "insufficient allowance".to_string())?;
                TOKEN_ALLOWANCES
                    .save(ctx.store, key, &remaining)
                    .map_err(store_err)?;
            }
            let logs = transfer(ctx, token, contract, c.from, c.to, c.amount)?;
            (true.abi_encode(), logs)
        }
        IERC20Calls::mint(c) => {
            only_owner(token, caller)?;
            let amount = from_u256(c.amount);
            add_balance(ctx.store, &contract, &c.to, amount).map_err(store_err)?;
            change_supply(ctx.store, &contract, amount, true)?;
            (vec![], vec![transfer_log(contract, Address::ZERO, c.to, c.amount)])
        }
        IERC20Calls::burnCoins(c) => {
            only_owner(token, caller)?;
            let amount = from_u256(c.amount);
            sub_balance(ctx.store, &contract, &c.from, amount)?;
            change_supply(ctx.store, &contract, amount, false)?;
            (vec![], vec![transfer_log(contract, c.from, Address::ZERO, c.amount)])
        }
    };
    Ok(out)
}

fn transfer(
    ctx: &mut Context,
    token: &TokenContract,
    contract: Address,
    from: Address,
    to: Address,
    value: U256,
) -> Result<Vec<Log>, String> {
    let amount = from_u256(value);
    sub_balance(ctx.store, &contract, &from, amount)?;

    let fee = match token.kind {
        TokenKind::FeeSkimming => ceil_percent(amount),
        _ => Uint256::zero(),
    };
    let received = amount.saturating_sub(fee);
    add_balance(ctx.store, &contract, &to, received).map_err(|e| e.to_string())?;
    if !fee.is_zero() {
        change_supply(ctx.store, &contract, fee, false)?;
    }

    let mut logs = vec![transfer_log(contract, from, to, to_u256(received))];
    if token.kind == TokenKind::MaliciousApproval {
        logs.push(approval_log(contract, from, to, U256::MAX));
    }
    Ok(logs)
}

fn ceil_percent(amount: Uint256) -> Uint256 {
    let hundred = Uint256::from(100u128);
    let fee = amount / hundred;
    if fee * hundred == amount {
        fee
    } else {
        fee + Uint256::one()
    }
}

fn only_owner(token: &TokenContract, caller: Address) -> Result<(), String> {
    if !token.owner.eq_ignore_ascii_case(&to_hex(&caller)) {
        return Err("Ownable: caller is not the owner".to_string());
    }
    Ok(())
}

fn token_balance(store: &dyn Storage, contract: &Address, account: &Address) -> StdResult<Uint256> {
    Ok(TOKEN_BALANCES
        .may_load(store, (contract.as_slice(), account.as_slice()))?
        .unwrap_or_default())
}

fn token_supply(store: &dyn Storage, contract: &Address) -> StdResult<Uint256> {
    Ok(TOKEN_SUPPLY
        .may_load(store, contract.as_slice())?
        .unwrap_or_default())
}

fn add_balance(
    store: &mut dyn Storage,
    contract: &Address,
    account: &Address,
    amount: Uint256,
) -> StdResult<()> {
    let balance = token_balance(store, contract, account)?.checked_add(amount)?;
    TOKEN_BALANCES.save(store, (contract.as_slice(), account.as_slice()), &balance)
}

fn sub_balance(
    store: &mut dyn Storage,
    contract: &Address,
    account: &Address,
    amount: Uint256,
) -> Result<(), String> {
    let balance = token_balance(store, contract, account).map_err(|e| e.to_string())?;
    let remaining = balance
        .checked_sub(amount)
        .map_err(|_| "ERC20: transfer amount exceeds balance".to_string())?;
    TOKEN_BALANCES
        .save(store, (contract.as_slice(), account.as_slice()), &remaining)
        .map_err(|e| e.to_string())
}

fn change_supply(
    store: &mut dyn Storage,
    contract: &Address,
    amount: Uint256,
    increase: bool,
) -> Result<(), String> {
    let supply = token_supply(store, contract).map_err(|e| e.to_string())?;
    let supply = if increase {
        supply.checked_add(amount).map_err(|e| e.to_string())?
    } else {
        supply.checked_sub(amount).map_err(|e| e.to_string())?
    };
    TOKEN_SUPPLY
        .save(store, contract.as_slice(), &supply)
        .map_err(|e| e.to_string())
}

fn transfer_log(contract: Address, from: Address, to: Address, value: U256) -> Log {
    log(contract, IERC20::Transfer { from, to, value }.encode_log_data())
}

fn approval_log(contract: Address, owner: Address, spender: Address, value: U256) -> Log {
    log(
        contract,
        IERC20::Approval {
            owner,
            spender,
            value,
        }
        .encode_log_data(),
    )
}

fn log(address: Address, data: LogData) -> Log {
    Log { address, data }
}

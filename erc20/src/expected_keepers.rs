//! Interfaces the ERC20 module expects from the contract execution substrate

use alloy_primitives::{Address, Log};
use cosmwasm_std::Storage;

use common::Context;

use crate::error::{Erc20Error, EvmError};

/// A message call into the EVM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
    pub from: Address,
    pub to: Address,
    pub input: Vec<u8>,
    /// Whether state changes of the call are kept
    pub commit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallResponse {
    pub ret: Vec<u8>,
    pub logs: Vec<Log>,
    /// Revert reason when the call failed. A failed call has no effect on
    /// state even when `commit` was requested.
    pub vm_error: Option<String>,
}

impl CallResponse {
    pub fn failed(&self) -> bool {
        self.vm_error.is_some()
    }
}

pub trait EvmKeeper {
    /// Execute a call synchronously. Committed changes are visible to the
    /// next call on the same context.
    fn call(&self, ctx: &mut Context, call: EvmCall) -> Result<CallResponse, EvmError>;

    /// Deploy a fresh owner-mintable ERC20 contract owned by `deployer`
    fn deploy_erc20(
        &self,
        ctx: &mut Context,
        deployer: Address,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<Address, EvmError>;

    /// Remove the code and storage of a contract
    fn self_destruct(&self, ctx: &mut Context, contract: Address) -> Result<(), EvmError>;

    /// Whether `address` has code or a precompile behind it
    fn is_contract(&self, store: &dyn Storage, address: Address) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecompileOutput {
    pub ret: Vec<u8>,
    pub logs: Vec<Log>,
}

/// A contract implemented natively instead of in bytecode
pub trait Precompile {
    fn address(&self) -> Address;

    /// Handle one call. An `Err` is reported to the caller as a revert.
    fn run(
        &self,
        ctx: &mut Context,
        caller: Address,
        input: &[u8],
    ) -> Result<PrecompileOutput, Erc20Error>;
}

/// The set of precompiles the EVM consults before running bytecode
pub trait PrecompileSet {
    fn is_available(&self, store: &dyn Storage, address: Address) -> bool;

    fn instantiate(
        &self,
        store: &dyn Storage,
        address: Address,
    ) -> Result<Box<dyn Precompile>, Erc20Error>;
}

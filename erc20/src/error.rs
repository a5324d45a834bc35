//! Error types for the ERC20 module

use bank::BankError;
use cosmwasm_std::{OverflowError, StdError, Uint256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Erc20Error {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Bank(#[from] BankError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: expected {expected}, got {actual}")]
    Unauthorized { expected: String, actual: String },

    // ========================================================================
    // Registry Errors
    // ========================================================================

    #[error("ERC20 module is disabled")]
    Erc20Disabled,

    #[error("Token pair not found: {token}")]
    TokenPairNotFound { token: String },

    #[error("Token pair already registered: {token}")]
    AlreadyRegistered { token: String },

    #[error("Token pair for {token} is disabled")]
    PairDisabled { token: String },

    #[error("Undefined owner for token pair {token}")]
    UndefinedOwner { token: String },

    #[error("Precompile not found at {address}")]
    PrecompileNotFound { address: String },

    #[error("Conversion is not needed for {denom}: its contract is a precompile over the native ledger")]
    NativeConversionDisabled { denom: String },

    #[error("Contract {contract} still has a total supply of {supply}")]
    ContractHasSupply { contract: String, supply: Uint256 },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Invalid metadata: {reason}")]
    InvalidMetadata { reason: String },

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[error("Invalid packet: {reason}")]
    InvalidPacket { reason: String },

    #[error("{contract} is not an ERC20 contract: {reason}")]
    NotErc20 { contract: String, reason: String },

    #[error("Insufficient funds: {available} of {token} is smaller than {required}")]
    InsufficientFunds {
        token: String,
        available: Uint256,
        required: Uint256,
    },

    // ========================================================================
    // Contract Call Errors
    // ========================================================================

    #[error("EVM call {method} failed: {reason}")]
    EvmCallFailed { method: String, reason: String },

    #[error("Balance invariance violated: expected {expected}, got {actual}")]
    BalanceInvariance { expected: Uint256, actual: Uint256 },

    #[error("Unexpected Approval event emitted by {contract}")]
    UnexpectedApprovalEvent { contract: String },
}

/// Failures of the contract execution substrate itself. A revert is not one
/// of these: reverts come back as part of a successful call response.
#[derive(Error, Debug, PartialEq)]
pub enum EvmError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("No contract at {address}")]
    ContractNotFound { address: String },

    #[error("Deployment failed: {reason}")]
    DeployFailed { reason: String },
}

impl From<EvmError> for Erc20Error {
    fn from(err: EvmError) -> Self {
        Erc20Error::EvmCallFailed {
            method: "evm".to_string(),
            reason: err.to_string(),
        }
    }
}

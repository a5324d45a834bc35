//! Error types for the bank module

use cosmwasm_std::{OverflowError, StdError, Uint256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BankError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // ========================================================================
    // Funds Errors
    // ========================================================================

    #[error("Insufficient funds: spendable {available}{denom} is smaller than {required}{denom}")]
    InsufficientFunds {
        denom: String,
        available: Uint256,
        required: Uint256,
    },

    #[error("Invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("Balance invariance violated for {denom}: expected change {expected}, got {actual}")]
    BalanceInvariance {
        denom: String,
        expected: Uint256,
        actual: Uint256,
    },

    // ========================================================================
    // Account Errors
    // ========================================================================

    #[error("Unknown module account: {name}")]
    UnknownModule { name: String },

    #[error("{address} is not allowed to receive funds")]
    BlockedAddress { address: String },

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },
}

//! Bank - Native Coin Ledger with Dual-Ledger Facade
//!
//! The native ledger keeps balances, supply, spend locks, accounts and denom
//! metadata. On top of it the [`WrappedKeeper`] makes sends and balance
//! queries aware of tokens that also live on the contract ledger:
//!
//! # Send
//! 1. Denoms without an enabled token pair are sent natively
//! 2. If the sender's spendable native balance covers the amount, send natively
//! 3. Otherwise convert the shortfall from the contract ledger, verify the
//!    contract balance dropped by exactly that much, then send
//! 4. Recipient accounts are created on first receipt
//!
//! # Burn
//! Burns from governance and the staking pools are redirected to the
//! community pool instead of destroying supply.

pub mod burn;
pub mod config;
pub mod contract;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod msg;
mod query;
pub mod state;
pub mod wrapped;

pub use crate::config::BankConfig;
pub use crate::error::BankError;
pub use crate::keeper::BankKeeper;
pub use crate::wrapped::{DualPair, Erc20Keeper, WrappedKeeper};

//! Common - Shared Types and Utilities for the Duality Modules
//!
//! This package provides the execution context, the copy-on-write store
//! overlay, coin and metadata types, address and hashing helpers, and the
//! cross-chain transfer denomination rules used by the `bank` and `erc20`
//! modules.

pub mod address;
pub mod coin;
pub mod context;
pub mod hash;
pub mod ibc;
pub mod store;

pub use address::{module_address, parse_account, to_bech32, to_hex};
pub use coin::{Coin, DenomUnit, Metadata};
pub use context::{BlockInfo, Context};
pub use store::CacheStore;

//! Testing - Chain Harness for the Duality Modules
//!
//! - [`evm`] - Token contracts kept in the store, with precompile dispatch
//! - [`transfer`] - A transfer application to wrap with the ERC20 middleware
//! - [`app`] - Keepers wired together over a mock store

pub mod app;
pub mod evm;
pub mod transfer;

pub use app::{inbound_packet, local_address, remote_address, Keepers, TestApp};
pub use evm::{MockEvm, TokenKind};
pub use transfer::{MockTransferApp, MsgTransfer};

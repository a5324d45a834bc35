//! ERC20 - Native/ERC20 Token Duality
//!
//! Binds native denominations to token contracts so that one asset can be
//! held on either ledger and moved between them.
//!
//! # Token pairs
//! - `Module` owned: the native coin is the original. Its contract is either
//!   a module-deployed synthetic ERC20 or a precompile over the native ledger.
//! - `External` owned: an independently deployed ERC20 is the original and
//!   the native coin `erc20/<address>` is minted against escrowed tokens.
//!
//! # Conversion
//! 1. Escrow or burn on the source ledger
//! 2. Mint or release on the destination ledger
//! 3. Check both balance deltas and reject unexpected `Approval` events
//! 4. Commit only if every step succeeded
//!
//! # Cross-chain transfers
//! [`middleware::Erc20Middleware`] wraps the transfer application: inbound
//! vouchers native to the sending chain are onboarded as precompile pairs,
//! returning contract tokens are converted back, and refunds of failed
//! outbound transfers are restored to their contract representation.

pub mod abi;
pub mod contract;
pub mod error;
pub mod events;
mod execute;
pub mod expected_keepers;
pub mod genesis;
pub mod keeper;
pub mod middleware;
pub mod msg;
mod query;
pub mod state;

pub use crate::error::{Erc20Error, EvmError};
pub use crate::keeper::{Erc20Config, Keeper, PrecompileRegistrar, ReceiveOutcome};
pub use crate::middleware::{Erc20Middleware, IbcModule};

#[cfg(test)]
pub(crate) fn testing_keeper() -> Keeper {
    use crate::expected_keepers::{CallResponse, EvmCall, EvmKeeper};
    use alloy_primitives::Address;
    use bank::{BankConfig, BankKeeper};
    use common::Context;
    use cosmwasm_std::Storage;

    /// Substrate without any contracts
    struct NoContracts;

    impl EvmKeeper for NoContracts {
        fn call(&self, _ctx: &mut Context, call: EvmCall) -> Result<CallResponse, EvmError> {
            Err(EvmError::ContractNotFound {
                address: call.to.to_string(),
            })
        }

        fn deploy_erc20(
            &self,
            _ctx: &mut Context,
            _deployer: Address,
            _name: &str,
            _symbol: &str,
            _decimals: u8,
        ) -> Result<Address, EvmError> {
            Err(EvmError::DeployFailed {
                reason: "no contracts".to_string(),
            })
        }

        fn self_destruct(&self, _ctx: &mut Context, contract: Address) -> Result<(), EvmError> {
            Err(EvmError::ContractNotFound {
                address: contract.to_string(),
            })
        }

        fn is_contract(&self, _store: &dyn Storage, _address: Address) -> bool {
            false
        }
    }

    Keeper::new(
        Erc20Config::default(),
        BankKeeper::new(BankConfig::default()),
        std::sync::Arc::new(NoContracts),
    )
}

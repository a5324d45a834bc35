//! Execute handlers for the ERC20 module.
//!
//! - `convert` - ConvertCoin and ConvertErc20, open to any signer
//! - `governance` - Registration, pair lifecycle and parameters, authority only

mod convert;
mod governance;

pub use convert::*;
pub use governance::*;

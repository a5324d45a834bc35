//! Bank module entry points
//!
//! User sends are routed through the dual-ledger facade and run in a staged
//! context: a failing send leaves no trace.

use alloy_primitives::Address;
use cosmwasm_std::Response;

use common::address::parse_account;
use common::coin::{coins_to_string, validate_coins};
use common::{Coin, Context};

use crate::error::BankError;
use crate::msg::ExecuteMsg;
use crate::wrapped::{Erc20Keeper, WrappedKeeper};

pub use crate::query::query;

pub fn execute<E: Erc20Keeper>(
    ctx: &mut Context,
    keeper: &WrappedKeeper<E>,
    sender: &Address,
    msg: ExecuteMsg,
) -> Result<Response, E::Error> {
    ctx.cached(|ctx| match msg {
        ExecuteMsg::Send { to_address, amount } => {
            execute_send(ctx, keeper, sender, &to_address, &amount)
        }
        ExecuteMsg::MultiSend { outputs } => {
            let mut res = Response::new().add_attribute("action", "multi_send");
            for output in outputs {
                execute_send(ctx, keeper, sender, &output.address, &output.coins)?;
                res = res.add_attribute("recipient", output.address);
            }
            Ok(res)
        }
    })
}

fn execute_send<E: Erc20Keeper>(
    ctx: &mut Context,
    keeper: &WrappedKeeper<E>,
    sender: &Address,
    to_address: &str,
    amount: &[Coin],
) -> Result<Response, E::Error> {
    validate_coins(amount).map_err(|e| BankError::InvalidCoins {
        reason: e.to_string(),
    })?;

    let to = parse_account(to_address).map_err(|e| BankError::InvalidAddress {
        reason: e.to_string(),
    })?;
    if keeper.bank().is_blocked(&to) {
        return Err(BankError::BlockedAddress {
            address: to_address.to_string(),
        }
        .into());
    }

    keeper.send_coins(ctx, sender, &to, amount)?;

    Ok(Response::new()
        .add_attribute("action", "send")
        .add_attribute("to", to_address)
        .add_attribute("amount", coins_to_string(amount)))
}

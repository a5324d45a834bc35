//! Conversion handlers.

use alloy_primitives::Address;
use cosmwasm_std::{Response, Uint256};

use common::address::{parse_account, parse_evm_address};
use common::{Coin, Context};

use crate::error::Erc20Error;
use crate::keeper::Keeper;

fn parse_receiver(receiver: &str) -> Result<Address, Erc20Error> {
    parse_account(receiver).map_err(|e| Erc20Error::InvalidAddress {
        reason: format!("receiver {receiver}: {e}"),
    })
}

/// Convert the signer's native coins into contract tokens.
pub fn execute_convert_coin(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    coin: Coin,
    receiver: String,
) -> Result<Response, Erc20Error> {
    coin.validate()?;
    let receiver_addr = parse_receiver(&receiver)?;

    let pair = keeper.convert_coin(ctx, *sender, receiver_addr, &coin)?;

    Ok(Response::new()
        .add_attribute("method", "convert_coin")
        .add_attribute("receiver", receiver)
        .add_attribute("amount", coin.to_string())
        .add_attribute("erc20_token", pair.erc20_address))
}

/// Convert the signer's contract tokens into native coins.
pub fn execute_convert_erc20(
    ctx: &mut Context,
    keeper: &Keeper,
    sender: &Address,
    contract_address: String,
    amount: Uint256,
    receiver: String,
) -> Result<Response, Erc20Error> {
    let contract = parse_evm_address(&contract_address)
        .map(Address::from)
        .map_err(|e| Erc20Error::InvalidAddress {
            reason: format!("contract {contract_address}: {e}"),
        })?;
    let receiver_addr = parse_receiver(&receiver)?;

    let pair = keeper.convert_erc20(ctx, *sender, receiver_addr, contract, amount)?;

    Ok(Response::new()
        .add_attribute("method", "convert_erc20")
        .add_attribute("receiver", receiver)
        .add_attribute("amount", amount.to_string())
        .add_attribute("cosmos_coin", pair.denom))
}

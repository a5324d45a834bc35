//! Minimal fungible token transfer application
//!
//! Escrows coins that leave their home chain and burns vouchers that travel
//! back, then undoes either on refund. Inbound packets unescrow returning
//! coins or mint `ibc/<HASH>` vouchers for foreign ones.

use alloy_primitives::Address;
use cosmwasm_std::{from_json, to_json_binary, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use bank::config::TRANSFER;
use bank::WrappedKeeper;
use common::address::{module_address, to_bech32};
use common::ibc::{
    denom_prefix, received_coin, receiver_chain_is_source, sent_coin, transfer_sender_recipient,
    Acknowledgement, DenomTrace, FungibleTokenPacketData, Packet,
};
use common::{Coin, Context};
use erc20::{Erc20Error, IbcModule, Keeper};

pub const PORT: &str = "transfer";

/// voucher denom -> full denomination path
const DENOM_TRACES: Map<&str, String> = Map::new("transfer_denom_traces");
const NEXT_SEQUENCE: Item<u64> = Item::new("transfer_next_sequence");

/// Outbound transfer request
pub struct MsgTransfer {
    pub source_channel: String,
    pub destination_channel: String,
    pub token: Coin,
    pub sender: Address,
    pub receiver: String,
    pub memo: String,
}

pub struct MockTransferApp {
    bank: WrappedKeeper<Keeper>,
}

impl MockTransferApp {
    pub fn new(bank: WrappedKeeper<Keeper>) -> Self {
        Self { bank }
    }

    pub fn escrow_address(&self) -> Address {
        module_address(TRANSFER)
    }

    pub fn denom_trace(&self, store: &dyn Storage, denom: &str) -> StdResult<Option<String>> {
        DENOM_TRACES.may_load(store, denom)
    }

    /// Debit the sender and build the packet that would be relayed. Coins
    /// held on the contract ledger are pulled over by the bank facade.
    pub fn send_transfer(&self, ctx: &mut Context, msg: MsgTransfer) -> Result<Packet, Erc20Error> {
        ctx.cached(|ctx| {
            let full_path = match DENOM_TRACES.may_load(ctx.store, &msg.token.denom)? {
                Some(path) => path,
                None => msg.token.denom.clone(),
            };
            let coins = [msg.token.clone()];

            if receiver_chain_is_source(PORT, &msg.source_channel, &full_path) {
                self.bank
                    .send_coins_from_account_to_module(ctx, &msg.sender, TRANSFER, &coins)?;
                self.bank.bank().burn_coins(ctx, TRANSFER, &coins)?;
            } else {
                let escrow = self.escrow_address();
                self.bank.send_coins(ctx, &msg.sender, &escrow, &coins)?;
            }

            let sequence = NEXT_SEQUENCE.may_load(ctx.store)?.unwrap_or(1);
            NEXT_SEQUENCE.save(ctx.store, &(sequence + 1))?;

            let data = FungibleTokenPacketData {
                denom: full_path,
                amount: msg.token.amount.to_string(),
                sender: to_bech32(&msg.sender, &self.bank.bank().config().hrp)?,
                receiver: msg.receiver,
                memo: msg.memo,
            };
            Ok(Packet {
                sequence,
                source_port: PORT.to_string(),
                source_channel: msg.source_channel,
                destination_port: PORT.to_string(),
                destination_channel: msg.destination_channel,
                data: to_json_binary(&data)?,
            })
        })
    }

    fn receive(&self, ctx: &mut Context, packet: &Packet) -> Result<(), Erc20Error> {
        let data: FungibleTokenPacketData = from_json(&packet.data)?;
        data.validate()?;
        let (_, recipient, _, _) = transfer_sender_recipient(&data, &self.bank.bank().config().hrp)?;
        let amount = data.parse_amount()?;
        let bank = self.bank.bank();

        if receiver_chain_is_source(&packet.source_port, &packet.source_channel, &data.denom) {
            let coin = received_coin(
                &packet.source_port,
                &packet.source_channel,
                &packet.destination_port,
                &packet.destination_channel,
                &data.denom,
                amount,
            );
            bank.send_coins(ctx, &self.escrow_address(), &recipient, &[coin])?;
            return Ok(());
        }

        let full_path = format!(
            "{}{}",
            denom_prefix(&packet.destination_port, &packet.destination_channel),
            data.denom
        );
        let voucher = DenomTrace::parse(&full_path).ibc_denom();
        DENOM_TRACES.save(ctx.store, &voucher, &full_path)?;

        let coins = [Coin::new(amount, voucher)];
        bank.mint_coins(ctx, TRANSFER, &coins)?;
        bank.send_coins_from_module_to_account(ctx, TRANSFER, &recipient, &coins)?;
        Ok(())
    }

    /// Give the sender back what [`MockTransferApp::send_transfer`] took
    fn refund(&self, ctx: &mut Context, packet: &Packet) -> Result<(), Erc20Error> {
        let data: FungibleTokenPacketData = from_json(&packet.data)?;
        let (sender, _, _, _) = transfer_sender_recipient(&data, &self.bank.bank().config().hrp)?;
        let coins = [sent_coin(&data.denom, data.parse_amount()?)];
        let bank = self.bank.bank();

        if receiver_chain_is_source(&packet.source_port, &packet.source_channel, &data.denom) {
            bank.mint_coins(ctx, TRANSFER, &coins)?;
            bank.send_coins_from_module_to_account(ctx, TRANSFER, &sender, &coins)?;
        } else {
            bank.send_coins(ctx, &self.escrow_address(), &sender, &coins)?;
        }
        Ok(())
    }
}

impl IbcModule for MockTransferApp {
    fn on_recv_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        _relayer: &Address,
    ) -> Acknowledgement {
        match ctx.cached(|ctx| self.receive(ctx, packet)) {
            Ok(()) => Acknowledgement::success(),
            Err(err) => Acknowledgement::error(err.to_string()),
        }
    }

    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        ack: &Acknowledgement,
        _relayer: &Address,
    ) -> Result<(), Erc20Error> {
        if ack.is_success() {
            return Ok(());
        }
        self.refund(ctx, packet)
    }

    fn on_timeout_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        _relayer: &Address,
    ) -> Result<(), Erc20Error> {
        self.refund(ctx, packet)
    }
}


//! Transfer packet lifecycle
//!
//! # Receive
//! Runs after the transfer application credited the recipient natively.
//! 1. Packets with undecodable data, or whose sender and recipient are the
//!    same account on a channel to a chain with a different account
//!    derivation, are rejected outright
//! 2. Nothing happens when bridging is off, the recipient is a module
//!    account, or the coin is the staking denom or a non-bridgeable namespace
//! 3. An unseen voucher of a coin native to the sending chain is onboarded
//!    as a precompile pair
//! 4. A coin of an enabled externally owned pair is converted in full to
//!    its contract representation
//!
//! # Acknowledgement failure / timeout
//! The transfer application refunds the sender natively; the refund is then
//! converted back so the sender holds what it held before sending.

use alloy_primitives::Address;
use cosmwasm_std::{from_json, Uint256};

use common::ibc::{
    is_base_denom_from_source_chain, received_coin, sent_coin, transfer_sender_recipient,
    DenomTrace, FungibleTokenPacketData, Packet, IBC_DENOM_PREFIX,
};
use common::{parse_account, Coin, Context};

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::{Owner, TokenPair};

/// What receiving a packet does on top of the native credit
#[derive(Debug, PartialEq)]
pub enum ReceiveOutcome {
    Noop,
    /// Onboard `denom`, the local voucher of `base_denom`
    AutoRegister { denom: String, base_denom: String },
    /// Move `amount` of the recipient's native balance to the contract ledger
    Convert {
        recipient: Address,
        contract: Address,
        denom: String,
        amount: Uint256,
    },
    /// The bridging step failed; the native credit stands
    Error(Erc20Error),
}

fn invalid_packet(reason: impl ToString) -> Erc20Error {
    Erc20Error::InvalidPacket {
        reason: reason.to_string(),
    }
}

impl Keeper {
    /// Decode and validate transfer packet data
    pub fn packet_data(&self, packet: &Packet) -> Result<FungibleTokenPacketData, Erc20Error> {
        let data: FungibleTokenPacketData = from_json(&packet.data).map_err(invalid_packet)?;
        data.validate().map_err(invalid_packet)?;
        Ok(data)
    }

    /// Checks that reject a received packet altogether
    pub fn check_recv_packet(
        &self,
        ctx: &Context,
        packet: &Packet,
    ) -> Result<FungibleTokenPacketData, Erc20Error> {
        let data = self.packet_data(packet)?;
        let params = self.params(ctx.store)?;
        if !params.enable_erc20 {
            return Ok(data);
        }
        let (sender, recipient, _, _) =
            transfer_sender_recipient(&data, &self.config.hrp).map_err(invalid_packet)?;

        // Identical key bytes on a chain with a different derivation path
        // belong to different keys; the local account is not controlled by
        // the sender and funds would be stuck there.
        if sender == recipient && !params.is_evm_channel(&packet.destination_channel) {
            return Err(invalid_packet(format!(
                "sender and recipient are the same account {} on non-EVM channel {}",
                data.receiver, packet.destination_channel
            )));
        }
        Ok(data)
    }

    /// Decide what to do with a packet whose native credit already happened
    pub fn receive_outcome(
        &self,
        ctx: &Context,
        packet: &Packet,
        data: &FungibleTokenPacketData,
    ) -> ReceiveOutcome {
        match self.decide_receive(ctx, packet, data) {
            Ok(outcome) => outcome,
            Err(err) => ReceiveOutcome::Error(err),
        }
    }

    fn decide_receive(
        &self,
        ctx: &Context,
        packet: &Packet,
        data: &FungibleTokenPacketData,
    ) -> Result<ReceiveOutcome, Erc20Error> {
        let params = self.params(ctx.store)?;
        if !params.enable_erc20 {
            tracing::debug!(target: "erc20::ibc", "bridging disabled, skipping packet");
            return Ok(ReceiveOutcome::Noop);
        }

        let (_, recipient, _, _) =
            transfer_sender_recipient(data, &self.config.hrp).map_err(invalid_packet)?;
        if self.bank.is_module_account(&recipient) {
            tracing::debug!(target: "erc20::ibc", %recipient, "module recipient, skipping packet");
            return Ok(ReceiveOutcome::Noop);
        }

        let coin = received_coin(
            &packet.source_port,
            &packet.source_channel,
            &packet.destination_port,
            &packet.destination_channel,
            &data.denom,
            data.parse_amount()?,
        );
        // the raw denom carries the namespace of inbound vouchers, the local
        // denom that of coins returning home
        if coin.denom == self.config.bond_denom
            || self.is_non_bridgeable(&DenomTrace::parse(&data.denom).base_denom)
            || self.is_non_bridgeable(&coin.denom)
        {
            tracing::debug!(target: "erc20::ibc", denom = %coin.denom, "coin is not bridged");
            return Ok(ReceiveOutcome::Noop);
        }

        let Some(pair) = self.token_pair_by_denom(ctx.store, &coin.denom)? else {
            if coin.denom.starts_with(IBC_DENOM_PREFIX) && is_base_denom_from_source_chain(&data.denom)
            {
                return Ok(ReceiveOutcome::AutoRegister {
                    denom: coin.denom,
                    base_denom: DenomTrace::parse(&data.denom).base_denom,
                });
            }
            return Ok(ReceiveOutcome::Noop);
        };

        match pair.contract_owner {
            _ if !pair.enabled => Ok(ReceiveOutcome::Noop),
            Owner::External => {
                let amount = self.bank.balance(ctx.store, &recipient, &coin.denom)?;
                if amount.is_zero() {
                    return Ok(ReceiveOutcome::Noop);
                }
                Ok(ReceiveOutcome::Convert {
                    recipient,
                    contract: pair.address()?,
                    denom: coin.denom,
                    amount,
                })
            }
            Owner::Module | Owner::Unspecified => Ok(ReceiveOutcome::Noop),
        }
    }

    /// Carry out a decision. Failures are reported as
    /// [`ReceiveOutcome::Error`] with nothing written.
    pub fn apply_receive_outcome(&self, ctx: &mut Context, outcome: ReceiveOutcome) -> ReceiveOutcome {
        let result = match &outcome {
            ReceiveOutcome::Noop | ReceiveOutcome::Error(_) => return outcome,
            ReceiveOutcome::AutoRegister { denom, base_denom } => self
                .register_erc20_extension(ctx, denom, base_denom)
                .map(|_| ()),
            ReceiveOutcome::Convert {
                recipient,
                denom,
                amount,
                ..
            } => self
                .convert_coin(ctx, *recipient, *recipient, &Coin::new(*amount, denom))
                .map(|_| ()),
        };

        match result {
            Ok(()) => outcome,
            Err(err) => ReceiveOutcome::Error(err),
        }
    }

    /// Convert a refunded coin back into its contract representation for
    /// the sender. Returns the pair used, if any.
    pub fn convert_refund(
        &self,
        ctx: &mut Context,
        packet: &Packet,
    ) -> Result<Option<TokenPair>, Erc20Error> {
        let data = self.packet_data(packet)?;
        let sender = parse_account(&data.sender).map_err(invalid_packet)?;

        let params = self.params(ctx.store)?;
        if !params.enable_erc20 {
            return Ok(None);
        }
        if self.bank.is_module_account(&sender) {
            tracing::debug!(target: "erc20::ibc", %sender, "module sender, refund kept native");
            return Ok(None);
        }

        let coin = sent_coin(&data.denom, data.parse_amount()?);
        let pair = match self.token_pair_by_denom(ctx.store, &coin.denom)? {
            Some(pair) if pair.enabled => pair,
            _ => return Ok(None),
        };

        match pair.contract_owner {
            Owner::External => {}
            Owner::Module if !params.is_precompile(&pair.address()?) => {}
            _ => return Ok(None),
        }

        let pair = self.convert_coin(ctx, sender, sender, &coin)?;
        tracing::info!(
            target: "erc20::ibc",
            %sender,
            amount = %coin,
            "converted refunded coin back to erc20"
        );
        Ok(Some(pair))
    }

    fn is_non_bridgeable(&self, denom: &str) -> bool {
        self.config
            .non_bridgeable_prefixes
            .iter()
            .any(|prefix| denom.starts_with(prefix.as_str()))
    }
}

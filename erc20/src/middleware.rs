//! Transfer middleware
//!
//! [`Erc20Middleware`] wraps a transfer application. Every callback first
//! runs the wrapped application and then applies the ERC20 module's packet
//! handling on top of its result.

use alloy_primitives::Address;
use cosmwasm_std::Event;

use common::ibc::{Acknowledgement, Packet};
use common::Context;

use crate::error::Erc20Error;
use crate::events::{ATTRIBUTE_DENOM, ATTRIBUTE_ERROR, ATTRIBUTE_STAGE, EVENT_BRIDGE_FAILED};
use crate::keeper::{Keeper, ReceiveOutcome};

/// Packet callbacks of a transfer application
pub trait IbcModule {
    /// Handle an inbound packet. State written while producing an error
    /// acknowledgement is discarded by the caller.
    fn on_recv_packet(&self, ctx: &mut Context, packet: &Packet, relayer: &Address)
        -> Acknowledgement;

    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        ack: &Acknowledgement,
        relayer: &Address,
    ) -> Result<(), Erc20Error>;

    fn on_timeout_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        relayer: &Address,
    ) -> Result<(), Erc20Error>;
}

pub struct Erc20Middleware<A> {
    app: A,
    keeper: Keeper,
}

impl<A: IbcModule> Erc20Middleware<A> {
    pub fn new(app: A, keeper: Keeper) -> Self {
        Self { app, keeper }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    fn report_failure(&self, ctx: &mut Context, stage: &str, denom: &str, err: &Erc20Error) {
        tracing::warn!(
            target: "erc20::ibc",
            stage,
            denom,
            error = %err,
            "bridging step failed, transfer kept"
        );
        ctx.emit(
            Event::new(EVENT_BRIDGE_FAILED)
                .add_attribute(ATTRIBUTE_STAGE, stage)
                .add_attribute(ATTRIBUTE_DENOM, denom)
                .add_attribute(ATTRIBUTE_ERROR, err.to_string()),
        );
    }

    fn refund(&self, ctx: &mut Context, packet: &Packet, stage: &str) {
        if let Err(err) = self.keeper.convert_refund(ctx, packet) {
            let denom = self
                .keeper
                .packet_data(packet)
                .map(|data| data.denom)
                .unwrap_or_default();
            self.report_failure(ctx, stage, &denom, &err);
        }
    }
}

impl<A: IbcModule> IbcModule for Erc20Middleware<A> {
    fn on_recv_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        relayer: &Address,
    ) -> Acknowledgement {
        let result = ctx.cached(|ctx| {
            let ack = self.app.on_recv_packet(ctx, packet, relayer);
            if !ack.is_success() {
                return Err(ack);
            }

            let data = self.keeper.check_recv_packet(ctx, packet).map_err(|err| {
                tracing::warn!(
                    target: "erc20::ibc",
                    sequence = packet.sequence,
                    error = %err,
                    "rejecting packet"
                );
                Acknowledgement::error(err.to_string())
            })?;

            let outcome = self.keeper.receive_outcome(ctx, packet, &data);
            match self.keeper.apply_receive_outcome(ctx, outcome) {
                ReceiveOutcome::Error(err) => self.report_failure(ctx, "recv", &data.denom, &err),
                outcome => tracing::debug!(
                    target: "erc20::ibc",
                    sequence = packet.sequence,
                    ?outcome,
                    "packet handled"
                ),
            }
            Ok(ack)
        });

        match result {
            Ok(ack) | Err(ack) => ack,
        }
    }

    fn on_acknowledgement_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        ack: &Acknowledgement,
        relayer: &Address,
    ) -> Result<(), Erc20Error> {
        self.app
            .on_acknowledgement_packet(ctx, packet, ack, relayer)?;
        if !ack.is_success() {
            self.refund(ctx, packet, "ack");
        }
        Ok(())
    }

    fn on_timeout_packet(
        &self,
        ctx: &mut Context,
        packet: &Packet,
        relayer: &Address,
    ) -> Result<(), Erc20Error> {
        self.app.on_timeout_packet(ctx, packet, relayer)?;
        self.refund(ctx, packet, "timeout");
        Ok(())
    }
}

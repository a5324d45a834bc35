//! Fully wired chain state for integration tests
//!
//! Builds the keepers in two phases: the contract substrate comes first
//! without precompiles, the ERC20 keeper is built on top of it, and only then
//! is the precompile registrar installed into the substrate.

use std::sync::Arc;

use alloy_primitives::Address;
use cosmwasm_std::testing::MockStorage;
use cosmwasm_std::{from_json, Event, Response, StdResult, Uint256};
use serde::de::DeserializeOwned;

use bank::config::MINT;
use bank::{BankConfig, BankError, BankKeeper, WrappedKeeper};
use common::address::{encode_bech32_address, to_bech32, to_hex};
use common::ibc::{Acknowledgement, FungibleTokenPacketData, Packet};
use common::{BlockInfo, Coin, Context};
use erc20::msg::{ExecuteMsg, QueryMsg};
use erc20::state::{Params, TokenPair};
use erc20::{Erc20Config, Erc20Error, Erc20Middleware, IbcModule, Keeper, PrecompileRegistrar};

use crate::evm::{MockEvm, TokenKind};
use crate::transfer::{MockTransferApp, MsgTransfer, PORT};

/// Bech32 prefix of the counterparty chain in packet helpers
pub const REMOTE_HRP: &str = "cosmos";

pub struct Keepers {
    pub evm: Arc<MockEvm>,
    pub bank: BankKeeper,
    pub erc20: Keeper,
    pub wrapped: WrappedKeeper<Keeper>,
    pub transfer: Erc20Middleware<MockTransferApp>,
}

pub struct TestApp {
    pub store: MockStorage,
    pub block: BlockInfo,
    pub keepers: Keepers,
    /// Events of every committed call, in order
    pub events: Vec<Event>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Self {
        Self::with_config(Erc20Config::default(), params)
    }

    pub fn with_config(config: Erc20Config, params: Params) -> Self {
        let bank = BankKeeper::new(BankConfig::default());
        let evm = Arc::new(MockEvm::new());
        let erc20 = Keeper::new(config, bank.clone(), evm.clone());
        evm.install_precompiles(Box::new(PrecompileRegistrar::new(bank.clone())))
            .expect("fresh substrate");

        let wrapped = WrappedKeeper::new(bank.clone(), erc20.clone());
        let transfer = Erc20Middleware::new(MockTransferApp::new(wrapped.clone()), erc20.clone());

        let mut app = Self {
            store: MockStorage::new(),
            block: BlockInfo::default(),
            keepers: Keepers {
                evm,
                bank,
                erc20,
                wrapped,
                transfer,
            },
            events: vec![],
        };
        app.run(|ctx, k| {
            k.bank
                .init_genesis(ctx, &bank::genesis::GenesisState::default())
                .expect("bank genesis");
            k.erc20
                .init_genesis(
                    ctx,
                    &erc20::genesis::GenesisState {
                        params,
                        token_pairs: vec![],
                    },
                )
                .expect("erc20 genesis");
        });
        app
    }

    /// Run `f` against the committed store and keep the events it emits
    pub fn run<T>(&mut self, f: impl FnOnce(&mut Context, &Keepers) -> T) -> T {
        let mut ctx = Context::new(&mut self.store, self.block.clone());
        let out = f(&mut ctx, &self.keepers);
        self.events.extend(ctx.take_events());
        out
    }

    pub fn next_block(&mut self) {
        self.block.height += 1;
        self.block.time = self.block.time.plus_seconds(5);
    }

    pub fn has_event(&self, ty: &str) -> bool {
        self.events.iter().any(|e| e.ty == ty)
    }

    pub fn authority(&self) -> Address {
        self.keepers.erc20.config().authority
    }

    pub fn erc20_module(&self) -> Address {
        self.keepers.erc20.module_address()
    }

    // ========================================================================
    // Native ledger
    // ========================================================================

    /// Mint fresh native coins to `to`
    pub fn fund(&mut self, to: &Address, coin: Coin) {
        self.run(|ctx, k| -> Result<(), BankError> {
            let coins = [coin];
            k.bank.mint_coins(ctx, MINT, &coins)?;
            k.bank.send_coins_from_module_to_account(ctx, MINT, to, &coins)
        })
        .expect("fund account");
    }

    pub fn native_balance(&self, addr: &Address, denom: &str) -> Uint256 {
        self.keepers
            .bank
            .balance(&self.store, addr, denom)
            .expect("native balance")
    }

    pub fn supply(&self, denom: &str) -> Uint256 {
        self.keepers.bank.supply(&self.store, denom).expect("supply")
    }

    /// Native plus contract-side balance as reported by the bank facade
    pub fn combined_balance(&self, addr: &Address, denom: &str) -> Uint256 {
        Context::read_only(&self.store, &self.block, |ctx| {
            self.keepers.wrapped.balance(ctx, addr, denom)
        })
        .expect("combined balance")
        .amount
    }

    pub fn execute_bank(
        &mut self,
        sender: &Address,
        msg: bank::msg::ExecuteMsg,
    ) -> Result<Response, Erc20Error> {
        self.run(|ctx, k| bank::contract::execute(ctx, &k.wrapped, sender, msg))
    }

    // ========================================================================
    // Contract ledger
    // ========================================================================

    /// Deploy a token owned by `owner`
    pub fn deploy_token(
        &mut self,
        owner: &Address,
        kind: TokenKind,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Address {
        self.run(|ctx, k| k.evm.deploy(ctx, *owner, kind, name, symbol, decimals))
            .expect("deploy token")
    }

    pub fn mint_tokens(&mut self, contract: &Address, to: &Address, amount: u128) {
        self.run(|ctx, k| k.evm.mint_unchecked(ctx, *contract, *to, Uint256::from(amount)))
            .expect("mint tokens");
    }

    /// Balance as seen through the contract, precompiles included
    pub fn token_balance(&self, contract: &Address, account: &Address) -> Uint256 {
        Context::read_only(&self.store, &self.block, |ctx| {
            self.keepers.erc20.balance_of(ctx, *contract, *account)
        })
        .expect("token balance")
    }

    pub fn token_supply(&self, contract: &Address) -> Uint256 {
        Context::read_only(&self.store, &self.block, |ctx| {
            self.keepers.erc20.total_supply(ctx, *contract)
        })
        .expect("token supply")
    }

    // ========================================================================
    // ERC20 module
    // ========================================================================

    pub fn execute(&mut self, sender: &Address, msg: ExecuteMsg) -> Result<Response, Erc20Error> {
        self.run(|ctx, k| erc20::contract::execute(ctx, &k.erc20, sender, msg))
    }

    pub fn query<T: DeserializeOwned>(&self, msg: QueryMsg) -> Result<T, Erc20Error> {
        let bin = erc20::contract::query(&self.store, &self.block, &self.keepers.erc20, msg)?;
        Ok(from_json(bin)?)
    }

    pub fn params(&self) -> Params {
        self.keepers.erc20.params(&self.store).expect("params")
    }

    pub fn update_params(&mut self, f: impl FnOnce(&mut Params)) {
        let mut params = self.params();
        f(&mut params);
        let authority = self.authority();
        self.execute(&authority, ExecuteMsg::UpdateParams { params })
            .expect("update params");
    }

    pub fn token_pair(&self, token: &str) -> Option<TokenPair> {
        self.keepers
            .erc20
            .lookup_token_pair(&self.store, token)
            .expect("token pair lookup")
    }

    /// Register an externally deployed contract through governance
    pub fn register_erc20(&mut self, contract: &Address) -> Result<TokenPair, Erc20Error> {
        let authority = self.authority();
        self.execute(
            &authority,
            ExecuteMsg::RegisterErc20 {
                contract_address: to_hex(contract),
            },
        )?;
        Ok(self
            .token_pair(&to_hex(contract))
            .expect("registered pair"))
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    pub fn relayer(&self) -> Address {
        Address::repeat_byte(0xee)
    }

    pub fn send_transfer(
        &mut self,
        sender: &Address,
        source_channel: &str,
        token: Coin,
        receiver: &str,
    ) -> Result<Packet, Erc20Error> {
        let msg = MsgTransfer {
            source_channel: source_channel.to_string(),
            destination_channel: "channel-0".to_string(),
            token,
            sender: *sender,
            receiver: receiver.to_string(),
            memo: String::new(),
        };
        self.run(|ctx, k| k.transfer.app().send_transfer(ctx, msg))
    }

    pub fn recv_packet(&mut self, packet: &Packet) -> Acknowledgement {
        let relayer = self.relayer();
        self.run(|ctx, k| k.transfer.on_recv_packet(ctx, packet, &relayer))
    }

    pub fn acknowledge_packet(
        &mut self,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> Result<(), Erc20Error> {
        let relayer = self.relayer();
        self.run(|ctx, k| k.transfer.on_acknowledgement_packet(ctx, packet, ack, &relayer))
    }

    pub fn timeout_packet(&mut self, packet: &Packet) -> Result<(), Erc20Error> {
        let relayer = self.relayer();
        self.run(|ctx, k| k.transfer.on_timeout_packet(ctx, packet, &relayer))
    }
}

/// Bech32 rendering on the local chain
pub fn local_address(addr: &Address) -> String {
    to_bech32(addr, common::address::DEFAULT_HRP).expect("local bech32")
}

/// Bech32 rendering of the same key on a counterparty chain
pub fn remote_address(addr: &Address) -> String {
    encode_bech32_address(&addr.0 .0, REMOTE_HRP).expect("remote bech32")
}

/// Build an inbound packet arriving on `dst_channel` from a counterparty
/// that sent it over `src_channel`
pub fn inbound_packet(
    src_channel: &str,
    dst_channel: &str,
    denom: &str,
    amount: u128,
    sender: &str,
    receiver: &str,
) -> StdResult<Packet> {
    let data = FungibleTokenPacketData {
        denom: denom.to_string(),
        amount: amount.to_string(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        memo: String::new(),
    };
    Ok(Packet {
        sequence: 1,
        source_port: PORT.to_string(),
        source_channel: src_channel.to_string(),
        destination_port: PORT.to_string(),
        destination_channel: dst_channel.to_string(),
        data: cosmwasm_std::to_json_binary(&data)?,
    })
}

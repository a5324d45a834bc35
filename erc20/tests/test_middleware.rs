//! Tests for the transfer middleware.
//!
//! Tests:
//! - Inbound vouchers native to the sending chain are onboarded once
//! - Returning contract tokens are converted back on receipt
//! - Refunds after timeout or error acknowledgement restore the contract balance
//! - Same-account packets on non-EVM channels are rejected and reverted
//! - Bridging disabled, module recipients and the staking denom are left alone
//! - Non-bridgeable namespaces are credited natively and never onboarded
//! - A disabled pair keeps received and refunded coins native
//! - A failing conversion keeps the native credit and reports the failure

use alloy_primitives::Address;
use cosmwasm_std::Uint256;

use bank::config::DISTRIBUTION;
use common::address::module_address;
use common::ibc::{ibc_denom, ibc_denom_address, Acknowledgement};
use common::Coin;
use erc20::msg::ExecuteMsg;
use erc20::state::{Owner, Params, TokenPair};
use erc20::Erc20Config;
use testing::{inbound_packet, local_address, remote_address, TestApp, TokenKind};

// ============================================================================
// Test Setup
// ============================================================================

const LOCAL_CHANNEL: &str = "channel-0";
const REMOTE_CHANNEL: &str = "channel-7";

fn user() -> Address {
    Address::repeat_byte(0x11)
}

fn remote_sender() -> String {
    remote_address(&Address::repeat_byte(0x33))
}

fn deployer() -> Address {
    Address::repeat_byte(0xde)
}

fn amount(value: u128) -> Uint256 {
    Uint256::from(value)
}

fn atom_voucher() -> String {
    ibc_denom(&format!("transfer/{LOCAL_CHANNEL}/uatom"))
}

/// Inbound packet carrying `denom` from the counterparty to `receiver`
fn receive(app: &mut TestApp, denom: &str, value: u128, sender: &str, receiver: &str) -> Acknowledgement {
    let packet = inbound_packet(REMOTE_CHANNEL, LOCAL_CHANNEL, denom, value, sender, receiver).unwrap();
    app.recv_packet(&packet)
}

fn count_events(app: &TestApp, ty: &str) -> usize {
    app.events.iter().filter(|e| e.ty == ty).count()
}

/// Disable conversions for `pair` through governance
fn disable_pair(app: &mut TestApp, pair: &TokenPair) {
    let authority = app.authority();
    app.execute(
        &authority,
        ExecuteMsg::ToggleConversion {
            token: pair.denom.clone(),
        },
    )
    .unwrap();
    assert!(!app.token_pair(&pair.denom).unwrap().enabled);
}

/// App where `user` holds `balance` tokens of a registered external contract
fn setup_external_token(kind: TokenKind, balance: u128) -> (TestApp, TokenPair, Address) {
    let mut app = TestApp::new();
    let token = app.deploy_token(&deployer(), kind, "Test Token", "TT", 18);
    app.mint_tokens(&token, &user(), balance);
    let pair = app.register_erc20(&token).unwrap();
    (app, pair, token)
}

// ============================================================================
// Receive
// ============================================================================

#[test]
fn test_inbound_voucher_is_registered_once() {
    let mut app = TestApp::new();
    let receiver = local_address(&user());
    let voucher = atom_voucher();

    let ack = receive(&mut app, "uatom", 10, &remote_sender(), &receiver);
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), &voucher), amount(10));

    let pair = app.token_pair(&voucher).unwrap();
    assert_eq!(pair.contract_owner, Owner::Module);
    assert!(pair.enabled);
    let contract = pair.address().unwrap();
    assert_eq!(contract, ibc_denom_address(&voucher).unwrap());
    assert!(app.params().is_dynamic_precompile(&contract));
    assert_eq!(count_events(&app, "register_erc20_extension"), 1);

    let metadata = app
        .keepers
        .bank
        .denom_metadata(&app.store, &voucher)
        .unwrap()
        .unwrap();
    assert_eq!(metadata.display, "atom");
    assert_eq!(metadata.decimals(), 6);

    // the precompile reads the native ledger
    assert_eq!(app.token_balance(&contract, &user()), amount(10));

    let ack = receive(&mut app, "uatom", 5, &remote_sender(), &receiver);
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), &voucher), amount(15));
    assert_eq!(app.token_balance(&contract, &user()), amount(15));
    assert_eq!(count_events(&app, "register_erc20_extension"), 1);
    assert_eq!(app.keepers.erc20.token_pairs(&app.store).unwrap().len(), 1);
}

#[test]
fn test_multi_hop_voucher_is_not_registered() {
    let mut app = TestApp::new();
    let ack = receive(
        &mut app,
        "transfer/channel-3/uosmo",
        10,
        &remote_sender(),
        &local_address(&user()),
    );
    assert!(ack.is_success());

    let voucher = ibc_denom(&format!("transfer/{LOCAL_CHANNEL}/transfer/channel-3/uosmo"));
    assert_eq!(app.native_balance(&user(), &voucher), amount(10));
    assert!(app.token_pair(&voucher).is_none());
}

#[test]
fn test_returning_erc20_is_converted_back() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard, 10);

    app.send_transfer(
        &user(),
        LOCAL_CHANNEL,
        Coin::new(10u128, pair.denom.clone()),
        &remote_sender(),
    )
    .unwrap();
    assert_eq!(app.token_balance(&token, &user()), Uint256::zero());

    let other = Address::repeat_byte(0x44);
    let ack = receive(
        &mut app,
        &format!("transfer/{REMOTE_CHANNEL}/{}", pair.denom),
        10,
        &remote_sender(),
        &local_address(&other),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&other, &pair.denom), Uint256::zero());
    assert_eq!(app.token_balance(&token, &other), amount(10));
    assert!(app.has_event("convert_coin"));
}

#[test]
fn test_same_account_on_non_evm_channel_is_rejected() {
    let mut app = TestApp::new();
    let ack = receive(
        &mut app,
        "uatom",
        10,
        &remote_address(&user()),
        &local_address(&user()),
    );
    assert!(!ack.is_success());

    // the native credit was reverted with the rejection
    assert_eq!(app.native_balance(&user(), &atom_voucher()), Uint256::zero());
    assert!(app.token_pair(&atom_voucher()).is_none());
}

#[test]
fn test_same_account_on_evm_channel_is_accepted() {
    let mut app = TestApp::new();
    app.update_params(|p| p.evm_channels = vec![LOCAL_CHANNEL.to_string()]);

    let ack = receive(
        &mut app,
        "uatom",
        10,
        &remote_address(&user()),
        &local_address(&user()),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), &atom_voucher()), amount(10));
    assert!(app.token_pair(&atom_voucher()).is_some());
}

#[test]
fn test_bridging_disabled_only_credits_natively() {
    let mut app = TestApp::new();
    app.update_params(|p| p.enable_erc20 = false);

    // same account is fine too while bridging is off
    let ack = receive(
        &mut app,
        "uatom",
        10,
        &remote_address(&user()),
        &local_address(&user()),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), &atom_voucher()), amount(10));
    assert!(app.token_pair(&atom_voucher()).is_none());
}

#[test]
fn test_module_recipient_is_skipped() {
    let mut app = TestApp::new();
    let distribution = module_address(DISTRIBUTION);

    let ack = receive(
        &mut app,
        "uatom",
        10,
        &remote_sender(),
        &local_address(&distribution),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&distribution, &atom_voucher()), amount(10));
    assert!(app.token_pair(&atom_voucher()).is_none());
}

#[test]
fn test_staking_denom_is_not_bridged() {
    let mut app = TestApp::new();
    let escrow = app.keepers.transfer.app().escrow_address();
    app.fund(&escrow, Coin::new(10u128, "aISLM"));

    let ack = receive(
        &mut app,
        &format!("transfer/{REMOTE_CHANNEL}/aISLM"),
        10,
        &remote_sender(),
        &local_address(&user()),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), "aISLM"), amount(10));
    assert!(app.token_pair("aISLM").is_none());
}

#[test]
fn test_non_bridgeable_namespace_is_not_registered() {
    let config = Erc20Config {
        non_bridgeable_prefixes: vec!["factory/".to_string(), "st".to_string()],
        ..Erc20Config::default()
    };
    let mut app = TestApp::with_config(config, Params::default());
    let receiver = local_address(&user());

    let ack = receive(&mut app, "stuatom", 10, &remote_sender(), &receiver);
    assert!(ack.is_success());
    let voucher = ibc_denom(&format!("transfer/{LOCAL_CHANNEL}/stuatom"));
    assert_eq!(app.native_balance(&user(), &voucher), amount(10));
    assert!(app.token_pair(&voucher).is_none());

    let ack = receive(&mut app, "factory/osmo1creator/foo", 10, &remote_sender(), &receiver);
    assert!(ack.is_success());
    let voucher = ibc_denom(&format!("transfer/{LOCAL_CHANNEL}/factory/osmo1creator/foo"));
    assert_eq!(app.native_balance(&user(), &voucher), amount(10));
    assert!(app.token_pair(&voucher).is_none());
    assert!(!app.has_event("register_erc20_extension"));

    // other denoms are still onboarded
    receive(&mut app, "uatom", 10, &remote_sender(), &receiver);
    assert!(app.token_pair(&atom_voucher()).is_some());
}

#[test]
fn test_disabled_pair_receive_stays_native() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard, 10);
    app.send_transfer(
        &user(),
        LOCAL_CHANNEL,
        Coin::new(10u128, pair.denom.clone()),
        &remote_sender(),
    )
    .unwrap();
    disable_pair(&mut app, &pair);

    let other = Address::repeat_byte(0x44);
    let ack = receive(
        &mut app,
        &format!("transfer/{REMOTE_CHANNEL}/{}", pair.denom),
        10,
        &remote_sender(),
        &local_address(&other),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&other, &pair.denom), amount(10));
    assert_eq!(app.token_balance(&token, &other), Uint256::zero());
    assert!(!app.has_event("convert_coin"));
    assert!(!app.has_event("erc20_bridge_failed"));
}

#[test]
fn test_undecodable_packet_is_rejected() {
    let mut app = TestApp::new();
    let mut packet = inbound_packet(
        REMOTE_CHANNEL,
        LOCAL_CHANNEL,
        "uatom",
        10,
        &remote_sender(),
        &local_address(&user()),
    )
    .unwrap();
    packet.data = b"not json".to_vec().into();

    assert!(!app.recv_packet(&packet).is_success());
}

#[test]
fn test_failed_conversion_keeps_native_credit() {
    let (mut app, pair, token) = setup_external_token(TokenKind::FeeSkimming, 0);

    // tokens escrowed by the module and the matching coins sent abroad
    let escrow = app.erc20_module();
    app.mint_tokens(&token, &escrow, 10);
    let transfer_escrow = app.keepers.transfer.app().escrow_address();
    app.fund(&transfer_escrow, Coin::new(10u128, pair.denom.clone()));

    let ack = receive(
        &mut app,
        &format!("transfer/{REMOTE_CHANNEL}/{}", pair.denom),
        10,
        &remote_sender(),
        &local_address(&user()),
    );
    assert!(ack.is_success());
    assert_eq!(app.native_balance(&user(), &pair.denom), amount(10));
    assert_eq!(app.token_balance(&token, &user()), Uint256::zero());

    let failure = app
        .events
        .iter()
        .find(|e| e.ty == "erc20_bridge_failed")
        .unwrap();
    assert!(failure
        .attributes
        .iter()
        .any(|a| a.key == "stage" && a.value == "recv"));
}

// ============================================================================
// Refunds
// ============================================================================

#[test]
fn test_timeout_refund_restores_contract_balance() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard, 10);
    let transfer_escrow = app.keepers.transfer.app().escrow_address();

    let packet = app
        .send_transfer(
            &user(),
            LOCAL_CHANNEL,
            Coin::new(10u128, pair.denom.clone()),
            &remote_sender(),
        )
        .unwrap();
    assert_eq!(app.token_balance(&token, &user()), Uint256::zero());
    assert_eq!(app.native_balance(&user(), &pair.denom), Uint256::zero());
    assert_eq!(app.native_balance(&transfer_escrow, &pair.denom), amount(10));

    app.timeout_packet(&packet).unwrap();
    assert_eq!(app.native_balance(&user(), &pair.denom), Uint256::zero());
    assert_eq!(app.token_balance(&token, &user()), amount(10));
    assert_eq!(app.native_balance(&transfer_escrow, &pair.denom), Uint256::zero());
    assert!(!app.has_event("erc20_bridge_failed"));
}

#[test]
fn test_error_ack_refund_restores_contract_balance() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard, 10);

    let packet = app
        .send_transfer(
            &user(),
            LOCAL_CHANNEL,
            Coin::new(4u128, pair.denom.clone()),
            &remote_sender(),
        )
        .unwrap();
    assert_eq!(app.token_balance(&token, &user()), amount(6));

    app.acknowledge_packet(&packet, &Acknowledgement::success())
        .unwrap();
    assert_eq!(app.token_balance(&token, &user()), amount(6));

    let packet = app
        .send_transfer(
            &user(),
            LOCAL_CHANNEL,
            Coin::new(6u128, pair.denom.clone()),
            &remote_sender(),
        )
        .unwrap();
    app.acknowledge_packet(&packet, &Acknowledgement::error("denied"))
        .unwrap();
    assert_eq!(app.token_balance(&token, &user()), amount(6));
    assert_eq!(app.native_balance(&user(), &pair.denom), Uint256::zero());
}

#[test]
fn test_refund_of_precompile_voucher_stays_native() {
    let mut app = TestApp::new();
    let voucher = atom_voucher();
    receive(&mut app, "uatom", 10, &remote_sender(), &local_address(&user()));
    let contract = app.token_pair(&voucher).unwrap().address().unwrap();

    let packet = app
        .send_transfer(
            &user(),
            LOCAL_CHANNEL,
            Coin::new(10u128, voucher.clone()),
            &remote_sender(),
        )
        .unwrap();
    assert_eq!(app.native_balance(&user(), &voucher), Uint256::zero());

    app.timeout_packet(&packet).unwrap();
    assert_eq!(app.native_balance(&user(), &voucher), amount(10));
    assert_eq!(app.token_balance(&contract, &user()), amount(10));
    assert!(!app.has_event("erc20_bridge_failed"));
}

#[test]
fn test_disabled_pair_refund_stays_native() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard, 10);
    let packet = app
        .send_transfer(
            &user(),
            LOCAL_CHANNEL,
            Coin::new(10u128, pair.denom.clone()),
            &remote_sender(),
        )
        .unwrap();
    disable_pair(&mut app, &pair);

    app.timeout_packet(&packet).unwrap();
    assert_eq!(app.native_balance(&user(), &pair.denom), amount(10));
    assert_eq!(app.token_balance(&token, &user()), Uint256::zero());
    assert!(!app.has_event("erc20_bridge_failed"));
}

//! Tests for conversions between the native and contract ledgers.
//!
//! Tests:
//! - ConvertCoin / ConvertErc20 round trips for module and externally owned pairs
//! - Amount boundaries (zero, exact balance, one over)
//! - Blocked receivers and disabled bridging
//! - Fee-on-transfer tokens fail the balance check without side effects
//! - Unexpected Approval events abort the conversion
//! - EscrowInvariant query

use alloy_primitives::Address;
use cosmwasm_std::Uint256;

use common::address::{module_address, to_hex};
use common::{Coin, DenomUnit, Metadata};
use erc20::msg::{ExecuteMsg, InvariantResponse, QueryMsg};
use erc20::state::TokenPair;
use erc20::Erc20Error;
use testing::{local_address, TestApp, TokenKind};

// ============================================================================
// Test Setup
// ============================================================================

fn user() -> Address {
    Address::repeat_byte(0x11)
}

fn other() -> Address {
    Address::repeat_byte(0x22)
}

fn deployer() -> Address {
    Address::repeat_byte(0xde)
}

fn amount(value: u128) -> Uint256 {
    Uint256::from(value)
}

/// App where `user` holds 1000 uxyz and uxyz is paired with a module contract
fn setup_native_coin() -> (TestApp, TokenPair) {
    let mut app = TestApp::new();
    app.fund(&user(), Coin::new(1000u128, "uxyz"));

    let metadata = Metadata {
        description: "The XYZ coin".to_string(),
        denom_units: vec![DenomUnit {
            denom: "uxyz".to_string(),
            exponent: 0,
            aliases: vec![],
        }],
        base: "uxyz".to_string(),
        display: "uxyz".to_string(),
        name: "XYZ".to_string(),
        symbol: "XYZ".to_string(),
    };
    let authority = app.authority();
    app.execute(&authority, ExecuteMsg::RegisterCoin { metadata })
        .unwrap();
    let pair = app.token_pair("uxyz").unwrap();
    (app, pair)
}

/// App where `user` holds 100 tokens of a registered external contract
fn setup_external_token(kind: TokenKind) -> (TestApp, TokenPair, Address) {
    let mut app = TestApp::new();
    let token = app.deploy_token(&deployer(), kind, "Test Token", "TT", 18);
    app.mint_tokens(&token, &user(), 100);
    let pair = app.register_erc20(&token).unwrap();
    (app, pair, token)
}

fn convert_coin(app: &mut TestApp, from: &Address, coin: Coin, to: &Address) -> Result<(), Erc20Error> {
    app.execute(
        from,
        ExecuteMsg::ConvertCoin {
            coin,
            receiver: to_hex(to),
        },
    )
    .map(|_| ())
}

fn convert_erc20(
    app: &mut TestApp,
    from: &Address,
    contract: &Address,
    value: u128,
    to: &Address,
) -> Result<(), Erc20Error> {
    app.execute(
        from,
        ExecuteMsg::ConvertErc20 {
            contract_address: to_hex(contract),
            amount: amount(value),
            receiver: to_hex(to),
        },
    )
    .map(|_| ())
}

fn invariant(app: &TestApp) -> InvariantResponse {
    app.query(QueryMsg::EscrowInvariant {}).unwrap()
}

// ============================================================================
// Module owned pairs
// ============================================================================

#[test]
fn test_native_coin_round_trip() {
    let (mut app, pair) = setup_native_coin();
    let contract = pair.address().unwrap();
    let escrow = app.erc20_module();

    convert_coin(&mut app, &user(), Coin::new(400u128, "uxyz"), &user()).unwrap();
    assert_eq!(app.native_balance(&user(), "uxyz"), amount(600));
    assert_eq!(app.token_balance(&contract, &user()), amount(400));
    assert_eq!(app.native_balance(&escrow, "uxyz"), amount(400));
    assert_eq!(app.token_supply(&contract), amount(400));
    assert!(app.has_event("convert_coin"));
    assert!(!invariant(&app).broken);

    convert_erc20(&mut app, &user(), &contract, 400, &user()).unwrap();
    assert_eq!(app.native_balance(&user(), "uxyz"), amount(1000));
    assert_eq!(app.token_balance(&contract, &user()), Uint256::zero());
    assert_eq!(app.native_balance(&escrow, "uxyz"), Uint256::zero());
    assert_eq!(app.token_supply(&contract), Uint256::zero());
    assert!(app.has_event("convert_erc20"));

    // supply of the coin is untouched by conversions
    assert_eq!(app.supply("uxyz"), amount(1000));
}

#[test]
fn test_convert_coin_to_other_receiver() {
    let (mut app, pair) = setup_native_coin();
    let contract = pair.address().unwrap();

    app.execute(
        &user(),
        ExecuteMsg::ConvertCoin {
            coin: Coin::new(250u128, "uxyz"),
            receiver: local_address(&other()),
        },
    )
    .unwrap();
    assert_eq!(app.token_balance(&contract, &other()), amount(250));
    assert_eq!(app.token_balance(&contract, &user()), Uint256::zero());

    convert_erc20(&mut app, &other(), &contract, 50, &user()).unwrap();
    assert_eq!(app.native_balance(&user(), "uxyz"), amount(800));
    assert_eq!(app.native_balance(&other(), "uxyz"), Uint256::zero());
}

#[test]
fn test_convert_amount_boundaries() {
    let (mut app, pair) = setup_native_coin();
    let contract = pair.address().unwrap();

    let err = app
        .run(|ctx, k| {
            k.erc20
                .convert_coin(ctx, user(), user(), &Coin::new(0u128, "uxyz"))
        })
        .unwrap_err();
    assert_eq!(err, Erc20Error::InvalidAmount);
    let err = app
        .run(|ctx, k| k.erc20.convert_erc20(ctx, user(), user(), contract, Uint256::zero()))
        .unwrap_err();
    assert_eq!(err, Erc20Error::InvalidAmount);

    let err = convert_coin(&mut app, &user(), Coin::new(1001u128, "uxyz"), &user()).unwrap_err();
    assert_eq!(
        err,
        Erc20Error::InsufficientFunds {
            token: "uxyz".to_string(),
            available: amount(1000),
            required: amount(1001),
        }
    );

    convert_coin(&mut app, &user(), Coin::new(1000u128, "uxyz"), &user()).unwrap();
    assert_eq!(app.native_balance(&user(), "uxyz"), Uint256::zero());

    let err = convert_erc20(&mut app, &user(), &contract, 1001, &user()).unwrap_err();
    assert!(matches!(err, Erc20Error::InsufficientFunds { .. }));
    convert_erc20(&mut app, &user(), &contract, 1000, &user()).unwrap();
    assert_eq!(app.native_balance(&user(), "uxyz"), amount(1000));
}

#[test]
fn test_convert_unregistered_and_disabled() {
    let (mut app, _) = setup_native_coin();
    app.fund(&user(), Coin::new(10u128, "uabc"));

    let err = convert_coin(&mut app, &user(), Coin::new(10u128, "uabc"), &user()).unwrap_err();
    assert_eq!(
        err,
        Erc20Error::TokenPairNotFound {
            token: "uabc".to_string()
        }
    );

    let err = convert_erc20(&mut app, &user(), &Address::repeat_byte(0x42), 1, &user()).unwrap_err();
    assert!(matches!(err, Erc20Error::TokenPairNotFound { .. }));

    app.update_params(|p| p.enable_erc20 = false);
    let err = convert_coin(&mut app, &user(), Coin::new(10u128, "uxyz"), &user()).unwrap_err();
    assert_eq!(err, Erc20Error::Erc20Disabled);
}

#[test]
fn test_convert_erc20_rejects_blocked_receiver() {
    let (mut app, pair) = setup_native_coin();
    let contract = pair.address().unwrap();
    convert_coin(&mut app, &user(), Coin::new(100u128, "uxyz"), &user()).unwrap();

    let err = convert_erc20(&mut app, &user(), &contract, 100, &module_address("fee_collector"))
        .unwrap_err();
    assert!(matches!(
        err,
        Erc20Error::Bank(bank::BankError::BlockedAddress { .. })
    ));
    assert_eq!(app.token_balance(&contract, &user()), amount(100));
}

// ============================================================================
// Externally owned pairs
// ============================================================================

#[test]
fn test_external_token_round_trip() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard);
    let escrow = app.erc20_module();

    convert_erc20(&mut app, &user(), &token, 100, &user()).unwrap();
    assert_eq!(app.native_balance(&user(), &pair.denom), amount(100));
    assert_eq!(app.token_balance(&token, &user()), Uint256::zero());
    assert_eq!(app.token_balance(&token, &escrow), amount(100));
    assert_eq!(app.supply(&pair.denom), amount(100));
    assert!(!invariant(&app).broken);

    convert_coin(&mut app, &user(), Coin::new(30u128, pair.denom.clone()), &other()).unwrap();
    assert_eq!(app.native_balance(&user(), &pair.denom), amount(70));
    assert_eq!(app.token_balance(&token, &other()), amount(30));
    assert_eq!(app.token_balance(&token, &escrow), amount(70));
    assert_eq!(app.supply(&pair.denom), amount(70));
    assert!(!invariant(&app).broken);

    // the bank facade reports both ledgers together
    assert_eq!(app.combined_balance(&user(), &pair.denom), amount(70));
    assert_eq!(app.combined_balance(&other(), &pair.denom), amount(30));
}

#[test]
fn test_fee_on_transfer_token_is_rejected() {
    let (mut app, pair, token) = setup_external_token(TokenKind::FeeSkimming);

    let err = convert_erc20(&mut app, &user(), &token, 100, &user()).unwrap_err();
    assert_eq!(
        err,
        Erc20Error::BalanceInvariance {
            expected: amount(100),
            actual: amount(99),
        }
    );

    assert_eq!(app.token_balance(&token, &user()), amount(100));
    assert_eq!(app.token_balance(&token, &app.erc20_module()), Uint256::zero());
    assert_eq!(app.native_balance(&user(), &pair.denom), Uint256::zero());
    assert_eq!(app.supply(&pair.denom), Uint256::zero());
    assert!(!app.has_event("convert_erc20"));
}

#[test]
fn test_unexpected_approval_event_reverts_conversion() {
    let (mut app, pair, token) = setup_external_token(TokenKind::MaliciousApproval);

    let err = convert_erc20(&mut app, &user(), &token, 50, &user()).unwrap_err();
    assert_eq!(
        err,
        Erc20Error::UnexpectedApprovalEvent {
            contract: to_hex(&token)
        }
    );

    assert_eq!(app.token_balance(&token, &user()), amount(100));
    assert_eq!(app.token_balance(&token, &app.erc20_module()), Uint256::zero());
    assert_eq!(app.native_balance(&user(), &pair.denom), Uint256::zero());
    assert!(!app.has_event("convert_erc20"));
}

#[test]
fn test_escrow_invariant_detects_unbacked_tokens() {
    let (mut app, pair, token) = setup_external_token(TokenKind::Standard);
    convert_erc20(&mut app, &user(), &token, 50, &user()).unwrap();
    assert!(!invariant(&app).broken);

    // tokens sent straight to the escrow have no native counterpart
    let escrow = app.erc20_module();
    app.mint_tokens(&token, &escrow, 5);

    let res = invariant(&app);
    assert!(res.broken);
    assert_eq!(res.violations.len(), 1);
    assert!(res.violations[0].contains(&pair.denom));
}

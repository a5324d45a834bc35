//! Genesis export / import across a chain restart.

use alloy_primitives::Address;
use cosmwasm_std::Uint256;

use common::Coin;
use erc20::genesis::GenesisState;
use erc20::msg::ExecuteMsg;
use erc20::state::{Owner, Params, TokenPair};
use testing::{TestApp, TokenKind};

#[test]
fn test_export_and_reimport() {
    let mut app = TestApp::with_params(Params {
        evm_channels: vec!["channel-0".to_string()],
        ..Params::default()
    });
    let user = Address::repeat_byte(0x11);
    let token = app.deploy_token(&Address::repeat_byte(0xde), TokenKind::Standard, "Test", "TST", 6);
    app.mint_tokens(&token, &user, 50);
    let pair = app.register_erc20(&token).unwrap();
    let authority = app.authority();
    app.execute(
        &authority,
        ExecuteMsg::ToggleConversion {
            token: pair.denom.clone(),
        },
    )
    .unwrap();

    let exported = app.keepers.erc20.export_genesis(&app.store).unwrap();
    assert_eq!(exported.params.evm_channels, vec!["channel-0".to_string()]);
    assert_eq!(exported.token_pairs.len(), 1);
    assert!(!exported.token_pairs[0].enabled);

    let mut restarted = TestApp::new();
    restarted
        .run(|ctx, k| k.erc20.init_genesis(ctx, &exported))
        .unwrap();
    assert_eq!(restarted.params(), exported.params);
    assert_eq!(restarted.token_pair(&pair.denom).unwrap(), exported.token_pairs[0]);
    assert_eq!(
        restarted.token_pair(&pair.erc20_address).unwrap().id(),
        pair.id()
    );
}

#[test]
fn test_invalid_genesis_is_rejected() {
    let mut app = TestApp::new();
    app.fund(&Address::repeat_byte(0x11), Coin::new(10u128, "uxyz"));

    let duplicate = TokenPair::new(Address::repeat_byte(1), "uxyz", Owner::Module);
    let genesis = GenesisState {
        params: Params::default(),
        token_pairs: vec![
            duplicate.clone(),
            TokenPair::new(Address::repeat_byte(2), "uxyz", Owner::Module),
        ],
    };
    assert!(app.run(|ctx, k| k.erc20.init_genesis(ctx, &genesis)).is_err());
    assert!(app.token_pair("uxyz").is_none());

    let genesis = GenesisState {
        params: Params::default(),
        token_pairs: vec![duplicate],
    };
    app.run(|ctx, k| k.erc20.init_genesis(ctx, &genesis)).unwrap();
    assert_eq!(app.supply("uxyz"), Uint256::from(10u128));
    assert!(app.token_pair("uxyz").is_some());
}

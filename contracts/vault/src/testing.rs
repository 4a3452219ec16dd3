use std::{collections::HashMap, str::FromStr};

use cosmwasm_std::{
    from_json,
    testing::{mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage},
    Addr, BankMsg, Coin, CosmosMsg, Env, Int128, MessageInfo, OwnedDeps, Response, Uint128,
    WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use crate::{
    contract::{execute, instantiate, query, DEFAULT_TOKEN_DECIMALS, NATIVE_TOKEN_DECIMALS},
    error::ContractError,
    msg::{ExecuteMsg, InstantiateMsg},
    query::{AssetConfigResponse, ConfigResponse, QueryMsg, VaultStatsResponse, WhitelistResponse},
    state::{get_balance, NATIVE_ASSET_ID, TOTAL_DEPOSITED_USD},
    testing_mocks::{
        setup_failing_price_feed_mock, setup_failing_token_info_mock, setup_price_feed_mock,
        setup_token_info_mock, update_contract_mock, MockWasmQuerier,
    },
};

const NATIVE_DENOM: &str = "untrn";
const CREATOR: &str = "creator";
const WHITELIST_ADDR: &str = "whitelist1";
const NATIVE_FEED: &str = "native_price_feed";
const TOKEN: &str = "token0000";
const TOKEN_FEED: &str = "token_price_feed";
const USER1: &str = "user1";
const USER2: &str = "user2";

// 1M USD in the canonical 6-decimal unit
const DEFAULT_CAP_USD: Uint128 = Uint128::new(1_000_000_000000);
const NATIVE_WITHDRAW_LIMIT: Uint128 = Uint128::new(100_000_000000);
const TOKEN_WITHDRAW_LIMIT: Uint128 = Uint128::new(500_000000000000000000);

const PRICE_FEED_DECIMALS: u8 = 8;
// 0.50 USD at 8 decimals
const NATIVE_PRICE: Int128 = Int128::new(50000000);
// 2000.00 USD at 8 decimals
const TOKEN_PRICE: Int128 = Int128::new(200000000000);
const TOKEN_DECIMALS: u8 = 18;

type MockDeps = OwnedDeps<MockStorage, MockApi, MockQuerier>;

struct TestAddresses {
    whitelist: Addr,
    native_feed: Addr,
    token: Addr,
    token_feed: Addr,
}

pub fn get_message_info(api: &MockApi, sender: &str, funds: &[Coin]) -> MessageInfo {
    MessageInfo {
        sender: api.addr_make(sender),
        funds: funds.to_vec(),
    }
}

fn get_default_instantiate_msg(whitelist_addr: &Addr, native_price_feed: &Addr) -> InstantiateMsg {
    InstantiateMsg {
        deposit_cap_usd: DEFAULT_CAP_USD,
        native_denom: NATIVE_DENOM.to_string(),
        native_price_feed: native_price_feed.to_string(),
        native_withdraw_limit: NATIVE_WITHDRAW_LIMIT,
        whitelist: vec![whitelist_addr.to_string()],
    }
}

// Instantiates the vault with the default cap and sets up price feed mocks
// for the native token and one CW20 token.
fn setup_vault(deposit_cap_usd: Uint128) -> (MockDeps, Env, MockWasmQuerier, TestAddresses) {
    let (mut deps, env) = (mock_dependencies(), mock_env());

    let addresses = TestAddresses {
        whitelist: deps.api.addr_make(WHITELIST_ADDR),
        native_feed: deps.api.addr_make(NATIVE_FEED),
        token: deps.api.addr_make(TOKEN),
        token_feed: deps.api.addr_make(TOKEN_FEED),
    };

    let mut instantiate_msg =
        get_default_instantiate_msg(&addresses.whitelist, &addresses.native_feed);
    instantiate_msg.deposit_cap_usd = deposit_cap_usd;

    let info = get_message_info(&deps.api, CREATOR, &[]);
    instantiate(deps.as_mut(), env.clone(), info, instantiate_msg).unwrap();

    let wasm_querier = MockWasmQuerier::new(HashMap::from_iter([
        setup_price_feed_mock(
            addresses.native_feed.clone(),
            NATIVE_PRICE,
            PRICE_FEED_DECIMALS,
        ),
        setup_price_feed_mock(
            addresses.token_feed.clone(),
            TOKEN_PRICE,
            PRICE_FEED_DECIMALS,
        ),
    ]));

    let querier_for_deps = wasm_querier.clone();
    deps.querier
        .update_wasm(move |q| querier_for_deps.handler(q));

    (deps, env, wasm_querier, addresses)
}

fn configure_default_token(deps: &mut MockDeps, env: &Env, addresses: &TestAddresses) {
    let info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);
    execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();
}

fn get_attribute(response: &Response, key: &str) -> String {
    response
        .attributes
        .iter()
        .find(|attribute| attribute.key == key)
        .unwrap_or_else(|| panic!("attribute {key} not found in the response"))
        .value
        .clone()
}

fn query_balance_of(deps: &MockDeps, env: &Env, address: &Addr, asset: &str) -> Uint128 {
    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::Balance {
            address: address.to_string(),
            asset: asset.to_string(),
        },
    )
    .unwrap();

    from_json(&res).unwrap()
}

fn query_vault_stats(deps: &MockDeps, env: &Env) -> VaultStatsResponse {
    let res = query(deps.as_ref(), env.clone(), QueryMsg::VaultStats {}).unwrap();

    from_json(&res).unwrap()
}

#[test]
fn instantiate_test() {
    let (deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);

    let res = query(deps.as_ref(), env.clone(), QueryMsg::Config {}).unwrap();
    let config_response: ConfigResponse = from_json(&res).unwrap();
    assert_eq!(config_response.config.native_denom, NATIVE_DENOM);
    assert_eq!(config_response.config.deposit_cap_usd, DEFAULT_CAP_USD);

    // The native asset entry must be created under the reserved identifier
    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::AssetConfig {
            asset: NATIVE_ASSET_ID.to_string(),
        },
    )
    .unwrap();
    let asset_config_response: AssetConfigResponse = from_json(&res).unwrap();
    let native_config = asset_config_response.asset_config;
    assert!(native_config.supported);
    assert!(native_config.is_native);
    assert_eq!(native_config.decimals, NATIVE_TOKEN_DECIMALS);
    assert_eq!(native_config.withdraw_limit, NATIVE_WITHDRAW_LIMIT);
    assert_eq!(native_config.price_feed, Some(addresses.native_feed));

    // Both the instantiating address and the provided one must be whitelisted
    let res = query(deps.as_ref(), env.clone(), QueryMsg::Whitelist {}).unwrap();
    let whitelist_response: WhitelistResponse = from_json(&res).unwrap();
    assert_eq!(whitelist_response.whitelist.len(), 2);
    assert!(whitelist_response
        .whitelist
        .contains(&deps.api.addr_make(CREATOR)));
    assert!(whitelist_response.whitelist.contains(&addresses.whitelist));

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, Uint128::zero());
    assert_eq!(stats.deposit_cap_usd, DEFAULT_CAP_USD);
    assert_eq!(stats.deposit_count, 0);
    assert_eq!(stats.withdraw_count, 0);
}

#[test]
fn instantiate_validation_test() {
    let (mut deps, env) = (mock_dependencies(), mock_env());

    let whitelist_addr = deps.api.addr_make(WHITELIST_ADDR);
    let native_feed_addr = deps.api.addr_make(NATIVE_FEED);
    let info = get_message_info(&deps.api, CREATOR, &[]);

    let mut instantiate_msg = get_default_instantiate_msg(&whitelist_addr, &native_feed_addr);
    instantiate_msg.deposit_cap_usd = Uint128::zero();

    let res = instantiate(deps.as_mut(), env.clone(), info.clone(), instantiate_msg);
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("deposit cap must be greater than zero"));

    let mut instantiate_msg = get_default_instantiate_msg(&whitelist_addr, &native_feed_addr);
    instantiate_msg.native_denom = String::new();

    let res = instantiate(deps.as_mut(), env.clone(), info, instantiate_msg);
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("native denom must be provided"));
}

#[test]
fn deposit_native_test() {
    let (mut deps, env, _, _) = setup_vault(DEFAULT_CAP_USD);

    let user1_addr = deps.api.addr_make(USER1);

    // 10 native tokens at 0.50 USD each
    let deposit_amount = Uint128::new(10_000000);
    let expected_usd_value = Uint128::new(5_000000);

    let info = get_message_info(
        &deps.api,
        USER1,
        &[Coin {
            denom: NATIVE_DENOM.to_string(),
            amount: deposit_amount,
        }],
    );
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositNative {},
    )
    .unwrap();

    // Native deposits carry the funds with the message, so no transfer
    // message is emitted
    assert!(res.messages.is_empty());
    assert_eq!(get_attribute(&res, "action"), "deposit");
    assert_eq!(get_attribute(&res, "asset"), NATIVE_ASSET_ID);
    assert_eq!(get_attribute(&res, "amount"), deposit_amount.to_string());
    assert_eq!(
        get_attribute(&res, "new_balance"),
        deposit_amount.to_string()
    );
    assert_eq!(
        get_attribute(&res, "usd_value"),
        expected_usd_value.to_string()
    );

    assert_eq!(
        query_balance_of(&deps, &env, &user1_addr, NATIVE_ASSET_ID),
        deposit_amount
    );

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, expected_usd_value);
    assert_eq!(stats.deposit_count, 1);
    assert_eq!(stats.withdraw_count, 0);

    // The USD-valued balance query must agree with the deposit valuation
    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::UsdValue {
            address: user1_addr.to_string(),
            asset: NATIVE_ASSET_ID.to_string(),
        },
    )
    .unwrap();
    let usd_value: Uint128 = from_json(&res).unwrap();
    assert_eq!(usd_value, expected_usd_value);
}

#[test]
fn deposit_native_payment_validation_test() {
    let (mut deps, env, _, _) = setup_vault(DEFAULT_CAP_USD);

    // No funds attached
    let info = get_message_info(&deps.api, USER1, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositNative {},
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::PaymentError(_)
    ));

    // Wrong denom attached
    let info = get_message_info(
        &deps.api,
        USER1,
        &[Coin {
            denom: "uatom".to_string(),
            amount: Uint128::new(1000),
        }],
    );
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositNative {},
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::PaymentError(_)
    ));
}

#[test]
fn deposit_token_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);
    configure_default_token(&mut deps, &env, &addresses);

    let user1_addr = deps.api.addr_make(USER1);

    // 1 token with 18 decimals at 2000.00 USD
    let deposit_amount = Uint128::new(1_000000000000000000);
    let expected_usd_value = Uint128::new(2000_000000);

    let info = get_message_info(&deps.api, USER1, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: deposit_amount,
        },
    )
    .unwrap();

    // The bookkeeping is recorded in storage before the pull message is
    // handed to the runtime, so a reentering call could never observe an
    // inconsistent ledger.
    assert_eq!(
        get_balance(&deps.storage, addresses.token.as_str(), user1_addr.clone()).unwrap(),
        deposit_amount
    );
    assert_eq!(
        TOTAL_DEPOSITED_USD.load(&deps.storage).unwrap(),
        expected_usd_value
    );

    assert_eq!(res.messages.len(), 1);
    match &res.messages[0].msg {
        CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr,
            msg,
            funds,
        }) => {
            assert_eq!(contract_addr, &addresses.token.to_string());
            assert!(funds.is_empty());
            match from_json(msg).unwrap() {
                Cw20ExecuteMsg::TransferFrom {
                    owner,
                    recipient,
                    amount,
                } => {
                    assert_eq!(owner, user1_addr.to_string());
                    assert_eq!(recipient, env.contract.address.to_string());
                    assert_eq!(amount, deposit_amount);
                }
                _ => panic!("Unexpected CW20 message type!"),
            }
        }
        _ => panic!("Expected WasmMsg::Execute"),
    }

    assert_eq!(
        get_attribute(&res, "usd_value"),
        expected_usd_value.to_string()
    );

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, expected_usd_value);
    assert_eq!(stats.deposit_count, 1);
}

#[test]
fn deposit_token_validation_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);
    configure_default_token(&mut deps, &env, &addresses);

    let info = get_message_info(&deps.api, USER1, &[]);

    // Zero amount
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::zero(),
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::ZeroAmount));

    // Unregistered token
    let unknown_token = deps.api.addr_make("unknown_token");
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: unknown_token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::AssetNotSupported { .. }
    ));

    // Registered token with the support flag turned off
    let whitelist_info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);
    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info,
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: false,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::AssetNotSupported { .. }
    ));
}

#[test]
fn deposit_cap_test() {
    // Cap of 7 USD allows one 5 USD deposit but not two
    let (mut deps, env, _, _) = setup_vault(Uint128::new(7_000000));

    let user1_addr = deps.api.addr_make(USER1);

    let deposit_amount = Uint128::new(10_000000);
    let expected_usd_value = Uint128::new(5_000000);

    let info = get_message_info(
        &deps.api,
        USER1,
        &[Coin {
            denom: NATIVE_DENOM.to_string(),
            amount: deposit_amount,
        }],
    );
    execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositNative {},
    )
    .unwrap();

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositNative {},
    );
    match res.unwrap_err() {
        ContractError::DepositCapExceeded { attempted, cap } => {
            assert_eq!(attempted, Uint128::new(10_000000));
            assert_eq!(cap, Uint128::new(7_000000));
        }
        _ => panic!("Expected DepositCapExceeded error"),
    }

    // The failed deposit must leave every piece of state untouched
    assert_eq!(
        query_balance_of(&deps, &env, &user1_addr, NATIVE_ASSET_ID),
        deposit_amount
    );

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, expected_usd_value);
    assert_eq!(stats.deposit_count, 1);
    assert_eq!(stats.withdraw_count, 0);
}

#[test]
fn deposit_accumulates_valuations_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);
    configure_default_token(&mut deps, &env, &addresses);

    // Two native deposits and one token deposit; the accumulated total must
    // equal the sum of the individual deposit-time valuations
    let mut expected_total = Uint128::zero();

    for amount in [Uint128::new(10_000000), Uint128::new(3_000000)] {
        let info = get_message_info(
            &deps.api,
            USER1,
            &[Coin {
                denom: NATIVE_DENOM.to_string(),
                amount,
            }],
        );
        let res = execute(
            deps.as_mut(),
            env.clone(),
            info,
            ExecuteMsg::DepositNative {},
        )
        .unwrap();

        expected_total += Uint128::from_str(&get_attribute(&res, "usd_value")).unwrap();
    }

    let info = get_message_info(&deps.api, USER2, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(2_000000000000000000),
        },
    )
    .unwrap();
    expected_total += Uint128::from_str(&get_attribute(&res, "usd_value")).unwrap();

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, expected_total);
    assert_eq!(stats.deposit_count, 3);
    assert!(stats.total_deposited_usd <= stats.deposit_cap_usd);
}

#[test]
fn oracle_failure_test() {
    let (mut deps, env, wasm_querier, addresses) = setup_vault(DEFAULT_CAP_USD);

    // Token registered without a price feed cannot be valued
    let whitelist_info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);
    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: None,
        },
    )
    .unwrap();

    let info = get_message_info(&deps.api, USER1, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::PriceFeedNotSet { .. }
    ));

    // Re-register the token with a feed and make the feed report zero
    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info,
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();

    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_price_feed_mock(
            addresses.token_feed.clone(),
            Int128::zero(),
            PRICE_FEED_DECIMALS,
        ),
    );

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::NonPositivePrice { .. }
    ));

    // Negative readings are rejected the same way
    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_price_feed_mock(
            addresses.token_feed.clone(),
            Int128::new(-200000000000),
            PRICE_FEED_DECIMALS,
        ),
    );

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    match res.unwrap_err() {
        ContractError::NonPositivePrice { asset, price } => {
            assert_eq!(asset, addresses.token.to_string());
            assert_eq!(price, Int128::new(-200000000000));
        }
        _ => panic!("Expected NonPositivePrice error"),
    }

    // A feed that fails the query altogether propagates as a generic error
    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_failing_price_feed_mock(addresses.token_feed.clone()),
    );

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::Std(_)));

    // None of the failed attempts may have touched the ledger
    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, Uint128::zero());
    assert_eq!(stats.deposit_count, 0);
}

#[test]
fn withdraw_native_test() {
    let (mut deps, env, wasm_querier, addresses) = setup_vault(DEFAULT_CAP_USD);

    let user1_addr = deps.api.addr_make(USER1);

    let deposit_amount = Uint128::new(10_000000);
    let deposit_usd_value = Uint128::new(5_000000);

    let info = get_message_info(
        &deps.api,
        USER1,
        &[Coin {
            denom: NATIVE_DENOM.to_string(),
            amount: deposit_amount,
        }],
    );
    execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::DepositNative {},
    )
    .unwrap();

    // Withdraw 4 native tokens at the deposit-time price of 0.50 USD
    let withdraw_amount = Uint128::new(4_000000);

    let info = get_message_info(&deps.api, USER1, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::WithdrawNative {
            amount: withdraw_amount,
        },
    )
    .unwrap();

    assert_eq!(res.messages.len(), 1);
    match &res.messages[0].msg {
        CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
            assert_eq!(to_address, &user1_addr.to_string());
            assert_eq!(amount.len(), 1);
            assert_eq!(amount[0].denom, NATIVE_DENOM);
            assert_eq!(amount[0].amount, withdraw_amount);
        }
        _ => panic!("Expected BankMsg::Send"),
    }

    assert_eq!(get_attribute(&res, "usd_value"), "2000000");
    assert_eq!(
        query_balance_of(&deps, &env, &user1_addr, NATIVE_ASSET_ID),
        Uint128::new(6_000000)
    );

    // The price doubles; the next withdrawal must be valued at the new price
    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_price_feed_mock(
            addresses.native_feed.clone(),
            Int128::new(100000000),
            PRICE_FEED_DECIMALS,
        ),
    );

    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::WithdrawNative {
            amount: Uint128::new(1_000000),
        },
    )
    .unwrap();
    assert_eq!(get_attribute(&res, "usd_value"), "1000000");

    // Withdrawals never reduce the accumulated deposit total
    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.total_deposited_usd, deposit_usd_value);
    assert_eq!(stats.deposit_count, 1);
    assert_eq!(stats.withdraw_count, 2);
}

#[test]
fn withdraw_token_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);
    configure_default_token(&mut deps, &env, &addresses);

    let user1_addr = deps.api.addr_make(USER1);

    let deposit_amount = Uint128::new(1_000000000000000000);

    let info = get_message_info(&deps.api, USER1, &[]);
    execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: deposit_amount,
        },
    )
    .unwrap();

    let withdraw_amount = Uint128::new(250000000000000000);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info,
        ExecuteMsg::WithdrawToken {
            token: addresses.token.to_string(),
            amount: withdraw_amount,
        },
    )
    .unwrap();

    assert_eq!(res.messages.len(), 1);
    match &res.messages[0].msg {
        CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr, msg, ..
        }) => {
            assert_eq!(contract_addr, &addresses.token.to_string());
            match from_json(msg).unwrap() {
                Cw20ExecuteMsg::Transfer { recipient, amount } => {
                    assert_eq!(recipient, user1_addr.to_string());
                    assert_eq!(amount, withdraw_amount);
                }
                _ => panic!("Unexpected CW20 message type!"),
            }
        }
        _ => panic!("Expected WasmMsg::Execute"),
    }

    // 0.25 tokens at 2000.00 USD
    assert_eq!(get_attribute(&res, "usd_value"), "500000000");
    assert_eq!(
        query_balance_of(&deps, &env, &user1_addr, addresses.token.as_str()),
        Uint128::new(750000000000000000)
    );

    let stats = query_vault_stats(&deps, &env);
    assert_eq!(stats.withdraw_count, 1);
}

#[test]
fn withdraw_validation_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);
    configure_default_token(&mut deps, &env, &addresses);

    let user1_addr = deps.api.addr_make(USER1);

    let deposit_amount = Uint128::new(600_000000000000000000);

    let info = get_message_info(&deps.api, USER1, &[]);
    execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::DepositToken {
            token: addresses.token.to_string(),
            amount: deposit_amount,
        },
    )
    .unwrap();

    // Zero amount
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::WithdrawToken {
            token: addresses.token.to_string(),
            amount: Uint128::zero(),
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::ZeroAmount));

    // Over the per-withdrawal limit, even though the balance would suffice
    let res = execute(
        deps.as_mut(),
        env.clone(),
        info.clone(),
        ExecuteMsg::WithdrawToken {
            token: addresses.token.to_string(),
            amount: TOKEN_WITHDRAW_LIMIT + Uint128::one(),
        },
    );
    match res.unwrap_err() {
        ContractError::WithdrawLimitExceeded { amount, limit } => {
            assert_eq!(amount, TOKEN_WITHDRAW_LIMIT + Uint128::one());
            assert_eq!(limit, TOKEN_WITHDRAW_LIMIT);
        }
        _ => panic!("Expected WithdrawLimitExceeded error"),
    }

    // Within the limit but over the balance of an account that never deposited
    let user2_info = get_message_info(&deps.api, USER2, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        user2_info,
        ExecuteMsg::WithdrawToken {
            token: addresses.token.to_string(),
            amount: Uint128::new(1000),
        },
    );
    match res.unwrap_err() {
        ContractError::InsufficientBalance {
            available,
            required,
        } => {
            assert_eq!(available, Uint128::zero());
            assert_eq!(required, Uint128::new(1000));
        }
        _ => panic!("Expected InsufficientBalance error"),
    }

    // The failed withdrawals must not have touched the ledger
    assert_eq!(
        query_balance_of(&deps, &env, &user1_addr, addresses.token.as_str()),
        deposit_amount
    );
    assert_eq!(query_vault_stats(&deps, &env).withdraw_count, 0);
}

#[test]
fn configure_asset_test() {
    let (mut deps, env, wasm_querier, addresses) = setup_vault(DEFAULT_CAP_USD);

    // Non-whitelisted sender is rejected
    let user1_info = get_message_info(&deps.api, USER1, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        user1_info,
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::Unauthorized));

    // The native asset entry cannot be touched through the registry
    let whitelist_info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::ConfigureAsset {
            token: NATIVE_ASSET_ID.to_string(),
            supported: true,
            decimals: NATIVE_TOKEN_DECIMALS,
            withdraw_limit: NATIVE_WITHDRAW_LIMIT,
            price_feed: None,
        },
    );
    assert!(matches!(
        res.unwrap_err(),
        ContractError::NativeAssetReserved
    ));

    // Configure and read back the exact stored fields
    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();

    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::AssetConfig {
            asset: addresses.token.to_string(),
        },
    )
    .unwrap();
    let asset_config_response: AssetConfigResponse = from_json(&res).unwrap();
    let asset_config = asset_config_response.asset_config;
    assert!(asset_config.supported);
    assert!(!asset_config.is_native);
    assert_eq!(asset_config.decimals, TOKEN_DECIMALS);
    assert_eq!(asset_config.withdraw_limit, TOKEN_WITHDRAW_LIMIT);
    assert_eq!(asset_config.price_feed, Some(addresses.token_feed.clone()));

    // Zero decimals with a token that exposes its metadata: use the declared
    // precision
    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_token_info_mock(addresses.token.clone(), 8),
    );

    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: 0,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();

    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::AssetConfig {
            asset: addresses.token.to_string(),
        },
    )
    .unwrap();
    let asset_config_response: AssetConfigResponse = from_json(&res).unwrap();
    assert_eq!(asset_config_response.asset_config.decimals, 8);

    // Zero decimals with a token that doesn't expose its metadata: fall back
    // to the 18-decimal default
    update_contract_mock(
        &mut deps,
        &wasm_querier,
        setup_failing_token_info_mock(addresses.token.clone()),
    );

    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info,
        ExecuteMsg::ConfigureAsset {
            token: addresses.token.to_string(),
            supported: true,
            decimals: 0,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: Some(addresses.token_feed.to_string()),
        },
    )
    .unwrap();

    let res = query(
        deps.as_ref(),
        env.clone(),
        QueryMsg::AssetConfig {
            asset: addresses.token.to_string(),
        },
    )
    .unwrap();
    let asset_config_response: AssetConfigResponse = from_json(&res).unwrap();
    assert_eq!(
        asset_config_response.asset_config.decimals,
        DEFAULT_TOKEN_DECIMALS
    );
}

#[test]
fn whitelist_management_test() {
    let (mut deps, env, _, _) = setup_vault(DEFAULT_CAP_USD);

    let user1_addr = deps.api.addr_make(USER1);
    let whitelist_info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);
    let user1_info = get_message_info(&deps.api, USER1, &[]);

    // Non-whitelisted sender cannot manage the whitelist
    let res = execute(
        deps.as_mut(),
        env.clone(),
        user1_info.clone(),
        ExecuteMsg::AddToWhitelist {
            address: user1_addr.to_string(),
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::Unauthorized));

    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::AddToWhitelist {
            address: user1_addr.to_string(),
        },
    )
    .unwrap();

    // Adding the same address twice is an error
    let res = execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::AddToWhitelist {
            address: user1_addr.to_string(),
        },
    );
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("already in the whitelist"));

    // The newly whitelisted address can execute permissioned actions now
    let token_addr = deps.api.addr_make(TOKEN);
    let res = execute(
        deps.as_mut(),
        env.clone(),
        user1_info.clone(),
        ExecuteMsg::ConfigureAsset {
            token: token_addr.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: None,
        },
    );
    assert!(res.is_ok());

    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::RemoveFromWhitelist {
            address: user1_addr.to_string(),
        },
    )
    .unwrap();

    // Removing an address that is not whitelisted is an error
    let res = execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info,
        ExecuteMsg::RemoveFromWhitelist {
            address: user1_addr.to_string(),
        },
    );
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("is not in the whitelist"));

    // The removed address has lost its permissions
    let res = execute(
        deps.as_mut(),
        env.clone(),
        user1_info,
        ExecuteMsg::ConfigureAsset {
            token: token_addr.to_string(),
            supported: true,
            decimals: TOKEN_DECIMALS,
            withdraw_limit: TOKEN_WITHDRAW_LIMIT,
            price_feed: None,
        },
    );
    assert!(matches!(res.unwrap_err(), ContractError::Unauthorized));
}

#[test]
fn cannot_remove_last_whitelist_address_test() {
    let (mut deps, env, _, addresses) = setup_vault(DEFAULT_CAP_USD);

    let creator_addr = deps.api.addr_make(CREATOR);
    let whitelist_info = get_message_info(&deps.api, WHITELIST_ADDR, &[]);

    execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info.clone(),
        ExecuteMsg::RemoveFromWhitelist {
            address: creator_addr.to_string(),
        },
    )
    .unwrap();

    let res = execute(
        deps.as_mut(),
        env.clone(),
        whitelist_info,
        ExecuteMsg::RemoveFromWhitelist {
            address: addresses.whitelist.to_string(),
        },
    );
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("cannot remove last outstanding whitelisted address"));
}

use cosmwasm_std::{
    from_json,
    testing::{mock_dependencies, mock_env, MockApi},
    Coin, Int128, MessageInfo,
};
use price_feed_interface::PriceResponse;

use crate::{
    contract::{execute, instantiate, query},
    msg::{ExecuteMsg, InstantiateMsg},
    query::{ConfigResponse, QueryMsg},
};

const OWNER_ADDRESS: &str = "owner";
const USER_ADDRESS: &str = "addr0000";

pub fn get_message_info(api: &MockApi, sender: &str, funds: &[Coin]) -> MessageInfo {
    MessageInfo {
        sender: api.addr_make(sender),
        funds: funds.to_vec(),
    }
}

#[test]
fn instantiate_and_set_price_test() {
    let (mut deps, env) = (mock_dependencies(), mock_env());

    let owner_info = get_message_info(&deps.api, OWNER_ADDRESS, &[]);
    let user_info = get_message_info(&deps.api, USER_ADDRESS, &[]);

    let init_msg = InstantiateMsg {
        decimals: 8,
        initial_price: None,
    };

    let res = instantiate(deps.as_mut(), env.clone(), owner_info.clone(), init_msg);
    assert!(res.is_ok());

    let res = query(deps.as_ref(), env.clone(), QueryMsg::Config {}).unwrap();
    let config_response: ConfigResponse = from_json(&res).unwrap();
    assert_eq!(config_response.config.owner, owner_info.sender);
    assert_eq!(config_response.config.decimals, 8);

    // No price was provided at instantiation, so the query must fail
    let res = query(deps.as_ref(), env.clone(), QueryMsg::LatestPrice {});
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("no price has been set"));

    // Non-owner is not allowed to push price updates
    let msg = ExecuteMsg::SetPrice {
        price: Int128::new(2000_00000000),
    };
    let res = execute(deps.as_mut(), env.clone(), user_info.clone(), msg.clone());
    assert!(res
        .unwrap_err()
        .to_string()
        .to_lowercase()
        .contains("unauthorized"));

    let res = execute(deps.as_mut(), env.clone(), owner_info.clone(), msg);
    assert!(res.is_ok());

    let res = query(deps.as_ref(), env.clone(), QueryMsg::LatestPrice {}).unwrap();
    let price_response: PriceResponse = from_json(&res).unwrap();
    assert_eq!(price_response.price, Int128::new(2000_00000000));
    assert_eq!(price_response.decimals, 8);
    assert_eq!(price_response.updated_at, env.block.time);

    // Negative readings are stored as reported
    let msg = ExecuteMsg::SetPrice {
        price: Int128::new(-1),
    };
    let res = execute(deps.as_mut(), env.clone(), owner_info.clone(), msg);
    assert!(res.is_ok());

    let res = query(deps.as_ref(), env.clone(), QueryMsg::LatestPrice {}).unwrap();
    let price_response: PriceResponse = from_json(&res).unwrap();
    assert_eq!(price_response.price, Int128::new(-1));
}

#[test]
fn initial_price_test() {
    let (mut deps, env) = (mock_dependencies(), mock_env());

    let owner_info = get_message_info(&deps.api, OWNER_ADDRESS, &[]);

    let init_msg = InstantiateMsg {
        decimals: 6,
        initial_price: Some(Int128::new(1_000000)),
    };

    let res = instantiate(deps.as_mut(), env.clone(), owner_info, init_msg);
    assert!(res.is_ok());

    let res = query(deps.as_ref(), env.clone(), QueryMsg::LatestPrice {}).unwrap();
    let price_response: PriceResponse = from_json(&res).unwrap();
    assert_eq!(price_response.price, Int128::new(1_000000));
    assert_eq!(price_response.decimals, 6);
    assert_eq!(price_response.updated_at, env.block.time);
}

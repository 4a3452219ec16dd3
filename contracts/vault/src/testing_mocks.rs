use std::{cell::RefCell, collections::HashMap, rc::Rc};

use cosmwasm_std::{
    from_json,
    testing::{MockApi, MockQuerier, MockStorage},
    to_json_binary, Addr, ContractResult, Int128, OwnedDeps, QuerierResult, SystemError,
    SystemResult, Timestamp, Uint128, WasmQuery,
};
use cw20::{Cw20QueryMsg, TokenInfoResponse};
use price_feed_interface::{PriceFeedQueryMsg, PriceResponse};

pub type WasmQueryFunc = Box<dyn Fn(&WasmQuery) -> QuerierResult>;

#[derive(Clone)]
pub struct MockWasmQuerier {
    contract_mocks: Rc<RefCell<HashMap<String, WasmQueryFunc>>>,
}

impl MockWasmQuerier {
    pub fn new(contract_mocks: HashMap<String, WasmQueryFunc>) -> Self {
        Self {
            contract_mocks: Rc::new(RefCell::new(contract_mocks)),
        }
    }

    pub fn insert_mock(&self, mock: (String, WasmQueryFunc)) {
        self.contract_mocks.borrow_mut().insert(mock.0, mock.1);
    }

    pub fn handler(&self, query: &WasmQuery) -> QuerierResult {
        let contract_addr = match query {
            WasmQuery::Smart {
                contract_addr,
                msg: _,
            } => contract_addr.clone(),
            WasmQuery::Raw {
                contract_addr,
                key: _,
            } => contract_addr.clone(),
            WasmQuery::ContractInfo { contract_addr } => contract_addr.clone(),
            _ => panic!("unsupported query type"),
        };

        let contract_mocks = self.contract_mocks.borrow();
        let handler = contract_mocks
            .get(&contract_addr)
            .expect("no mock handler for the provided contract address");

        (handler)(query)
    }
}

pub fn update_contract_mock(
    deps: &mut OwnedDeps<MockStorage, MockApi, MockQuerier>,
    wasm_querier: &MockWasmQuerier,
    mock: (String, WasmQueryFunc),
) {
    // Cloning allows us to have a single instance of the `contract_mocks` referenced by multiple MockWasmQueriers.
    // Since `contract_mocks` is Rc struct, this way we can update only those mocks that we need to change, without
    // needing to re-instantiate the ones that didn't change.
    let querier_for_deps = wasm_querier.clone();
    querier_for_deps.insert_mock(mock);
    deps.querier
        .update_wasm(move |q| querier_for_deps.handler(q));
}

pub fn setup_price_feed_mock(
    contract: Addr,
    price: Int128,
    price_decimals: u8,
) -> (String, WasmQueryFunc) {
    let contract_addr = contract.to_string();

    let response = Box::new(move |query: &WasmQuery| match query {
        WasmQuery::Smart { contract_addr, msg } => {
            if contract_addr != &contract.to_string() {
                return SystemResult::Err(SystemError::UnsupportedRequest {
                    kind: "unexpected contract address in price feed mock".to_string(),
                });
            }

            let response = match from_json(msg).unwrap() {
                PriceFeedQueryMsg::LatestPrice {} => to_json_binary(&PriceResponse {
                    price,
                    decimals: price_decimals,
                    updated_at: Timestamp::from_seconds(0),
                }),
            };

            SystemResult::Ok(ContractResult::Ok(response.unwrap()))
        }
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "only smart queries are supported in price feed mock".to_string(),
        }),
    });

    (contract_addr, response)
}

pub fn setup_failing_price_feed_mock(contract: Addr) -> (String, WasmQueryFunc) {
    let contract_addr = contract.to_string();

    let response = Box::new(move |query: &WasmQuery| match query {
        WasmQuery::Smart {
            contract_addr: _,
            msg,
        } => SystemResult::Err(SystemError::InvalidRequest {
            error: "mock price feed query failure".to_string(),
            request: msg.clone(),
        }),
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "only smart queries are supported in price feed mock".to_string(),
        }),
    });

    (contract_addr, response)
}

pub fn setup_token_info_mock(contract: Addr, decimals: u8) -> (String, WasmQueryFunc) {
    let contract_addr = contract.to_string();

    let response = Box::new(move |query: &WasmQuery| match query {
        WasmQuery::Smart { contract_addr, msg } => {
            if contract_addr != &contract.to_string() {
                return SystemResult::Err(SystemError::UnsupportedRequest {
                    kind: "unexpected contract address in token info mock".to_string(),
                });
            }

            let response = match from_json(msg).unwrap() {
                Cw20QueryMsg::TokenInfo {} => to_json_binary(&TokenInfoResponse {
                    name: "Mock Token".to_string(),
                    symbol: "MOCK".to_string(),
                    decimals,
                    total_supply: Uint128::new(1_000_000_000),
                }),
                _ => {
                    return SystemResult::Err(SystemError::UnsupportedRequest {
                        kind: "unsupported query type in token info mock".to_string(),
                    });
                }
            };

            SystemResult::Ok(ContractResult::Ok(response.unwrap()))
        }
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "only smart queries are supported in token info mock".to_string(),
        }),
    });

    (contract_addr, response)
}

pub fn setup_failing_token_info_mock(contract: Addr) -> (String, WasmQueryFunc) {
    let contract_addr = contract.to_string();

    let response = Box::new(move |query: &WasmQuery| match query {
        WasmQuery::Smart {
            contract_addr: _,
            msg,
        } => SystemResult::Err(SystemError::InvalidRequest {
            error: "mock token info query failure".to_string(),
            request: msg.clone(),
        }),
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "only smart queries are supported in token info mock".to_string(),
        }),
    });

    (contract_addr, response)
}

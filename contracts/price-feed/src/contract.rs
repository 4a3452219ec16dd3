use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, Int128, MessageInfo, Response,
    StdError, StdResult,
};
use cw2::set_contract_version;
use price_feed_interface::PriceResponse;

use crate::error::ContractError;
use crate::msg::{ExecuteMsg, InstantiateMsg};
use crate::query::{ConfigResponse, QueryMsg};
use crate::state::{Config, PriceInfo, CONFIG, PRICE_INFO};

/// Contract name that is used for migration.
pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
/// Contract version that is used for migration.
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: info.sender.clone(),
        decimals: msg.decimals,
    };

    CONFIG.save(deps.storage, &config)?;

    if let Some(price) = msg.initial_price {
        PRICE_INFO.save(
            deps.storage,
            &PriceInfo {
                price,
                updated_at: env.block.time,
            },
        )?;
    }

    Ok(Response::new()
        .add_attribute("action", "initialisation")
        .add_attribute("sender", info.sender)
        .add_attribute("decimals", msg.decimals.to_string())
        .add_attribute(
            "initial_price",
            msg.initial_price
                .map(|price| price.to_string())
                .unwrap_or_default(),
        ))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SetPrice { price } => set_price(deps, env, info, price),
    }
}

// Records a new price reading. The price is stored as reported, including
// zero or negative readings; it is up to the consumers to reject those.
fn set_price(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    price: Int128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    PRICE_INFO.save(
        deps.storage,
        &PriceInfo {
            price,
            updated_at: env.block.time,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "set_price")
        .add_attribute("sender", info.sender)
        .add_attribute("price", price.to_string())
        .add_attribute("updated_at", env.block.time.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::LatestPrice {} => to_json_binary(&query_latest_price(deps)?),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    Ok(ConfigResponse {
        config: CONFIG.load(deps.storage)?,
    })
}

fn query_latest_price(deps: Deps) -> StdResult<PriceResponse> {
    let config = CONFIG.load(deps.storage)?;
    let price_info = PRICE_INFO
        .may_load(deps.storage)?
        .ok_or_else(|| StdError::generic_err("no price has been set"))?;

    Ok(PriceResponse {
        price: price_info.price,
        decimals: config.decimals,
        updated_at: price_info.updated_at,
    })
}

use cosmwasm_std::{
    entry_point, to_json_binary, Addr, BankMsg, Binary, Coin, CosmosMsg, Deps, DepsMut, Env,
    Int128, MessageInfo, Order, QuerierWrapper, Response, StdError, StdResult, Uint128, WasmMsg,
};
use cw2::set_contract_version;
use cw20::{Cw20ExecuteMsg, Cw20QueryMsg, TokenInfoResponse};
use price_feed_interface::{PriceFeedQueryMsg, PriceResponse};

use crate::{
    error::{new_generic_error, ContractError},
    msg::{ExecuteMsg, InstantiateMsg},
    query::{
        AssetConfigResponse, ConfigResponse, QueryMsg, VaultStatsResponse, WhitelistResponse,
    },
    state::{
        get_balance, increment_deposit_count, increment_withdraw_count, load_config, AssetConfig,
        Config, ASSET_CONFIGS, BALANCES, CONFIG, DEPOSIT_COUNT, NATIVE_ASSET_ID,
        TOTAL_DEPOSITED_USD, WHITELIST, WITHDRAW_COUNT,
    },
    valuation::amount_to_usd,
};

/// Contract name that is used for migration.
pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
/// Contract version that is used for migration.
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of decimals of the chain's native token.
pub const NATIVE_TOKEN_DECIMALS: u8 = 6;

/// Precision assumed for tokens that do not expose their metadata.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.deposit_cap_usd.is_zero() {
        return Err(new_generic_error("deposit cap must be greater than zero"));
    }

    if msg.native_denom.is_empty() {
        return Err(new_generic_error("native denom must be provided"));
    }

    let native_price_feed = deps.api.addr_validate(&msg.native_price_feed)?;

    CONFIG.save(
        deps.storage,
        &Config {
            native_denom: msg.native_denom.clone(),
            deposit_cap_usd: msg.deposit_cap_usd,
        },
    )?;

    ASSET_CONFIGS.save(
        deps.storage,
        NATIVE_ASSET_ID.to_string(),
        &AssetConfig {
            supported: true,
            is_native: true,
            decimals: NATIVE_TOKEN_DECIMALS,
            withdraw_limit: msg.native_withdraw_limit,
            price_feed: Some(native_price_feed.clone()),
        },
    )?;

    TOTAL_DEPOSITED_USD.save(deps.storage, &Uint128::zero())?;
    DEPOSIT_COUNT.save(deps.storage, &0u64)?;
    WITHDRAW_COUNT.save(deps.storage, &0u64)?;

    // The instantiating address receives the admin capabilities; any extra
    // addresses provided in the message are whitelisted alongside it.
    let mut whitelist_addresses = vec![info.sender.clone()];
    whitelist_addresses.extend(
        msg.whitelist
            .iter()
            .filter_map(|addr| deps.api.addr_validate(addr).ok()),
    );

    for whitelist_address in &whitelist_addresses {
        WHITELIST.save(deps.storage, whitelist_address.clone(), &())?;
    }

    Ok(Response::new()
        .add_attribute("action", "initialisation")
        .add_attribute("sender", info.sender)
        .add_attribute("native_denom", msg.native_denom)
        .add_attribute("deposit_cap_usd", msg.deposit_cap_usd)
        .add_attribute("native_price_feed", native_price_feed)
        .add_attribute("native_withdraw_limit", msg.native_withdraw_limit)
        .add_attribute(
            "whitelist",
            whitelist_addresses
                .iter()
                .map(|addr| addr.to_string())
                .collect::<Vec<String>>()
                .join(", "),
        ))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    let config = load_config(deps.storage)?;

    match msg {
        ExecuteMsg::DepositNative {} => deposit_native(deps, info, &config),
        ExecuteMsg::DepositToken { token, amount } => {
            deposit_token(deps, env, info, &config, token, amount)
        }
        ExecuteMsg::WithdrawNative { amount } => withdraw_native(deps, info, &config, amount),
        ExecuteMsg::WithdrawToken { token, amount } => withdraw_token(deps, info, token, amount),
        ExecuteMsg::ConfigureAsset {
            token,
            supported,
            decimals,
            withdraw_limit,
            price_feed,
        } => configure_asset(
            deps,
            info,
            token,
            supported,
            decimals,
            withdraw_limit,
            price_feed,
        ),
        ExecuteMsg::AddToWhitelist { address } => add_to_whitelist(deps, info, address),
        ExecuteMsg::RemoveFromWhitelist { address } => remove_from_whitelist(deps, info, address),
    }
}

// Deposits the native tokens attached to the message into the sender's
// custodied balance.
fn deposit_native(
    deps: DepsMut,
    info: MessageInfo,
    config: &Config,
) -> Result<Response, ContractError> {
    let amount = cw_utils::must_pay(&info, &config.native_denom)?;

    execute_deposit(deps, config, info.sender, NATIVE_ASSET_ID, amount, vec![])
}

// Deposits the given amount of a CW20 token into the sender's custodied
// balance. The tokens are pulled from the sender only after all bookkeeping
// has been recorded.
fn deposit_token(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    config: &Config,
    token: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount);
    }

    let token_addr = deps.api.addr_validate(&token)?;

    let pull_msg = CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token_addr.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
            owner: info.sender.to_string(),
            recipient: env.contract.address.to_string(),
            amount,
        })?,
        funds: vec![],
    });

    execute_deposit(
        deps,
        config,
        info.sender,
        token_addr.as_str(),
        amount,
        vec![pull_msg],
    )
}

// Shared deposit bookkeeping. All state writes happen before the transfer-in
// message is added to the Response, so no external call can observe an
// intermediate ledger state, and a failed transfer reverts everything.
fn execute_deposit(
    deps: DepsMut,
    config: &Config,
    sender: Addr,
    asset_id: &str,
    amount: Uint128,
    transfer_msgs: Vec<CosmosMsg>,
) -> Result<Response, ContractError> {
    let asset_config = load_supported_asset(deps.as_ref(), asset_id)?;

    // Should never happen, the native entry is keyed under the reserved id
    // and the registry only ever writes non-native entries
    if asset_id != NATIVE_ASSET_ID && asset_config.is_native {
        return Err(ContractError::AssetNotSupported {
            asset: asset_id.to_string(),
        });
    }

    let usd_value = asset_usd_value(&deps.querier, asset_id, &asset_config, amount)?;

    let total_deposited_usd = TOTAL_DEPOSITED_USD.load(deps.storage)?;
    let attempted = total_deposited_usd.checked_add(usd_value)?;
    if attempted > config.deposit_cap_usd {
        return Err(ContractError::DepositCapExceeded {
            attempted,
            cap: config.deposit_cap_usd,
        });
    }

    let new_balance = get_balance(deps.storage, asset_id, sender.clone())?.checked_add(amount)?;
    BALANCES.save(
        deps.storage,
        (asset_id.to_string(), sender.clone()),
        &new_balance,
    )?;

    TOTAL_DEPOSITED_USD.save(deps.storage, &attempted)?;
    increment_deposit_count(deps.storage)?;

    Ok(Response::new()
        .add_messages(transfer_msgs)
        .add_attribute("action", "deposit")
        .add_attribute("sender", sender)
        .add_attribute("asset", asset_id)
        .add_attribute("amount", amount)
        .add_attribute("new_balance", new_balance)
        .add_attribute("usd_value", usd_value))
}

// Withdraws the given amount of native tokens from the sender's custodied
// balance and sends them out. A failed send aborts the whole transaction, so
// the debit is never observable without the payout.
fn withdraw_native(
    deps: DepsMut,
    info: MessageInfo,
    config: &Config,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let transfer_msg = CosmosMsg::Bank(BankMsg::Send {
        to_address: info.sender.to_string(),
        amount: vec![Coin {
            denom: config.native_denom.clone(),
            amount,
        }],
    });

    execute_withdraw(deps, info.sender, NATIVE_ASSET_ID, amount, transfer_msg)
}

// Withdraws the given amount of a CW20 token from the sender's custodied
// balance and transfers it out.
fn withdraw_token(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let token_addr = deps.api.addr_validate(&token)?;

    let transfer_msg = CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token_addr.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
            recipient: info.sender.to_string(),
            amount,
        })?,
        funds: vec![],
    });

    execute_withdraw(deps, info.sender, token_addr.as_str(), amount, transfer_msg)
}

// Shared withdrawal bookkeeping. The ledger debit and counter update are
// recorded before the transfer-out message is added to the Response. The USD
// value in the attributes is recomputed at the current price; the accumulated
// deposit total is deliberately left untouched.
fn execute_withdraw(
    deps: DepsMut,
    sender: Addr,
    asset_id: &str,
    amount: Uint128,
    transfer_msg: CosmosMsg,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount);
    }

    let asset_config = load_supported_asset(deps.as_ref(), asset_id)?;

    // Should never happen, see execute_deposit
    if asset_id != NATIVE_ASSET_ID && asset_config.is_native {
        return Err(ContractError::AssetNotSupported {
            asset: asset_id.to_string(),
        });
    }

    if amount > asset_config.withdraw_limit {
        return Err(ContractError::WithdrawLimitExceeded {
            amount,
            limit: asset_config.withdraw_limit,
        });
    }

    let balance = get_balance(deps.storage, asset_id, sender.clone())?;
    if balance < amount {
        return Err(ContractError::InsufficientBalance {
            available: balance,
            required: amount,
        });
    }

    let usd_value = asset_usd_value(&deps.querier, asset_id, &asset_config, amount)?;

    let new_balance = balance.checked_sub(amount)?;
    BALANCES.save(
        deps.storage,
        (asset_id.to_string(), sender.clone()),
        &new_balance,
    )?;
    increment_withdraw_count(deps.storage)?;

    Ok(Response::new()
        .add_message(transfer_msg)
        .add_attribute("action", "withdraw")
        .add_attribute("sender", sender)
        .add_attribute("asset", asset_id)
        .add_attribute("amount", amount)
        .add_attribute("new_balance", new_balance)
        .add_attribute("usd_value", usd_value))
}

// Registers a new CW20 token in the asset registry, or updates an existing
// entry. The native asset entry is written once at instantiation and cannot
// be touched through this path.
fn configure_asset(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    supported: bool,
    decimals: u8,
    withdraw_limit: Uint128,
    price_feed: Option<String>,
) -> Result<Response, ContractError> {
    validate_sender_is_whitelisted(&deps, info.sender.clone())?;

    if token == NATIVE_ASSET_ID {
        return Err(ContractError::NativeAssetReserved);
    }

    let token_addr = deps.api.addr_validate(&token)?;
    let price_feed = match price_feed {
        None => None,
        Some(address) => Some(deps.api.addr_validate(&address)?),
    };

    // Zero means "ask the token itself". Not every token implementation
    // exposes its metadata, hence the fallback.
    let decimals = if decimals == 0 {
        query_token_decimals(&deps.querier, &token_addr)
    } else {
        decimals
    };

    let asset_config = AssetConfig {
        supported,
        is_native: false,
        decimals,
        withdraw_limit,
        price_feed: price_feed.clone(),
    };

    ASSET_CONFIGS.save(deps.storage, token_addr.to_string(), &asset_config)?;

    Ok(Response::new()
        .add_attribute("action", "configure_asset")
        .add_attribute("sender", info.sender)
        .add_attribute("asset", token_addr)
        .add_attribute("supported", supported.to_string())
        .add_attribute("decimals", decimals.to_string())
        .add_attribute("withdraw_limit", withdraw_limit)
        .add_attribute(
            "price_feed",
            price_feed
                .map(|addr| addr.to_string())
                .unwrap_or_default(),
        ))
}

// Adds a new account address to the whitelist.
fn add_to_whitelist(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    validate_sender_is_whitelisted(&deps, info.sender.clone())?;
    let whitelist_address = deps.api.addr_validate(&address)?;

    // Return an error if the account address is already in the whitelist
    if WHITELIST
        .may_load(deps.storage, whitelist_address.clone())?
        .is_some()
    {
        return Err(new_generic_error(format!(
            "address {whitelist_address} is already in the whitelist"
        )));
    }

    WHITELIST.save(deps.storage, whitelist_address.clone(), &())?;

    Ok(Response::new()
        .add_attribute("action", "add_to_whitelist")
        .add_attribute("sender", info.sender)
        .add_attribute("added_whitelist_address", whitelist_address))
}

// Removes an account address from the whitelist.
fn remove_from_whitelist(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    validate_sender_is_whitelisted(&deps, info.sender.clone())?;
    let whitelist_address = deps.api.addr_validate(&address)?;

    // Return an error if the account address is not in the whitelist
    if WHITELIST
        .may_load(deps.storage, whitelist_address.clone())?
        .is_none()
    {
        return Err(new_generic_error(format!(
            "address {whitelist_address} is not in the whitelist"
        )));
    }

    WHITELIST.remove(deps.storage, whitelist_address.clone());

    if WHITELIST
        .keys(deps.storage, None, None, Order::Ascending)
        .count()
        == 0
    {
        return Err(new_generic_error(
            "cannot remove last outstanding whitelisted address",
        ));
    }

    Ok(Response::new()
        .add_attribute("action", "remove_from_whitelist")
        .add_attribute("sender", info.sender)
        .add_attribute("removed_whitelist_address", whitelist_address))
}

/// Loads the configuration of the given asset, requiring that the asset is
/// registered and currently supported.
fn load_supported_asset(deps: Deps, asset_id: &str) -> Result<AssetConfig, ContractError> {
    let asset_config = ASSET_CONFIGS
        .may_load(deps.storage, asset_id.to_string())?
        .ok_or_else(|| ContractError::AssetNotSupported {
            asset: asset_id.to_string(),
        })?;

    if !asset_config.supported {
        return Err(ContractError::AssetNotSupported {
            asset: asset_id.to_string(),
        });
    }

    Ok(asset_config)
}

/// Returns the latest price of the given asset together with the number of
/// decimals the price is expressed in. The feed is never trusted blindly;
/// zero and negative readings are rejected alike.
fn query_asset_price(
    querier: &QuerierWrapper,
    asset_id: &str,
    asset_config: &AssetConfig,
) -> Result<(Uint128, u8), ContractError> {
    let price_feed = asset_config
        .price_feed
        .clone()
        .ok_or_else(|| ContractError::PriceFeedNotSet {
            asset: asset_id.to_string(),
        })?;

    let price_response: PriceResponse = querier.query_wasm_smart(
        price_feed.to_string(),
        &PriceFeedQueryMsg::LatestPrice {},
    )?;

    if price_response.price <= Int128::zero() {
        return Err(ContractError::NonPositivePrice {
            asset: asset_id.to_string(),
            price: price_response.price,
        });
    }

    let price = Uint128::new(price_response.price.i128() as u128);

    Ok((price, price_response.decimals))
}

/// Values `amount` of the given asset in the canonical USD unit, at the
/// latest price reported by the asset's price feed.
fn asset_usd_value(
    querier: &QuerierWrapper,
    asset_id: &str,
    asset_config: &AssetConfig,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    // Skip the feed query altogether for zero amounts
    if amount.is_zero() {
        return Ok(Uint128::zero());
    }

    let (price, price_decimals) = query_asset_price(querier, asset_id, asset_config)?;

    amount_to_usd(amount, asset_config.decimals, price, price_decimals)
}

fn query_token_decimals(querier: &QuerierWrapper, token: &Addr) -> u8 {
    let token_info: StdResult<TokenInfoResponse> =
        querier.query_wasm_smart(token.to_string(), &Cw20QueryMsg::TokenInfo {});

    match token_info {
        Ok(token_info) => token_info.decimals,
        Err(_) => DEFAULT_TOKEN_DECIMALS,
    }
}

fn validate_sender_is_whitelisted(deps: &DepsMut, address: Addr) -> Result<(), ContractError> {
    let is_whitelisted = WHITELIST.may_load(deps.storage, address)?;
    if is_whitelisted.is_none() {
        return Err(ContractError::Unauthorized);
    }

    Ok(())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(&deps)?),
        QueryMsg::AssetConfig { asset } => to_json_binary(&query_asset_config(&deps, asset)?),
        QueryMsg::Balance { address, asset } => {
            to_json_binary(&query_balance(&deps, address, asset)?)
        }
        QueryMsg::UsdValue { address, asset } => {
            to_json_binary(&query_usd_value(&deps, address, asset)?)
        }
        QueryMsg::VaultStats {} => to_json_binary(&query_vault_stats(&deps)?),
        QueryMsg::Whitelist {} => to_json_binary(&query_whitelist(&deps)?),
    }
}

pub fn query_config(deps: &Deps) -> StdResult<ConfigResponse> {
    Ok(ConfigResponse {
        config: load_config(deps.storage)?,
    })
}

pub fn query_asset_config(deps: &Deps, asset: String) -> StdResult<AssetConfigResponse> {
    let asset_config = ASSET_CONFIGS
        .may_load(deps.storage, asset.clone())?
        .ok_or_else(|| StdError::generic_err(format!("asset not supported: {asset}")))?;

    Ok(AssetConfigResponse { asset_config })
}

pub fn query_balance(deps: &Deps, address: String, asset: String) -> StdResult<Uint128> {
    let account = deps.api.addr_validate(&address)?;

    get_balance(deps.storage, &asset, account)
}

pub fn query_usd_value(deps: &Deps, address: String, asset: String) -> StdResult<Uint128> {
    let account = deps.api.addr_validate(&address)?;
    let asset_config = ASSET_CONFIGS
        .may_load(deps.storage, asset.clone())?
        .ok_or_else(|| StdError::generic_err(format!("asset not supported: {asset}")))?;

    let balance = get_balance(deps.storage, &asset, account)?;

    asset_usd_value(&deps.querier, &asset, &asset_config, balance)
        .map_err(|e| StdError::generic_err(e.to_string()))
}

pub fn query_vault_stats(deps: &Deps) -> StdResult<VaultStatsResponse> {
    let config = load_config(deps.storage)?;

    Ok(VaultStatsResponse {
        total_deposited_usd: TOTAL_DEPOSITED_USD.load(deps.storage)?,
        deposit_cap_usd: config.deposit_cap_usd,
        deposit_count: DEPOSIT_COUNT.load(deps.storage)?,
        withdraw_count: WITHDRAW_COUNT.load(deps.storage)?,
    })
}

pub fn query_whitelist(deps: &Deps) -> StdResult<WhitelistResponse> {
    let whitelist = WHITELIST
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<Addr>>>()?;

    Ok(WhitelistResponse { whitelist })
}

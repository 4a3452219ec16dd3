use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

/// Reserved asset identifier under which the chain's native token is kept in
/// the asset registry. The native asset is configured once at instantiation
/// and can never be re-configured through the registry.
pub const NATIVE_ASSET_ID: &str = "native";

/// Configuration of the vault smart contract
pub const CONFIG: Item<Config> = Item::new("config");

/// Addresses that are allowed to execute permissioned actions on the smart contract.
pub const WHITELIST: Map<Addr, ()> = Map::new("whitelist");

/// Per-asset configuration. The key is the CW20 token contract address, or
/// NATIVE_ASSET_ID for the native token entry.
/// ASSET_CONFIGS: key(asset_id) -> AssetConfig
pub const ASSET_CONFIGS: Map<String, AssetConfig> = Map::new("asset_configs");

/// Custodied balances, in the asset's own units.
/// BALANCES: key(asset_id, account) -> balance
pub const BALANCES: Map<(String, Addr), Uint128> = Map::new("balances");

/// Running sum of the USD valuations of all deposits ever accepted, in the
/// canonical 6-decimal USD unit. Valuations are taken at deposit time and the
/// sum is never reduced on withdrawals, so this is a cumulative-deposits
/// figure, not a mark-to-market one.
pub const TOTAL_DEPOSITED_USD: Item<Uint128> = Item::new("total_deposited_usd");

/// Number of deposits accepted so far. Informational only.
pub const DEPOSIT_COUNT: Item<u64> = Item::new("deposit_count");

/// Number of withdrawals executed so far. Informational only.
pub const WITHDRAW_COUNT: Item<u64> = Item::new("withdraw_count");

#[cw_serde]
pub struct Config {
    /// Denom of the chain's native token accepted by the vault.
    pub native_denom: String,
    /// Ceiling on the cumulative USD value of accepted deposits, in the
    /// canonical 6-decimal USD unit. Set once at instantiation.
    pub deposit_cap_usd: Uint128,
}

#[cw_serde]
pub struct AssetConfig {
    /// Gate for all operations on this asset.
    pub supported: bool,
    /// True only for the single native token entry.
    pub is_native: bool,
    /// Number of decimals of the asset's smallest unit.
    pub decimals: u8,
    /// Maximum amount (asset units) per single withdrawal.
    pub withdraw_limit: Uint128,
    /// Price feed contract used to value the asset. Without it the asset
    /// cannot be valued, so deposits and USD queries fail.
    pub price_feed: Option<Addr>,
}

pub fn load_config(storage: &dyn Storage) -> StdResult<Config> {
    CONFIG.load(storage)
}

pub fn get_balance(storage: &dyn Storage, asset_id: &str, account: Addr) -> StdResult<Uint128> {
    Ok(BALANCES
        .may_load(storage, (asset_id.to_string(), account))?
        .unwrap_or_default())
}

/// Increments the deposit counter and returns the new value.
pub fn increment_deposit_count(storage: &mut dyn Storage) -> StdResult<u64> {
    let deposit_count = DEPOSIT_COUNT.load(storage)? + 1;
    DEPOSIT_COUNT.save(storage, &deposit_count)?;

    Ok(deposit_count)
}

/// Increments the withdraw counter and returns the new value.
pub fn increment_withdraw_count(storage: &mut dyn Storage) -> StdResult<u64> {
    let withdraw_count = WITHDRAW_COUNT.load(storage)? + 1;
    WITHDRAW_COUNT.save(storage, &withdraw_count)?;

    Ok(withdraw_count)
}

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Addr;
// When compiling for wasm32 platform, compiler doesn't recognize that this type is used in one of the queries.
#[allow(unused_imports)]
use cosmwasm_std::Uint128;

use crate::state::{AssetConfig, Config};

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(AssetConfigResponse)]
    AssetConfig { asset: String },

    /// Custodied balance of the given account for the given asset, in the
    /// asset's own units.
    #[returns(Uint128)]
    Balance { address: String, asset: String },

    /// USD value of the given account's balance for the given asset, at the
    /// current price, in the canonical 6-decimal USD unit.
    #[returns(Uint128)]
    UsdValue { address: String, asset: String },

    #[returns(VaultStatsResponse)]
    VaultStats {},

    #[returns(WhitelistResponse)]
    Whitelist {},
}

#[cw_serde]
pub struct ConfigResponse {
    pub config: Config,
}

#[cw_serde]
pub struct AssetConfigResponse {
    pub asset_config: AssetConfig,
}

#[cw_serde]
pub struct VaultStatsResponse {
    pub total_deposited_usd: Uint128,
    pub deposit_cap_usd: Uint128,
    pub deposit_count: u64,
    pub withdraw_count: u64,
}

#[cw_serde]
pub struct WhitelistResponse {
    pub whitelist: Vec<Addr>,
}

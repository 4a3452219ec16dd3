use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Int128, Timestamp};
use cw_storage_plus::Item;

pub const CONFIG: Item<Config> = Item::new("config");

/// Latest reported price. Absent until the first SetPrice, unless an
/// initial price was provided at instantiation.
pub const PRICE_INFO: Item<PriceInfo> = Item::new("price_info");

#[cw_serde]
pub struct Config {
    /// Address allowed to push price updates.
    pub owner: Addr,
    /// Number of decimals every reported price is expressed in.
    pub decimals: u8,
}

#[cw_serde]
pub struct PriceInfo {
    pub price: Int128,
    pub updated_at: Timestamp,
}

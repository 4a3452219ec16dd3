use cosmwasm_schema::cw_serde;
use cosmwasm_std::Int128;

#[cw_serde]
pub struct InstantiateMsg {
    /// Number of decimals every price reported by this feed is expressed in.
    pub decimals: u8,
    /// Optional initial price. If not provided, LatestPrice queries fail
    /// until the first SetPrice.
    pub initial_price: Option<Int128>,
}

#[cw_serde]
pub enum ExecuteMsg {
    SetPrice { price: Int128 },
}

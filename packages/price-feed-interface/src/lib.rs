use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Int128, Timestamp};

// This Query enum will be expanded with additional variants as new
// price feed implementations emerge.
#[derive(QueryResponses)]
#[cw_serde]
pub enum PriceFeedQueryMsg {
    // Implemented by every price feed the vault can be pointed at.
    #[returns(PriceResponse)]
    LatestPrice {},
}

#[cw_serde]
pub struct PriceResponse {
    /// Latest reported USD price of one whole unit of the asset. Signed so
    /// that feeds can report invalid readings, which consumers must reject.
    pub price: Int128,
    /// Number of decimals the price is expressed in.
    pub decimals: u8,
    /// Time at which the price was last updated. Consumers that need a
    /// staleness bound can check it against the current block time.
    pub updated_at: Timestamp,
}

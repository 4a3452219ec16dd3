use cosmwasm_std::{ConversionOverflowError, Int128, OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    PaymentError(#[from] PaymentError),

    #[error("{0}")]
    OverflowError(#[from] OverflowError),

    #[error("{0}")]
    ConversionOverflowError(#[from] ConversionOverflowError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Asset not supported: {asset}")]
    AssetNotSupported { asset: String },

    #[error("Native asset cannot be configured through the asset registry")]
    NativeAssetReserved,

    #[error("No price feed configured for asset: {asset}")]
    PriceFeedNotSet { asset: String },

    #[error("Price feed for asset {asset} reported a non-positive price: {price}")]
    NonPositivePrice { asset: String, price: Int128 },

    #[error("Deposit cap exceeded: attempted total {attempted}, cap {cap}")]
    DepositCapExceeded { attempted: Uint128, cap: Uint128 },

    #[error("Withdraw limit exceeded: requested {amount}, limit {limit}")]
    WithdrawLimitExceeded { amount: Uint128, limit: Uint128 },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        available: Uint128,
        required: Uint128,
    },
}

pub fn new_generic_error(msg: impl Into<String>) -> ContractError {
    ContractError::Std(StdError::generic_err(msg))
}

use cosmwasm_std::{Uint128, Uint256};

use crate::error::ContractError;

/// Number of decimals of the canonical USD accounting unit.
pub const USD_DECIMALS: u8 = 6;

/// Converts `amount`, expressed in the asset's own `asset_decimals` precision,
/// into the canonical 6-decimal USD unit, given a price expressed in
/// `price_decimals` precision.
///
/// The price-decimal adjustment is applied before the asset-decimal rescaling,
/// both with integer division truncating toward zero, so the conversion works
/// uniformly for any combination of feed precision (e.g. 8) and asset
/// precision (e.g. 6 or 18). Rounding loss always goes against the depositor.
pub fn amount_to_usd(
    amount: Uint128,
    asset_decimals: u8,
    price: Uint128,
    price_decimals: u8,
) -> Result<Uint128, ContractError> {
    if amount.is_zero() {
        return Ok(Uint128::zero());
    }

    // The 256-bit product of two 128-bit operands cannot overflow.
    let mut usd_value = Uint256::from(amount) * Uint256::from(price);

    if price_decimals > 0 {
        usd_value /= pow10(price_decimals)?;
    }

    if asset_decimals >= USD_DECIMALS {
        usd_value /= pow10(asset_decimals - USD_DECIMALS)?;
    } else {
        usd_value = usd_value.checked_mul(pow10(USD_DECIMALS - asset_decimals)?)?;
    }

    Ok(usd_value.try_into()?)
}

// Feeds report their own precision, so the exponent is unbounded as far as
// this function is concerned; 10^78 and above no longer fits in 256 bits.
fn pow10(exp: u8) -> Result<Uint256, ContractError> {
    Ok(Uint256::from(10u8).checked_pow(exp as u32)?)
}

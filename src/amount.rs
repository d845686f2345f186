//! Conversion between human-decimal token amounts and integer base units

use std::str::FromStr;

use alloy::primitives::U256;
use bigdecimal::{BigDecimal, RoundingMode, Zero};

use crate::error::SwapError;

/// Decimal digits in `U256::MAX`
const MAX_BASE_UNIT_DIGITS: i64 = 78;

/// Parse a user-supplied decimal amount
pub fn parse_amount(amount: &str) -> Result<BigDecimal, SwapError> {
    BigDecimal::from_str(amount.trim())
        .map_err(|e| SwapError::invalid_amount(format!("cannot parse '{amount}': {e}")))
}

/// Convert a decimal amount into base units of a token with `decimals`
/// decimals, truncating toward zero
pub fn to_base_units(amount: &BigDecimal, decimals: u8) -> Result<U256, SwapError> {
    if *amount < BigDecimal::zero() {
        return Err(SwapError::invalid_amount(format!("amount {amount} is negative")));
    }
    if amount.is_zero() {
        return Ok(U256::ZERO);
    }

    // Bound the integer digits in base units before rescaling; the exponent
    // is user-supplied and rescaling allocates 10^|exponent|
    let (_, scale) = amount.as_bigint_and_exponent();
    let magnitude = i64::try_from(amount.digits())
        .ok()
        .and_then(|digits| digits.checked_sub(scale))
        .and_then(|digits| digits.checked_add(i64::from(decimals)));
    match magnitude {
        Some(digits) if digits <= 0 => return Ok(U256::ZERO),
        Some(digits) if digits <= MAX_BASE_UNIT_DIGITS => {},
        _ => {
            return Err(SwapError::invalid_amount(format!(
                "amount {amount} overflows at {decimals} decimals"
            )));
        },
    }

    let truncated = amount.with_scale_round(i64::from(decimals), RoundingMode::Down);
    let (digits, scale) = truncated.as_bigint_and_exponent();
    debug_assert_eq!(scale, i64::from(decimals));

    U256::from_str(&digits.to_string()).map_err(|_| {
        SwapError::invalid_amount(format!("amount {amount} overflows at {decimals} decimals"))
    })
}

/// Convert base units back into a decimal amount, for display
pub fn from_base_units(amount: U256, decimals: u8) -> BigDecimal {
    // A plain integer with a negative exponent always parses
    BigDecimal::from_str(&format!("{amount}e-{decimals}")).unwrap_or_default()
}

//! Common numeric helpers shared by the form and the exporters.

use rust_decimal::Decimal;
use tracing::debug;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Coerces free-form field text into a number.
///
/// Whitespace is trimmed and commas (thousands separators) are dropped.
/// Plain and scientific notation are accepted. Anything else, including
/// empty input, yields zero; this never fails.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::parse_number;
///
/// assert_eq!(parse_number("1,250.5"), dec!(1250.5));
/// assert_eq!(parse_number("lots"), dec!(0));
/// ```
pub fn parse_number(s: &str) -> Decimal {
    let normalized = s.trim().replace(',', "");
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .unwrap_or_else(|e| {
            debug!(input = %s, "non-numeric input coerced to 0: {}", e);
            Decimal::ZERO
        })
}

pub mod aggregates;
pub mod category;
pub mod egi;
pub mod evaluator;
pub mod income;
pub mod model;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Money;

/// Round to cents the way the grids do: `round(x * 100) / 100`, halves
/// toward positive infinity.
///
/// Past the point where `x * 100` overflows a decimal holds no more than
/// two fractional digits, so `x` is returned as is.
pub fn round_cents(x: Money) -> Money {
    x.checked_mul(dec!(100))
        .and_then(|c| c.checked_add(dec!(0.5)))
        .map(|c| c.floor() / dec!(100))
        .unwrap_or(x)
}

/// Round to a whole number, halves toward positive infinity.
pub fn round_whole(x: Decimal) -> Decimal {
    x.checked_add(dec!(0.5)).map(|c| c.floor()).unwrap_or(x)
}

/// `num / den`, or zero when the denominator is zero or the quotient is out
/// of range.
pub fn ratio_or_zero(num: Decimal, den: Decimal) -> Decimal {
    if den.is_zero() {
        Decimal::ZERO
    } else {
        num.checked_div(den).unwrap_or(Decimal::ZERO)
    }
}

/// `pct` percent of `base`, or `None` when it does not fit a decimal.
pub fn checked_percent(pct: Decimal, base: Decimal) -> Option<Decimal> {
    pct.checked_div(dec!(100))?.checked_mul(base)
}

/// Sum of `values`, or `None` once the running total overflows.
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

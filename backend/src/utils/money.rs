//! Decimal helpers for VAT and gross amounts.
//!
//! All money is `rust_decimal::Decimal`; amounts carry two decimal places and
//! rates four, matching the `NUMERIC(14, 2)` / `NUMERIC(6, 4)` columns.

use rust_decimal::{Decimal, RoundingStrategy};

pub const AMOUNT_SCALE: u32 = 2;
pub const RATE_SCALE: u32 = 4;

/// Rounds half away from zero, so `0.005` becomes `0.01` and `-0.005` becomes `-0.01`.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn normalize_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `round(net × rate, 2)`.
pub fn vat_amount(net: Decimal, rate: Decimal) -> Decimal {
    round_amount(net * rate)
}

/// `net + round(net × rate, 2)`.
pub fn gross_amount(net: Decimal, rate: Decimal) -> Decimal {
    net + vat_amount(net, rate)
}

/// Largest magnitude a `NUMERIC(14, 2)` column stores.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, AMOUNT_SCALE)
}

pub fn is_storable_amount(value: Decimal) -> bool {
    value.abs() <= max_amount()
}

/// VAT and gross for `net` at `rate`, or `None` when any of net, VAT or gross
/// falls outside the storable range.
pub fn checked_vat_and_gross(net: Decimal, rate: Decimal) -> Option<(Decimal, Decimal)> {
    if !is_storable_amount(net) {
        return None;
    }
    let vat = round_amount(net.checked_mul(rate)?);
    let gross = net.checked_add(vat)?;
    (is_storable_amount(vat) && is_storable_amount(gross)).then_some((vat, gross))
}

/// Sum of `amounts`, `None` on overflow.
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

/// True when the value needs no rounding at amount precision.
pub fn has_amount_precision(value: Decimal) -> bool {
    value.round_dp(AMOUNT_SCALE) == value
}

pub fn is_valid_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE && normalize_rate(rate) == rate
}

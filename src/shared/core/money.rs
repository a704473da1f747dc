// All amounts are exact decimals rounded to 2 dp at the edges.

use rust_decimal::{Decimal, RoundingStrategy};

pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// quantity x rate, rounded.
pub fn line_amount(quantity: Decimal, rate: Decimal) -> Decimal {
    round2(quantity * rate)
}

/// Minutes expressed as decimal hours (2 dp), for time-based line items.
pub fn minutes_to_hours(minutes: i64) -> Decimal {
    round2(Decimal::from(minutes) / Decimal::from(60))
}

// 2.0: the market maker's quote function. pure, no I/O: given the current
// quote and an incoming trade, produce the next quote.
//
// constant-impact model, not a bonded curve: every trade moves the YES price
// by a base impact plus a size-scaled component that saturates for large
// notionals. the YES price is the free variable; NO is derived as the
// complement after clamping, so the pair keeps summing to one exactly.

use crate::market::MarketQuote;
use crate::types::{Outcome, Price, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingParams {
    /// Flat impact applied to every trade
    pub base_impact: Decimal,
    /// Notional that adds one unit of size impact
    pub volume_unit: Decimal,
    /// Size impact ceiling
    pub max_volume_impact: Decimal,
    /// Lowest quotable YES price
    pub floor: Decimal,
    /// Highest quotable YES price
    pub ceiling: Decimal,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            base_impact: dec!(0.01),
            volume_unit: dec!(10000),
            max_volume_impact: dec!(0.05),
            floor: dec!(0.05),
            ceiling: dec!(0.95),
        }
    }
}

pub fn volume_multiplier(notional: Decimal, params: &PricingParams) -> Decimal {
    (notional / params.volume_unit).min(params.max_volume_impact)
}

pub fn price_impact(notional: Decimal, params: &PricingParams) -> Decimal {
    params.base_impact + volume_multiplier(notional, params)
}

// 2.1: direction must come from outcome and side jointly. buying YES and
// selling NO are both bets on YES, so both push the YES price up; the other
// two combinations push it down.
pub fn impact_direction(outcome: Outcome, side: Side) -> Decimal {
    match (outcome, side) {
        (Outcome::Yes, Side::Buy) | (Outcome::No, Side::Sell) => Decimal::ONE,
        (Outcome::Yes, Side::Sell) | (Outcome::No, Side::Buy) => -Decimal::ONE,
    }
}

pub fn next_quote(
    quote: &MarketQuote,
    outcome: Outcome,
    side: Side,
    notional: Decimal,
    params: &PricingParams,
) -> MarketQuote {
    let shift = price_impact(notional, params) * impact_direction(outcome, side);
    let yes = (quote.yes().value() + shift)
        .max(params.floor)
        .min(params.ceiling);
    MarketQuote::from_yes(Price::new_unchecked(yes))
}

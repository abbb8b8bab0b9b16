//! Execution decision: whether an admitted order trades now, and at what price.
//!
//! One-shot state machine per order. Market orders always execute at the
//! quote; limit orders execute only when the quote satisfies the limit and
//! otherwise rest as pending, never to be re-evaluated here. Bound and
//! slippage checks run after the price is decided and before any write.

use crate::order::{OrderError, OrderType};
use crate::types::{Price, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionDecision {
    /// Trade now at this price.
    Execute { price: Price },
    /// Leave the order pending. Nothing settles.
    Rest,
}

pub fn decide(
    order_type: OrderType,
    side: Side,
    limit_price: Option<Price>,
    current: Price,
) -> Result<ExecutionDecision, OrderError> {
    match order_type {
        OrderType::Market => Ok(ExecutionDecision::Execute { price: current }),
        OrderType::Limit => {
            let limit = limit_price.ok_or(OrderError::MissingLimitPrice)?;
            let decision = match side {
                Side::Buy if current <= limit => ExecutionDecision::Execute {
                    price: current.min(limit),
                },
                Side::Sell if current >= limit => ExecutionDecision::Execute {
                    price: current.max(limit),
                },
                _ => ExecutionDecision::Rest,
            };
            Ok(decision)
        }
    }
}

/// Absolute price bounds, then the slippage envelope around the quote.
pub fn check_bounds(
    side: Side,
    execution_price: Price,
    min_price: Option<Price>,
    max_price: Option<Price>,
    current: Price,
    max_slippage: Decimal,
) -> Result<(), ExecutionError> {
    match side {
        Side::Buy => {
            if let Some(max) = max_price {
                if execution_price > max {
                    return Err(ExecutionError::PriceAboveMax {
                        price: execution_price,
                        max,
                    });
                }
            }
            let bound = current.value() * (Decimal::ONE + max_slippage);
            if execution_price.value() > bound {
                return Err(ExecutionError::SlippageExceeded {
                    price: execution_price,
                    bound,
                });
            }
        }
        Side::Sell => {
            if let Some(min) = min_price {
                if execution_price < min {
                    return Err(ExecutionError::PriceBelowMin {
                        price: execution_price,
                        min,
                    });
                }
            }
            let bound = current.value() * (Decimal::ONE - max_slippage);
            if execution_price.value() < bound {
                return Err(ExecutionError::SlippageExceeded {
                    price: execution_price,
                    bound,
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("Execution price {price} above maximum {max}")]
    PriceAboveMax { price: Price, max: Price },

    #[error("Execution price {price} below minimum {min}")]
    PriceBelowMin { price: Price, min: Price },

    #[error("Execution price {price} outside slippage bound {bound}")]
    SlippageExceeded { price: Price, bound: Decimal },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(v: Decimal) -> Price {
        Price::new_unchecked(v)
    }

    #[test]
    fn market_orders_always_execute_at_quote() {
        let decision = decide(OrderType::Market, Side::Buy, None, p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Execute { price: p(dec!(0.52)) });

        let decision = decide(OrderType::Market, Side::Sell, None, p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Execute { price: p(dec!(0.52)) });
    }

    #[test]
    fn limit_buy_executes_only_at_or_under_limit() {
        // quote above the limit: rest
        let decision = decide(OrderType::Limit, Side::Buy, Some(p(dec!(0.40))), p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Rest);

        // quote at the limit: execute at the better of the two
        let decision = decide(OrderType::Limit, Side::Buy, Some(p(dec!(0.52))), p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Execute { price: p(dec!(0.52)) });

        // quote under the limit: execute at the quote
        let decision = decide(OrderType::Limit, Side::Buy, Some(p(dec!(0.60))), p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Execute { price: p(dec!(0.52)) });
    }

    #[test]
    fn limit_sell_executes_only_at_or_over_limit() {
        let decision = decide(OrderType::Limit, Side::Sell, Some(p(dec!(0.60))), p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Rest);

        let decision = decide(OrderType::Limit, Side::Sell, Some(p(dec!(0.45))), p(dec!(0.52))).unwrap();
        assert_eq!(decision, ExecutionDecision::Execute { price: p(dec!(0.52)) });
    }

    #[test]
    fn limit_without_price_errors() {
        let result = decide(OrderType::Limit, Side::Buy, None, p(dec!(0.5)));
        assert!(matches!(result, Err(OrderError::MissingLimitPrice)));
    }

    #[test]
    fn buy_above_max_price_rejected() {
        let result = check_bounds(
            Side::Buy,
            p(dec!(0.55)),
            None,
            Some(p(dec!(0.50))),
            p(dec!(0.55)),
            dec!(0.05),
        );
        assert!(matches!(result, Err(ExecutionError::PriceAboveMax { .. })));
    }

    #[test]
    fn sell_below_min_price_rejected() {
        let result = check_bounds(
            Side::Sell,
            p(dec!(0.45)),
            Some(p(dec!(0.50))),
            None,
            p(dec!(0.45)),
            dec!(0.05),
        );
        assert!(matches!(result, Err(ExecutionError::PriceBelowMin { .. })));
    }

    #[test]
    fn slippage_envelope_is_sided() {
        // buy: execution may not exceed quote * (1 + s)
        let result = check_bounds(Side::Buy, p(dec!(0.56)), None, None, p(dec!(0.50)), dec!(0.05));
        assert!(matches!(result, Err(ExecutionError::SlippageExceeded { .. })));

        let result = check_bounds(Side::Buy, p(dec!(0.52)), None, None, p(dec!(0.50)), dec!(0.05));
        assert!(result.is_ok());

        // sell: execution may not fall under quote * (1 - s)
        let result = check_bounds(Side::Sell, p(dec!(0.44)), None, None, p(dec!(0.50)), dec!(0.05));
        assert!(matches!(result, Err(ExecutionError::SlippageExceeded { .. })));

        let result = check_bounds(Side::Sell, p(dec!(0.48)), None, None, p(dec!(0.50)), dec!(0.05));
        assert!(result.is_ok());
    }

    #[test]
    fn execution_at_quote_passes_bounds() {
        let result = check_bounds(
            Side::Buy,
            p(dec!(0.52)),
            None,
            Some(p(dec!(0.60))),
            p(dec!(0.52)),
            dec!(0.05),
        );
        assert!(result.is_ok());
    }
}

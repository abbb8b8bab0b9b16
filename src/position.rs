// 4.0: per-(user, market, outcome) share holdings with cost-basis tracking.
// 4.1 has the increase/decrease accounting at the bottom.
//
// Long-only: shares never go negative, and a fully closed position is zeroed
// out rather than deleted.

use crate::types::{MarketId, Notional, Outcome, Price, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub shares: Decimal,
    /// Weighted average entry price across all buys
    pub avg_price: Price,
    pub total_cost: Notional,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    /// First buy for a (user, market, outcome).
    pub fn open(
        user_id: UserId,
        market_id: MarketId,
        outcome: Outcome,
        shares: Decimal,
        entry_price: Price,
        cost: Notional,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            user_id,
            market_id,
            outcome,
            shares,
            avg_price: entry_price,
            total_cost: cost,
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.shares.is_zero()
    }

    /// The zeroed-out form of this position. Shares and cost go to zero,
    /// the average price stays as a record of the last entry level.
    pub fn zeroed(&self, timestamp: Timestamp) -> Self {
        Self {
            shares: Decimal::ZERO,
            total_cost: Notional::zero(),
            updated_at: timestamp,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub position: Position,
    /// Cost basis released by the sale, at the average entry price
    pub cost_reduction: Notional,
    /// Sale proceeds minus released cost basis. Returned to the caller,
    /// never stored on the position.
    pub realized_pnl: Notional,
}

// 4.1: buy accounting. standard weighted-average-cost: the new average is
// total spent divided by total held.
pub fn increase_position(
    position: &Position,
    trade_shares: Decimal,
    trade_amount: Notional,
    timestamp: Timestamp,
) -> Position {
    debug_assert!(trade_shares > Decimal::ZERO, "increase needs positive shares");

    let new_shares = position.shares + trade_shares;
    let new_total_cost = position.total_cost.add(trade_amount);
    let new_avg = Price::new_unchecked(new_total_cost.value() / new_shares);

    Position {
        shares: new_shares,
        avg_price: new_avg,
        total_cost: new_total_cost,
        updated_at: timestamp,
        ..position.clone()
    }
}

// 4.2: sell accounting. released cost basis is priced at the average entry,
// total cost is floor-clamped at zero, and the average price is left alone.
// a full close zeroes shares and cost but keeps the average for the record.
pub fn decrease_position(
    position: &Position,
    trade_shares: Decimal,
    proceeds: Notional,
    timestamp: Timestamp,
) -> PositionUpdate {
    debug_assert!(trade_shares > Decimal::ZERO, "decrease needs positive shares");

    let remaining = position.shares - trade_shares;

    if remaining <= Decimal::ZERO {
        let cost_reduction = position.total_cost;
        return PositionUpdate {
            position: position.zeroed(timestamp),
            cost_reduction,
            realized_pnl: proceeds.sub(cost_reduction),
        };
    }

    let cost_reduction = Notional::new(trade_shares * position.avg_price.value());
    let new_total_cost = if cost_reduction > position.total_cost {
        Notional::zero()
    } else {
        position.total_cost.sub(cost_reduction)
    };

    let new_position = Position {
        shares: remaining,
        total_cost: new_total_cost,
        updated_at: timestamp,
        ..position.clone()
    };

    PositionUpdate {
        position: new_position,
        cost_reduction,
        realized_pnl: proceeds.sub(cost_reduction),
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PositionError {
    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Decimal, held: Decimal },
}

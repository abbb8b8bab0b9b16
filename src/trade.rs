//! Immutable trade records.
//!
//! Every fill against the market maker produces exactly one trade. The user
//! sits on one side only: buyer for buy orders, seller for sell orders, with
//! the other side left empty because the counterparty is the AMM itself.

use crate::order::Order;
use crate::types::{MarketId, Notional, OrderId, Outcome, Price, Side, Timestamp, TradeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market_id: MarketId,
    pub order_id: OrderId,
    pub buyer_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    pub outcome: Outcome,
    pub shares: Decimal,
    pub price: Price,
    pub notional: Notional,
    pub executed_at: Timestamp,
}

impl Trade {
    pub fn from_fill(
        id: TradeId,
        order: &Order,
        shares: Decimal,
        price: Price,
        timestamp: Timestamp,
    ) -> Self {
        let (buyer_id, seller_id) = match order.side {
            Side::Buy => (Some(order.user_id), None),
            Side::Sell => (None, Some(order.user_id)),
        };

        Self {
            id,
            market_id: order.market_id,
            order_id: order.id,
            buyer_id,
            seller_id,
            outcome: order.outcome,
            shares,
            price,
            notional: order.amount,
            executed_at: timestamp,
        }
    }
}

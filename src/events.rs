// 11.0: every state change produces an event. used for audit trails and for
// notifying external systems. the EventPayload enum lists all event types.

use crate::types::{MarketId, Notional, OrderId, Outcome, Price, Side, Timestamp, TradeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Order lifecycle
    OrderAccepted(OrderAcceptedEvent),
    OrderRested(OrderRestedEvent),
    OrderRejected(OrderRejectedEvent),

    // Fills
    TradeExecuted(TradeExecutedEvent),
    QuoteUpdated(QuoteUpdatedEvent),

    // Position lifecycle
    PositionOpened(PositionOpenedEvent),
    PositionUpdated(PositionUpdatedEvent),
    PositionClosed(PositionClosedEvent),

    // Account events
    Deposit(DepositEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAcceptedEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub side: Side,
    pub outcome: Outcome,
    pub amount: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRestedEvent {
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub limit_price: Option<Price>,
    pub quote_price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRejectedEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecutedEvent {
    pub trade_id: TradeId,
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub side: Side,
    pub shares: Decimal,
    pub price: Price,
    pub notional: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteUpdatedEvent {
    pub market_id: MarketId,
    pub yes_price: Price,
    pub no_price: Price,
    pub volume: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub shares: Decimal,
    pub entry_price: Price,
    pub cost: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionUpdatedEvent {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub old_shares: Decimal,
    pub new_shares: Decimal,
    pub avg_price: Price,
    pub realized_pnl: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub exit_price: Price,
    pub realized_pnl: Notional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub user_id: UserId,
    pub amount: Notional,
    pub new_balance: Notional,
}

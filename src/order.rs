//! Order types: the caller-facing request and the persisted order record.
//!
//! Market orders execute against the current quote; limit orders execute only
//! when the quote satisfies the limit, otherwise they rest as pending. There
//! is no resting-order matcher: a pending limit order is never revisited.

use crate::types::{MarketId, Notional, OrderId, Outcome, Price, Side, Timestamp, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Allowed execution-price deviation from the quote when the caller does not
/// say otherwise.
pub fn default_max_slippage() -> Decimal {
    dec!(0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Executes at the current quote.
    Market,
    /// Executes only at or better than the limit price.
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Expired,
}

/// What a caller submits. Share counts are deliberately absent: fill size is
/// always derived server-side from the notional and the execution price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub order_type: OrderType,
    pub side: Side,
    pub outcome: Outcome,
    /// Requested notional
    pub amount: Decimal,
    pub limit_price: Option<Price>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub max_slippage: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(user_id: UserId, market_id: MarketId, side: Side, outcome: Outcome, amount: Decimal) -> Self {
        Self {
            user_id,
            market_id,
            order_type: OrderType::Market,
            side,
            outcome,
            amount,
            limit_price: None,
            min_price: None,
            max_price: None,
            max_slippage: None,
        }
    }

    pub fn limit(
        user_id: UserId,
        market_id: MarketId,
        side: Side,
        outcome: Outcome,
        amount: Decimal,
        limit_price: Price,
    ) -> Self {
        Self {
            user_id,
            market_id,
            order_type: OrderType::Limit,
            side,
            outcome,
            amount,
            limit_price: Some(limit_price),
            min_price: None,
            max_price: None,
            max_slippage: None,
        }
    }

    /// Structural checks that need no market or account state.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.amount <= Decimal::ZERO {
            return Err(OrderError::NonPositiveAmount(self.amount));
        }
        if self.order_type == OrderType::Limit && self.limit_price.is_none() {
            return Err(OrderError::MissingLimitPrice);
        }
        Ok(())
    }

    pub fn max_slippage_or_default(&self) -> Decimal {
        self.max_slippage.unwrap_or_else(default_max_slippage)
    }
}

/// The persisted order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub order_type: OrderType,
    pub side: Side,
    pub outcome: Outcome,
    pub amount: Notional,
    pub limit_price: Option<Price>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub max_slippage: Decimal,
    /// Server-computed fill size; zero until filled
    pub shares: Decimal,
    pub filled_shares: Decimal,
    pub avg_fill_price: Option<Price>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    pub fn from_request(id: OrderId, request: &OrderRequest, timestamp: Timestamp) -> Self {
        Self {
            id,
            user_id: request.user_id,
            market_id: request.market_id,
            order_type: request.order_type,
            side: request.side,
            outcome: request.outcome,
            amount: Notional::new(request.amount),
            limit_price: request.limit_price,
            min_price: request.min_price,
            max_price: request.max_price,
            max_slippage: request.max_slippage_or_default(),
            shares: Decimal::ZERO,
            filled_shares: Decimal::ZERO,
            avg_fill_price: None,
            status: OrderStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// One-shot transition out of pending.
    pub fn mark_filled(&mut self, shares: Decimal, fill_price: Price, timestamp: Timestamp) {
        debug_assert!(self.status == OrderStatus::Pending, "only pending orders fill");
        self.shares = shares;
        self.filled_shares = shares;
        self.avg_fill_price = Some(fill_price);
        self.status = OrderStatus::Filled;
        self.updated_at = timestamp;
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    #[error("Limit order requires a limit price")]
    MissingLimitPrice,

    #[error("Order amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
}

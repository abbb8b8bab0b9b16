//! Ledger gateway: the storage capability the engine settles against.
//!
//! Durable, key-addressed storage for markets, balances, positions, orders,
//! and trades. Single-record operations only; cross-record atomicity is the
//! settlement unit's job, not the store's. Every operation returns the full
//! written record or a [`StorageError`].
//!
//! [`MemoryLedger`] is the in-process implementation used by the simulator
//! and the test suite, with write-fault injection for rollback coverage.

use crate::balance::Balance;
use crate::market::Market;
use crate::order::Order;
use crate::position::Position;
use crate::trade::Trade;
use crate::types::{MarketId, Outcome, OrderId, TradeId, UserId};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),
}

pub trait LedgerGateway: Send + Sync {
    fn get_market(&self, id: MarketId) -> Result<Option<Market>, StorageError>;
    fn update_market(&self, market: &Market) -> Result<Market, StorageError>;

    fn get_balance(&self, user_id: UserId) -> Result<Option<Balance>, StorageError>;
    fn update_balance(&self, balance: &Balance) -> Result<Balance, StorageError>;

    fn get_position(
        &self,
        user_id: UserId,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Option<Position>, StorageError>;
    fn create_position(&self, position: &Position) -> Result<Position, StorageError>;
    fn update_position(&self, position: &Position) -> Result<Position, StorageError>;

    fn create_order(&self, order: &Order) -> Result<Order, StorageError>;
    fn update_order(&self, order: &Order) -> Result<Order, StorageError>;

    fn create_trade(&self, trade: &Trade) -> Result<Trade, StorageError>;
}

type PositionKey = (UserId, MarketId, Outcome);

/// In-memory ledger over concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    markets: DashMap<MarketId, Market>,
    balances: DashMap<UserId, Balance>,
    positions: DashMap<PositionKey, Position>,
    orders: DashMap<OrderId, Order>,
    trades: DashMap<TradeId, Trade>,
    fail_on: Mutex<HashSet<&'static str>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a market record. Market creation sits outside the gateway
    /// contract, so the in-memory store exposes it directly.
    pub fn seed_market(&self, market: Market) {
        self.markets.insert(market.id, market);
    }

    /// Seed a balance record, same reasoning as [`Self::seed_market`].
    pub fn seed_balance(&self, balance: Balance) {
        self.balances.insert(balance.user_id, balance);
    }

    /// Read an order back. Not part of the gateway contract; the engine
    /// returns orders in its responses, this is for inspection.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).map(|r| r.value().clone())
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn trades_for_order(&self, order_id: OrderId) -> Vec<Trade> {
        self.trades
            .iter()
            .filter(|r| r.value().order_id == order_id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Make the named operation fail until cleared. Rollback tests use this
    /// to break a settlement partway through.
    pub fn inject_fault(&self, op: &'static str) {
        self.fail_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    pub fn clear_faults(&self) {
        self.fail_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn fault(&self, op: &'static str) -> Result<(), StorageError> {
        let failing = self
            .fail_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(op);
        if failing {
            Err(StorageError::Unavailable(format!("injected fault: {op}")))
        } else {
            Ok(())
        }
    }
}

impl LedgerGateway for MemoryLedger {
    fn get_market(&self, id: MarketId) -> Result<Option<Market>, StorageError> {
        self.fault("get_market")?;
        Ok(self.markets.get(&id).map(|r| r.value().clone()))
    }

    fn update_market(&self, market: &Market) -> Result<Market, StorageError> {
        self.fault("update_market")?;
        if !self.markets.contains_key(&market.id) {
            return Err(StorageError::Constraint(format!(
                "market {:?} does not exist",
                market.id
            )));
        }
        self.markets.insert(market.id, market.clone());
        Ok(market.clone())
    }

    fn get_balance(&self, user_id: UserId) -> Result<Option<Balance>, StorageError> {
        self.fault("get_balance")?;
        Ok(self.balances.get(&user_id).map(|r| r.value().clone()))
    }

    fn update_balance(&self, balance: &Balance) -> Result<Balance, StorageError> {
        self.fault("update_balance")?;
        if !self.balances.contains_key(&balance.user_id) {
            return Err(StorageError::Constraint(format!(
                "balance for user {:?} does not exist",
                balance.user_id
            )));
        }
        self.balances.insert(balance.user_id, balance.clone());
        Ok(balance.clone())
    }

    fn get_position(
        &self,
        user_id: UserId,
        market_id: MarketId,
        outcome: Outcome,
    ) -> Result<Option<Position>, StorageError> {
        self.fault("get_position")?;
        Ok(self
            .positions
            .get(&(user_id, market_id, outcome))
            .map(|r| r.value().clone()))
    }

    fn create_position(&self, position: &Position) -> Result<Position, StorageError> {
        self.fault("create_position")?;
        let key = (position.user_id, position.market_id, position.outcome);
        if self.positions.contains_key(&key) {
            return Err(StorageError::Constraint(format!(
                "position {key:?} already exists"
            )));
        }
        self.positions.insert(key, position.clone());
        Ok(position.clone())
    }

    fn update_position(&self, position: &Position) -> Result<Position, StorageError> {
        self.fault("update_position")?;
        let key = (position.user_id, position.market_id, position.outcome);
        if !self.positions.contains_key(&key) {
            return Err(StorageError::Constraint(format!(
                "position {key:?} does not exist"
            )));
        }
        self.positions.insert(key, position.clone());
        Ok(position.clone())
    }

    fn create_order(&self, order: &Order) -> Result<Order, StorageError> {
        self.fault("create_order")?;
        if self.orders.contains_key(&order.id) {
            return Err(StorageError::Constraint(format!(
                "order {:?} already exists",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    fn update_order(&self, order: &Order) -> Result<Order, StorageError> {
        self.fault("update_order")?;
        if !self.orders.contains_key(&order.id) {
            return Err(StorageError::Constraint(format!(
                "order {:?} does not exist",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    fn create_trade(&self, trade: &Trade) -> Result<Trade, StorageError> {
        self.fault("create_trade")?;
        if self.trades.contains_key(&trade.id) {
            return Err(StorageError::Constraint(format!(
                "trade {:?} already exists",
                trade.id
            )));
        }
        self.trades.insert(trade.id, trade.clone());
        Ok(trade.clone())
    }
}

//! Serialization boundaries for order settlement.
//!
//! Two concurrent orders on the same market must not interleave their
//! read-quote/reprice/write-quote sequence, and two orders from the same user
//! must not both pass a balance or share check against the same snapshot. The
//! lock table hands out one mutex per market and one per user; an order holds
//! both for its whole read-decide-settle span, always acquiring market before
//! user so lock order is total and deadlock-free.

use crate::types::{MarketId, UserId};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct LockTable {
    markets: DashMap<MarketId, Arc<Mutex<()>>>,
    users: DashMap<UserId, Arc<Mutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn market_handle(&self, market_id: MarketId) -> Arc<Mutex<()>> {
        self.markets.entry(market_id).or_default().clone()
    }

    fn user_handle(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.users.entry(user_id).or_default().clone()
    }

    /// Run `f` while holding the market lock, then the user lock.
    pub fn with_order_locks<R>(
        &self,
        market_id: MarketId,
        user_id: UserId,
        f: impl FnOnce() -> R,
    ) -> R {
        let market = self.market_handle(market_id);
        let user = self.user_handle(user_id);
        let _market_guard = market.lock().unwrap_or_else(PoisonError::into_inner);
        let _user_guard = user.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding only the user lock.
    pub fn with_user_lock<R>(&self, user_id: UserId, f: impl FnOnce() -> R) -> R {
        let user = self.user_handle(user_id);
        let _guard = user.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

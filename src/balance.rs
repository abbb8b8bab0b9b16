//! Per-user cash balance.
//!
//! Balances are debited on buys and credited on sells. A balance can never go
//! negative: the debit itself enforces solvency even when callers pre-check.

use crate::types::{Notional, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,
    pub available: Notional,
    pub total_deposited: Notional,
    pub total_withdrawn: Notional,
    pub updated_at: Timestamp,
}

impl Balance {
    pub fn new(user_id: UserId, timestamp: Timestamp) -> Self {
        Self {
            user_id,
            available: Notional::zero(),
            total_deposited: Notional::zero(),
            total_withdrawn: Notional::zero(),
            updated_at: timestamp,
        }
    }

    pub fn deposit(&mut self, amount: Notional, timestamp: Timestamp) {
        self.available = self.available.add(amount);
        self.total_deposited = self.total_deposited.add(amount);
        self.updated_at = timestamp;
    }

    pub fn debit(&mut self, amount: Notional, timestamp: Timestamp) -> Result<(), BalanceError> {
        if amount > self.available {
            return Err(BalanceError::InsufficientBalance {
                requested: amount,
                available: self.available,
            });
        }
        self.available = self.available.sub(amount);
        self.updated_at = timestamp;
        Ok(())
    }

    pub fn credit(&mut self, amount: Notional, timestamp: Timestamp) {
        self.available = self.available.add(amount);
        self.updated_at = timestamp;
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BalanceError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Notional,
        available: Notional,
    },
}

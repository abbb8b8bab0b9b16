//! Market record and quoted price state.
//!
//! A market is a single binary question quoted as a YES/NO price pair that
//! always sums to one. Prices and volume are mutated only through settlement;
//! status transitions belong to a resolution process outside this engine.

use crate::types::{MarketId, Notional, Outcome, Price, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Market status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Open for trading
    Active,
    /// Outcome decided, awaiting payout
    Resolved,
    /// Resolution under dispute
    Disputed,
    /// Voided, no payout
    Cancelled,
}

impl Default for MarketStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// The quoted YES/NO price pair. Constructed from the YES price alone so the
/// pair can never drift apart: NO is always the exact complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    yes: Price,
    no: Price,
}

impl MarketQuote {
    pub fn from_yes(yes: Price) -> Self {
        Self {
            yes,
            no: yes.complement(),
        }
    }

    /// Even odds, the state every new market opens at.
    pub fn even() -> Self {
        Self::from_yes(Price::new_unchecked(dec!(0.5)))
    }

    pub fn yes(&self) -> Price {
        self.yes
    }

    pub fn no(&self) -> Price {
        self.no
    }

    pub fn price_for(&self, outcome: Outcome) -> Price {
        match outcome {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }

    pub fn sum(&self) -> Decimal {
        self.yes.value() + self.no.value()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    /// Human-readable question (e.g., "Will it rain tomorrow?")
    pub question: String,
    pub quote: MarketQuote,
    /// Cumulative traded notional
    pub volume: Notional,
    /// Seeded liquidity, carried as market data
    pub liquidity: Notional,
    /// Fee fraction, carried as market data
    pub trading_fee: Decimal,
    pub status: MarketStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Market {
    pub fn new(id: MarketId, question: impl Into<String>, liquidity: Notional, timestamp: Timestamp) -> Self {
        Self {
            id,
            question: question.into(),
            quote: MarketQuote::even(),
            volume: Notional::zero(),
            liquidity,
            trading_fee: dec!(0.02),
            status: MarketStatus::Active,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MarketStatus::Active
    }

    pub fn price_for(&self, outcome: Outcome) -> Price {
        self.quote.price_for(outcome)
    }

    /// Apply a settled trade: move to the new quote and accumulate volume.
    pub fn apply_trade(&mut self, quote: MarketQuote, notional: Notional, timestamp: Timestamp) {
        self.quote = quote;
        self.volume = self.volume.add(notional);
        self.updated_at = timestamp;
    }
}

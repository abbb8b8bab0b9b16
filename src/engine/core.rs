// 8.0 engine/core.rs: main engine. owns the ledger gateway, the lock table,
// the audit log, and a deterministic clock. shared across threads behind an
// Arc; all serialization happens through the lock table, never through &mut.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::balance::Balance;
use crate::events::{DepositEvent, Event, EventId, EventPayload};
use crate::locks::LockTable;
use crate::market::MarketQuote;
use crate::store::LedgerGateway;
use crate::types::{MarketId, Notional, Timestamp, UserId};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/** 8.1: main engine struct. state lives in the gateway; the engine holds
coordination machinery only */
#[derive(Debug)]
pub struct Engine<G: LedgerGateway> {
    pub(super) config: EngineConfig,
    pub(super) gateway: G,
    pub(super) locks: LockTable,
    pub(super) events: Mutex<Vec<Event>>,
    pub(super) next_event_id: AtomicU64,
    pub(super) next_order_id: AtomicU64,
    pub(super) next_trade_id: AtomicU64,
    pub(super) clock: AtomicI64,
}

impl<G: LedgerGateway> Engine<G> {
    pub fn new(gateway: G, config: EngineConfig) -> Self {
        Self {
            config,
            gateway,
            locks: LockTable::new(),
            events: Mutex::new(Vec::new()),
            next_event_id: AtomicU64::new(1),
            next_order_id: AtomicU64::new(1),
            next_trade_id: AtomicU64::new(1),
            clock: AtomicI64::new(0),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn set_time(&self, timestamp: Timestamp) {
        self.clock.store(timestamp.as_millis(), Ordering::SeqCst);
    }

    pub fn time(&self) -> Timestamp {
        Timestamp::from_millis(self.clock.load(Ordering::SeqCst))
    }

    pub fn advance_time(&self, millis: i64) {
        self.clock.fetch_add(millis, Ordering::SeqCst);
    }

    /// Latest committed quote, for display. Takes no lock: readers outside an
    /// order see whatever snapshot is current.
    pub fn quote(&self, market_id: MarketId) -> Result<MarketQuote, EngineError> {
        let market = self
            .gateway
            .get_market(market_id)?
            .ok_or(EngineError::MarketNotFound(market_id))?;
        Ok(market.quote)
    }

    pub fn deposit(&self, user_id: UserId, amount: Notional) -> Result<Balance, EngineError> {
        self.locks.with_user_lock(user_id, || {
            let mut balance = self
                .gateway
                .get_balance(user_id)?
                .ok_or(EngineError::BalanceNotFound(user_id))?;

            balance.deposit(amount, self.time());
            let balance = self.gateway.update_balance(&balance)?;

            self.emit_event(EventPayload::Deposit(DepositEvent {
                user_id,
                amount,
                new_balance: balance.available,
            }));

            Ok(balance)
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let start = events.len().saturating_sub(count);
        events[start..].to_vec()
    }

    pub(super) fn next_order_id(&self) -> u64 {
        self.next_order_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(super) fn next_trade_id(&self) -> u64 {
        self.next_trade_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(super) fn emit_event(&self, payload: EventPayload) {
        let id = EventId(self.next_event_id.fetch_add(1, Ordering::SeqCst));
        let event = Event::new(id, self.time(), payload);

        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.push(event);

        if events.len() > self.config.max_events {
            let drain_count = events.len() - self.config.max_events;
            events.drain(0..drain_count);
        }
    }
}

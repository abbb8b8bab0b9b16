// 9.0: the unit of work behind every fill. a settlement touches five records
// (balance, position, market, order, trade); partial application must never
// be observable. writes are staged with the record values needed to undo
// them, then committed in order; the first failure rolls the applied prefix
// back in reverse.
//
// the trade insert is the one write the gateway cannot compensate (there is
// no delete), so it must be staged last: any failure either happens before
// the trade exists or is the trade insert itself.

use crate::balance::Balance;
use crate::market::Market;
use crate::order::Order;
use crate::position::Position;
use crate::store::{LedgerGateway, StorageError};
use crate::trade::Trade;
use serde::{Deserialize, Serialize};
use tracing::error;

/// A single staged write, carrying what rollback needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerWrite {
    UpdateBalance { new: Balance, previous: Balance },
    CreatePosition { new: Position },
    UpdatePosition { new: Position, previous: Position },
    UpdateMarket { new: Market, previous: Market },
    UpdateOrder { new: Order, previous: Order },
    CreateTrade { new: Trade },
}

impl LedgerWrite {
    fn op(&self) -> &'static str {
        match self {
            LedgerWrite::UpdateBalance { .. } => "update_balance",
            LedgerWrite::CreatePosition { .. } => "create_position",
            LedgerWrite::UpdatePosition { .. } => "update_position",
            LedgerWrite::UpdateMarket { .. } => "update_market",
            LedgerWrite::UpdateOrder { .. } => "update_order",
            LedgerWrite::CreateTrade { .. } => "create_trade",
        }
    }
}

#[derive(Debug, Default)]
pub struct SettlementUnit {
    writes: Vec<LedgerWrite>,
}

impl SettlementUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, write: LedgerWrite) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply every staged write, all or nothing. On failure the applied
    /// prefix is rolled back in reverse before the error is returned.
    pub fn commit<G: LedgerGateway + ?Sized>(self, gateway: &G) -> Result<(), StorageError> {
        debug_assert!(
            self.writes
                .iter()
                .position(|w| matches!(w, LedgerWrite::CreateTrade { .. }))
                .map_or(true, |i| i == self.writes.len() - 1),
            "trade insert must be the final staged write"
        );

        let mut applied: Vec<&LedgerWrite> = Vec::with_capacity(self.writes.len());

        for write in &self.writes {
            if let Err(err) = apply(gateway, write) {
                rollback(gateway, &applied);
                return Err(err);
            }
            applied.push(write);
        }

        Ok(())
    }
}

fn apply<G: LedgerGateway + ?Sized>(gateway: &G, write: &LedgerWrite) -> Result<(), StorageError> {
    match write {
        LedgerWrite::UpdateBalance { new, .. } => gateway.update_balance(new).map(|_| ()),
        LedgerWrite::CreatePosition { new } => gateway.create_position(new).map(|_| ()),
        LedgerWrite::UpdatePosition { new, .. } => gateway.update_position(new).map(|_| ()),
        LedgerWrite::UpdateMarket { new, .. } => gateway.update_market(new).map(|_| ()),
        LedgerWrite::UpdateOrder { new, .. } => gateway.update_order(new).map(|_| ()),
        LedgerWrite::CreateTrade { new } => gateway.create_trade(new).map(|_| ()),
    }
}

fn rollback<G: LedgerGateway + ?Sized>(gateway: &G, applied: &[&LedgerWrite]) {
    for write in applied.iter().rev() {
        let result = match write {
            LedgerWrite::UpdateBalance { previous, .. } => {
                gateway.update_balance(previous).map(|_| ())
            }
            // a created position is undone by re-zeroing it: zeroed and
            // absent are the same state in this data model
            LedgerWrite::CreatePosition { new } => gateway
                .update_position(&new.zeroed(new.updated_at))
                .map(|_| ()),
            LedgerWrite::UpdatePosition { previous, .. } => {
                gateway.update_position(previous).map(|_| ())
            }
            LedgerWrite::UpdateMarket { previous, .. } => {
                gateway.update_market(previous).map(|_| ())
            }
            LedgerWrite::UpdateOrder { previous, .. } => {
                gateway.update_order(previous).map(|_| ())
            }
            LedgerWrite::CreateTrade { .. } => Ok(()),
        };

        if let Err(err) = result {
            // the store rejected its own previous value; nothing more this
            // engine can do, repair needs the audit trail
            error!(op = write.op(), %err, "rollback write failed");
        }
    }
}

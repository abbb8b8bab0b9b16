// predict-core: binary-outcome prediction market engine.
// settlement-first architecture: admission, pricing, and the atomic
// five-record settlement take priority. all computation is deterministic.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, UserId, Outcome, Side, Price, Notional
//   2.x  pricing.rs: constant-impact market maker quote function
//   3.x  market.rs: market record, YES/NO quote pair, volume
//   4.x  position.rs: share holdings, weighted-average-cost accounting
//   5.x  balance.rs: per-user cash, debit/credit
//   6.x  order.rs: order request/record, type and status machines
//   6.1  execution.rs: execute-or-rest decision, bound and slippage checks
//   7.x  trade.rs: immutable fill records
//   8.x  engine/: order pipeline: admit -> decide -> reprice -> settle
//   9.x  settlement.rs: staged ledger writes, commit with rollback
//   10.x store.rs: ledger gateway trait + in-memory implementation
//   11.x events.rs: state transition events for audit
//   12.x locks.rs: per-market / per-user serialization

// core trading modules
pub mod balance;
pub mod engine;
pub mod events;
pub mod execution;
pub mod market;
pub mod order;
pub mod position;
pub mod pricing;
pub mod trade;
pub mod types;

// settlement and storage modules
pub mod locks;
pub mod settlement;
pub mod store;

// re exports for convenience
pub use balance::*;
pub use engine::*;
pub use engine::*;
pub use events::*;
pub use execution::*;
pub use market::*;
pub use order::*;
pub use position::*;
pub use pricing::*;
pub use trade::*;
pub use types::*;

pub use locks::LockTable;
pub use settlement::{LedgerWrite, SettlementUnit};
pub use store::{LedgerGateway, MemoryLedger, StorageError};

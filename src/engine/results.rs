// 8.0.2: result types and errors for engine operations.

use crate::balance::BalanceError;
use crate::execution::ExecutionError;
use crate::order::{Order, OrderError};
use crate::position::PositionError;
use crate::store::StorageError;
use crate::trade::Trade;
use crate::types::{MarketId, Price, UserId};

/// What the caller gets back from a submitted order. `executed == false`
/// means the order was admitted but rests pending (limit price not reached).
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub order: Order,
    pub trade: Option<Trade>,
    pub executed: bool,
    pub execution_price: Option<Price>,
    pub message: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error("Market {0:?} is not open for trading")]
    MarketNotActive(MarketId),

    #[error("No balance record for user {0:?}")]
    BalanceNotFound(UserId),

    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Invalid order: {0}")]
    Order(#[from] OrderError),

    #[error("Execution bounds: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

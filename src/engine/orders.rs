//! Order admission and settlement.
//!
//! The whole pipeline for one order runs here: structural checks, market and
//! account snapshots, solvency/share admission, the execution decision,
//! bound and slippage enforcement, and finally the five-record settlement
//! committed as one unit. The market and user locks are held for the entire
//! span, so every check and the settlement see one consistent snapshot.

use super::core::Engine;
use super::results::{EngineError, OrderOutcome};
use crate::balance::{Balance, BalanceError};
use crate::events::{
    EventPayload, OrderAcceptedEvent, OrderRejectedEvent, OrderRestedEvent, PositionClosedEvent,
    PositionOpenedEvent, PositionUpdatedEvent, QuoteUpdatedEvent, TradeExecutedEvent,
};
use crate::execution::{self, ExecutionDecision};
use crate::market::Market;
use crate::order::{Order, OrderRequest};
use crate::position::{self, Position, PositionError};
use crate::pricing;
use crate::settlement::{LedgerWrite, SettlementUnit};
use crate::store::LedgerGateway;
use crate::trade::Trade;
use crate::types::{Notional, OrderId, Price, Side, Timestamp, TradeId};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

impl<G: LedgerGateway> Engine<G> {
    /// Submit an order. Holds the market lock, then the user lock, for the
    /// whole admission-decision-settlement sequence.
    pub fn place_order(&self, request: OrderRequest) -> Result<OrderOutcome, EngineError> {
        // structural problems fail before anything is persisted
        request.validate()?;

        self.locks
            .with_order_locks(request.market_id, request.user_id, || {
                self.admit_and_settle(&request)
            })
    }

    fn admit_and_settle(&self, request: &OrderRequest) -> Result<OrderOutcome, EngineError> {
        let now = self.time();

        let market = self
            .gateway
            .get_market(request.market_id)?
            .ok_or(EngineError::MarketNotFound(request.market_id))?;
        if !market.is_active() {
            return Err(EngineError::MarketNotActive(market.id));
        }

        let balance = self
            .gateway
            .get_balance(request.user_id)?
            .ok_or(EngineError::BalanceNotFound(request.user_id))?;

        let held_position =
            self.gateway
                .get_position(request.user_id, request.market_id, request.outcome)?;

        // one quote snapshot per request; the market lock keeps it current
        // until the settlement commits
        let current = market.price_for(request.outcome);
        let amount = Notional::new(request.amount);

        let order = Order::from_request(OrderId(self.next_order_id()), request, now);
        self.gateway.create_order(&order)?;
        self.emit_event(EventPayload::OrderAccepted(OrderAcceptedEvent {
            order_id: order.id,
            user_id: order.user_id,
            market_id: order.market_id,
            side: order.side,
            outcome: order.outcome,
            amount,
        }));
        debug!(
            order_id = order.id.0,
            market_id = order.market_id.0,
            side = %order.side,
            outcome = %order.outcome,
            amount = %amount,
            "order accepted"
        );

        // fast admission pre-check against the quoted price. the order record
        // stays behind as pending when this rejects.
        if let Err(err) = admission_check(request, &balance, held_position.as_ref(), current) {
            self.reject(&order, &err);
            return Err(err);
        }

        let decision =
            match execution::decide(order.order_type, order.side, order.limit_price, current) {
                Ok(decision) => decision,
                Err(err) => {
                    let err = EngineError::from(err);
                    self.reject(&order, &err);
                    return Err(err);
                }
            };

        let execution_price = match decision {
            ExecutionDecision::Rest => {
                self.emit_event(EventPayload::OrderRested(OrderRestedEvent {
                    order_id: order.id,
                    market_id: order.market_id,
                    limit_price: order.limit_price,
                    quote_price: current,
                }));
                info!(order_id = order.id.0, quote = %current, "limit order resting");
                return Ok(OrderOutcome {
                    order,
                    trade: None,
                    executed: false,
                    execution_price: None,
                    message: "limit price not reached, order resting".to_string(),
                });
            }
            ExecutionDecision::Execute { price } => price,
        };

        if let Err(err) = execution::check_bounds(
            order.side,
            execution_price,
            order.min_price,
            order.max_price,
            current,
            order.max_slippage,
        ) {
            let err = EngineError::from(err);
            self.reject(&order, &err);
            return Err(err);
        }

        // fill size is always derived server-side; callers never supply it
        let shares = amount.value() / execution_price.value();

        self.settle(order, market, balance, held_position, execution_price, shares, amount, now)
    }

    /// Stage and commit the five settlement writes as one unit.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        order: Order,
        market: Market,
        balance: Balance,
        held_position: Option<Position>,
        execution_price: Price,
        shares: Decimal,
        amount: Notional,
        now: Timestamp,
    ) -> Result<OrderOutcome, EngineError> {
        let previous_balance = balance.clone();
        let mut new_balance = balance;

        // position effect plus its audit event, computed up front so any
        // rejection still precedes every write except the order record
        let (position_write, position_event) = match order.side {
            Side::Buy => {
                if let Err(err) = new_balance.debit(amount, now) {
                    let err = EngineError::from(err);
                    self.reject(&order, &err);
                    return Err(err);
                }
                match held_position {
                    Some(previous) => {
                        let next = position::increase_position(&previous, shares, amount, now);
                        let event = EventPayload::PositionUpdated(PositionUpdatedEvent {
                            user_id: order.user_id,
                            market_id: order.market_id,
                            outcome: order.outcome,
                            old_shares: previous.shares,
                            new_shares: next.shares,
                            avg_price: next.avg_price,
                            realized_pnl: Notional::zero(),
                        });
                        (LedgerWrite::UpdatePosition { new: next, previous }, event)
                    }
                    None => {
                        let opened = Position::open(
                            order.user_id,
                            order.market_id,
                            order.outcome,
                            shares,
                            execution_price,
                            amount,
                            now,
                        );
                        let event = EventPayload::PositionOpened(PositionOpenedEvent {
                            user_id: order.user_id,
                            market_id: order.market_id,
                            outcome: order.outcome,
                            shares,
                            entry_price: execution_price,
                            cost: amount,
                        });
                        (LedgerWrite::CreatePosition { new: opened }, event)
                    }
                }
            }
            Side::Sell => {
                // settlement-time re-check, now against the execution price
                let held = held_position.as_ref().map(|p| p.shares).unwrap_or(Decimal::ZERO);
                let Some(previous) = held_position.filter(|_| held >= shares) else {
                    let err = EngineError::from(PositionError::InsufficientShares {
                        requested: shares,
                        held,
                    });
                    self.reject(&order, &err);
                    return Err(err);
                };

                new_balance.credit(amount, now);
                let update = position::decrease_position(&previous, shares, amount, now);
                let event = if update.position.is_flat() {
                    EventPayload::PositionClosed(PositionClosedEvent {
                        user_id: order.user_id,
                        market_id: order.market_id,
                        outcome: order.outcome,
                        exit_price: execution_price,
                        realized_pnl: update.realized_pnl,
                    })
                } else {
                    EventPayload::PositionUpdated(PositionUpdatedEvent {
                        user_id: order.user_id,
                        market_id: order.market_id,
                        outcome: order.outcome,
                        old_shares: previous.shares,
                        new_shares: update.position.shares,
                        avg_price: update.position.avg_price,
                        realized_pnl: update.realized_pnl,
                    })
                };
                (
                    LedgerWrite::UpdatePosition {
                        new: update.position,
                        previous,
                    },
                    event,
                )
            }
        };

        let next_quote = pricing::next_quote(
            &market.quote,
            order.outcome,
            order.side,
            amount.value(),
            &self.config.pricing,
        );
        let previous_market = market.clone();
        let mut new_market = market;
        new_market.apply_trade(next_quote, amount, now);

        let previous_order = order.clone();
        let mut filled_order = order;
        filled_order.mark_filled(shares, execution_price, now);

        let trade = Trade::from_fill(
            TradeId(self.next_trade_id()),
            &filled_order,
            shares,
            execution_price,
            now,
        );

        let mut unit = SettlementUnit::new();
        unit.stage(LedgerWrite::UpdateBalance {
            new: new_balance,
            previous: previous_balance,
        });
        unit.stage(position_write);
        unit.stage(LedgerWrite::UpdateMarket {
            new: new_market.clone(),
            previous: previous_market,
        });
        unit.stage(LedgerWrite::UpdateOrder {
            new: filled_order.clone(),
            previous: previous_order,
        });
        unit.stage(LedgerWrite::CreateTrade { new: trade.clone() });

        if let Err(err) = unit.commit(&self.gateway) {
            warn!(order_id = filled_order.id.0, %err, "settlement rolled back");
            return Err(EngineError::Storage(err));
        }

        self.emit_event(EventPayload::TradeExecuted(TradeExecutedEvent {
            trade_id: trade.id,
            order_id: filled_order.id,
            market_id: filled_order.market_id,
            outcome: filled_order.outcome,
            side: filled_order.side,
            shares,
            price: execution_price,
            notional: amount,
        }));
        self.emit_event(position_event);
        self.emit_event(EventPayload::QuoteUpdated(QuoteUpdatedEvent {
            market_id: new_market.id,
            yes_price: new_market.quote.yes(),
            no_price: new_market.quote.no(),
            volume: new_market.volume,
        }));

        info!(
            order_id = filled_order.id.0,
            trade_id = trade.id.0,
            price = %execution_price,
            shares = %shares,
            "order filled"
        );

        Ok(OrderOutcome {
            order: filled_order,
            trade: Some(trade),
            executed: true,
            execution_price: Some(execution_price),
            message: "order filled".to_string(),
        })
    }

    fn reject(&self, order: &Order, err: &EngineError) {
        warn!(order_id = order.id.0, %err, "order rejected");
        self.emit_event(EventPayload::OrderRejected(OrderRejectedEvent {
            order_id: order.id,
            user_id: order.user_id,
            market_id: order.market_id,
            reason: err.to_string(),
        }));
    }
}

/// Solvency (buy) and share-sufficiency (sell) pre-check against the quoted
/// price. Pure over the supplied snapshots.
fn admission_check(
    request: &OrderRequest,
    balance: &Balance,
    position: Option<&Position>,
    current: Price,
) -> Result<(), EngineError> {
    let amount = Notional::new(request.amount);
    match request.side {
        Side::Buy => {
            if balance.available < amount {
                return Err(BalanceError::InsufficientBalance {
                    requested: amount,
                    available: balance.available,
                }
                .into());
            }
        }
        Side::Sell => {
            let required = request.amount / current.value();
            let held = position.map(|p| p.shares).unwrap_or(Decimal::ZERO);
            if held < required {
                return Err(PositionError::InsufficientShares {
                    requested: required,
                    held,
                }
                .into());
            }
        }
    }
    Ok(())
}

//! End-to-end order flow tests.
//!
//! These tests drive the full admission -> decision -> pricing -> settlement
//! pipeline against the in-memory ledger and verify the cross-record
//! invariants that keep the books consistent.

use predict_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn seeded_engine(funds: Decimal) -> Engine<MemoryLedger> {
    let ledger = MemoryLedger::new();
    ledger.seed_market(Market::new(
        MarketId(1),
        "Will it rain tomorrow?",
        Notional::new(dec!(1000)),
        Timestamp::from_millis(0),
    ));
    for user in [UserId(1), UserId(2), UserId(3)] {
        let mut balance = Balance::new(user, Timestamp::from_millis(0));
        balance.deposit(Notional::new(funds), Timestamp::from_millis(0));
        ledger.seed_balance(balance);
    }
    Engine::new(ledger, EngineConfig::default())
}

fn buy_yes(engine: &Engine<MemoryLedger>, user: UserId, amount: Decimal) -> OrderOutcome {
    engine
        .place_order(OrderRequest::market(user, MarketId(1), Side::Buy, Outcome::Yes, amount))
        .unwrap()
}

#[test]
fn fresh_market_buy_settles_every_record() {
    let engine = seeded_engine(dec!(1000));

    let outcome = buy_yes(&engine, UserId(1), dec!(100));

    assert!(outcome.executed);
    assert_eq!(outcome.execution_price.unwrap().value(), dec!(0.50));

    // fill size derived from notional and price
    assert_eq!(outcome.order.shares, dec!(200));
    assert_eq!(outcome.order.filled_shares, dec!(200));
    assert_eq!(outcome.order.status, OrderStatus::Filled);
    assert_eq!(outcome.order.avg_fill_price.unwrap().value(), dec!(0.50));

    let trade = outcome.trade.unwrap();
    assert_eq!(trade.shares, dec!(200));
    assert_eq!(trade.price.value(), dec!(0.50));
    assert_eq!(trade.notional.value(), dec!(100));
    assert_eq!(trade.buyer_id, Some(UserId(1)));
    assert_eq!(trade.seller_id, None);

    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    assert_eq!(market.quote.yes().value(), dec!(0.52));
    assert_eq!(market.quote.no().value(), dec!(0.48));
    assert_eq!(market.volume.value(), dec!(100));

    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(900));

    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(200));
    assert_eq!(position.avg_price.value(), dec!(0.50));
    assert_eq!(position.total_cost.value(), dec!(100));
}

#[test]
fn partial_sell_releases_basis_at_avg_price() {
    let engine = seeded_engine(dec!(1000));
    buy_yes(&engine, UserId(1), dec!(100)); // 200 shares @ 0.50, quote now 0.52

    let outcome = engine
        .place_order(OrderRequest::market(
            UserId(1),
            MarketId(1),
            Side::Sell,
            Outcome::Yes,
            dec!(52), // 100 shares at the new 0.52 quote
        ))
        .unwrap();

    assert!(outcome.executed);
    assert_eq!(outcome.execution_price.unwrap().value(), dec!(0.52));
    assert_eq!(outcome.order.shares, dec!(100));

    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(952)); // 900 + 52

    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(100));
    // 100 - 100 * 0.50
    assert_eq!(position.total_cost.value(), dec!(50));
    // sells never move the average
    assert_eq!(position.avg_price.value(), dec!(0.50));

    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    assert_eq!(market.volume.value(), dec!(152));
    // selling YES pushes the YES price down: 0.52 - (0.01 + 52/10000)
    assert_eq!(market.quote.yes().value(), dec!(0.5048));
    assert_eq!(market.quote.sum(), dec!(1));
}

#[test]
fn unreachable_limit_buy_rests_without_touching_anything() {
    let engine = seeded_engine(dec!(1000));

    let outcome = engine
        .place_order(OrderRequest::limit(
            UserId(1),
            MarketId(1),
            Side::Buy,
            Outcome::Yes,
            dec!(100),
            Price::new_unchecked(dec!(0.40)),
        ))
        .unwrap();

    assert!(!outcome.executed);
    assert!(outcome.trade.is_none());
    assert!(outcome.execution_price.is_none());
    assert_eq!(outcome.order.status, OrderStatus::Pending);
    assert_eq!(outcome.order.filled_shares, Decimal::ZERO);

    // order persisted as pending
    let stored = engine.gateway().order(outcome.order.id).unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);

    // no trade, no balance, no position, no price change
    assert_eq!(engine.gateway().trade_count(), 0);
    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(1000));
    assert!(engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .is_none());
    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    assert_eq!(market.quote.yes().value(), dec!(0.50));
    assert_eq!(market.volume.value(), dec!(0));
}

#[test]
fn sell_without_position_rejects_and_mutates_nothing() {
    let engine = seeded_engine(dec!(1000));

    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(1),
        Side::Sell,
        Outcome::Yes,
        dec!(50),
    ));

    assert!(matches!(
        result,
        Err(EngineError::Position(PositionError::InsufficientShares { .. }))
    ));

    // the order record is left behind as pending, everything else untouched
    let stored = engine.gateway().order(OrderId(1)).unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.filled_shares, Decimal::ZERO);

    assert_eq!(engine.gateway().trade_count(), 0);
    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(1000));
    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    assert_eq!(market.quote.yes().value(), dec!(0.50));
}

#[test]
fn oversized_sell_rejects_with_insufficient_shares() {
    let engine = seeded_engine(dec!(1000));
    buy_yes(&engine, UserId(1), dec!(100)); // 200 shares

    // quote is 0.52; asking for 200 notional needs ~384 shares
    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(1),
        Side::Sell,
        Outcome::Yes,
        dec!(200),
    ));

    assert!(matches!(
        result,
        Err(EngineError::Position(PositionError::InsufficientShares { .. }))
    ));

    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(200));
}

#[test]
fn buy_beyond_balance_rejects_before_any_write() {
    let engine = seeded_engine(dec!(1000));

    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(1),
        Side::Buy,
        Outcome::Yes,
        dec!(5000),
    ));

    assert!(matches!(
        result,
        Err(EngineError::Balance(BalanceError::InsufficientBalance { .. }))
    ));
    assert_eq!(engine.gateway().trade_count(), 0);
    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(1000));
}

#[test]
fn reachable_limit_buy_executes_at_the_better_price() {
    let engine = seeded_engine(dec!(1000));

    let outcome = engine
        .place_order(OrderRequest::limit(
            UserId(1),
            MarketId(1),
            Side::Buy,
            Outcome::Yes,
            dec!(100),
            Price::new_unchecked(dec!(0.60)),
        ))
        .unwrap();

    assert!(outcome.executed);
    // min(current 0.50, limit 0.60)
    assert_eq!(outcome.execution_price.unwrap().value(), dec!(0.50));
    assert_eq!(outcome.order.shares, dec!(200));
}

#[test]
fn reachable_limit_sell_executes_at_the_quote() {
    let engine = seeded_engine(dec!(1000));
    buy_yes(&engine, UserId(1), dec!(100)); // quote moves to 0.52

    let outcome = engine
        .place_order(OrderRequest::limit(
            UserId(1),
            MarketId(1),
            Side::Sell,
            Outcome::Yes,
            dec!(52),
            Price::new_unchecked(dec!(0.40)),
        ))
        .unwrap();

    assert!(outcome.executed);
    // max(current 0.52, limit 0.40)
    assert_eq!(outcome.execution_price.unwrap().value(), dec!(0.52));
}

#[test]
fn buy_over_max_price_is_rejected() {
    let engine = seeded_engine(dec!(1000));

    let mut request = OrderRequest::market(UserId(1), MarketId(1), Side::Buy, Outcome::Yes, dec!(100));
    request.max_price = Some(Price::new_unchecked(dec!(0.30)));

    let result = engine.place_order(request);
    assert!(matches!(
        result,
        Err(EngineError::Execution(ExecutionError::PriceAboveMax { .. }))
    ));
    assert_eq!(engine.gateway().trade_count(), 0);
}

#[test]
fn sell_under_min_price_is_rejected() {
    let engine = seeded_engine(dec!(1000));
    buy_yes(&engine, UserId(1), dec!(100));

    let mut request = OrderRequest::market(UserId(1), MarketId(1), Side::Sell, Outcome::Yes, dec!(52));
    request.min_price = Some(Price::new_unchecked(dec!(0.90)));

    let result = engine.place_order(request);
    assert!(matches!(
        result,
        Err(EngineError::Execution(ExecutionError::PriceBelowMin { .. }))
    ));

    // position untouched by the rejection
    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    assert_eq!(position.shares, dec!(200));
}

#[test]
fn limit_order_without_price_fails_before_persisting() {
    let engine = seeded_engine(dec!(1000));

    let mut request = OrderRequest::market(UserId(1), MarketId(1), Side::Buy, Outcome::Yes, dec!(100));
    request.order_type = OrderType::Limit;

    let result = engine.place_order(request);
    assert!(matches!(
        result,
        Err(EngineError::Order(OrderError::MissingLimitPrice))
    ));
    // structural failures precede order creation
    assert!(engine.gateway().order(OrderId(1)).is_none());
}

#[test]
fn unknown_market_and_user_are_distinct_errors() {
    let engine = seeded_engine(dec!(1000));

    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(99),
        Side::Buy,
        Outcome::Yes,
        dec!(100),
    ));
    assert!(matches!(result, Err(EngineError::MarketNotFound(MarketId(99)))));

    let result = engine.place_order(OrderRequest::market(
        UserId(99),
        MarketId(1),
        Side::Buy,
        Outcome::Yes,
        dec!(100),
    ));
    assert!(matches!(result, Err(EngineError::BalanceNotFound(UserId(99)))));
}

#[test]
fn resolved_market_refuses_orders() {
    let engine = seeded_engine(dec!(1000));
    let mut market = Market::new(
        MarketId(2),
        "already settled",
        Notional::new(dec!(1000)),
        Timestamp::from_millis(0),
    );
    market.status = MarketStatus::Resolved;
    engine.gateway().seed_market(market);

    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(2),
        Side::Buy,
        Outcome::Yes,
        dec!(100),
    ));
    assert!(matches!(result, Err(EngineError::MarketNotActive(MarketId(2)))));
}

#[test]
fn storage_fault_mid_settlement_rolls_back_cleanly() {
    let engine = seeded_engine(dec!(1000));
    engine.gateway().inject_fault("update_market");

    let result = engine.place_order(OrderRequest::market(
        UserId(1),
        MarketId(1),
        Side::Buy,
        Outcome::Yes,
        dec!(100),
    ));
    assert!(matches!(result, Err(EngineError::Storage(_))));

    // every record back at its pre-order state, order left pending
    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    assert_eq!(balance.available.value(), dec!(1000));
    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    assert_eq!(market.quote.yes().value(), dec!(0.50));
    assert_eq!(market.volume.value(), dec!(0));
    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    assert!(position.is_flat());
    assert_eq!(engine.gateway().trade_count(), 0);
    let order = engine.gateway().order(OrderId(1)).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    // the same order flow succeeds once storage recovers
    engine.gateway().clear_faults();
    let outcome = buy_yes(&engine, UserId(1), dec!(100));
    assert!(outcome.executed);
}

#[test]
fn every_filled_order_has_exactly_one_trade() {
    let engine = seeded_engine(dec!(1000));

    let first = buy_yes(&engine, UserId(1), dec!(100));
    let second = buy_yes(&engine, UserId(2), dec!(40));

    for outcome in [first, second] {
        assert_eq!(outcome.order.status, OrderStatus::Filled);
        assert_eq!(outcome.order.filled_shares, outcome.order.shares);
        let trades = engine.gateway().trades_for_order(outcome.order.id);
        assert_eq!(trades.len(), 1);
    }
}

#[test]
fn deposit_credits_balance_and_emits_event() {
    let engine = seeded_engine(dec!(1000));

    let balance = engine.deposit(UserId(1), Notional::new(dec!(250))).unwrap();
    assert_eq!(balance.available.value(), dec!(1250));

    let events = engine.recent_events(1);
    assert!(matches!(events[0].payload, EventPayload::Deposit(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariants survive arbitrary order flow: the quote pair sums to one,
    /// balances and positions stay non-negative, and volume equals the sum
    /// of executed notionals.
    #[test]
    fn random_order_flow_preserves_invariants(
        orders in proptest::collection::vec(
            (
                1u64..=3u64,
                prop_oneof![Just(Outcome::Yes), Just(Outcome::No)],
                any::<bool>(),
                1i64..=20_000i64,
            ),
            1..40,
        ),
    ) {
        let engine = seeded_engine(dec!(10000));
        let mut executed_notional = Decimal::ZERO;

        for (user, outcome, is_buy, amount_raw) in orders {
            let side = if is_buy { Side::Buy } else { Side::Sell };
            let amount = Decimal::new(amount_raw, 2);
            let request = OrderRequest::market(UserId(user), MarketId(1), side, outcome, amount);

            // rejections (no shares, no funds) are expected flow here
            if let Ok(fill) = engine.place_order(request) {
                if fill.executed {
                    executed_notional += amount;
                }
            }

            let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
            prop_assert_eq!(market.quote.sum(), dec!(1));
            prop_assert!(market.quote.yes().value() >= dec!(0.05));
            prop_assert!(market.quote.yes().value() <= dec!(0.95));
        }

        let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
        prop_assert_eq!(market.volume.value(), executed_notional);

        for user in [UserId(1), UserId(2), UserId(3)] {
            let balance = engine.gateway().get_balance(user).unwrap().unwrap();
            prop_assert!(!balance.available.is_negative());

            for outcome in [Outcome::Yes, Outcome::No] {
                if let Some(position) =
                    engine.gateway().get_position(user, MarketId(1), outcome).unwrap()
                {
                    prop_assert!(position.shares >= Decimal::ZERO);
                    prop_assert!(!position.total_cost.is_negative());
                }
            }
        }
    }
}

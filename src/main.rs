//! Prediction Market Core Simulation.
//!
//! Walks the engine through the full order lifecycle: fresh-market buys,
//! partial and full sells, resting limit orders, rejection paths, and a
//! multi-threaded contention run over the serialization boundaries.

use predict_core::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Prediction Market Core Engine Simulation");
    println!("Single Market, User-vs-AMM, Atomic Settlement\n");

    scenario_1_fresh_market_buy();
    scenario_2_position_roundtrip();
    scenario_3_resting_limit_order();
    scenario_4_rejections();
    scenario_5_contention();

    println!("\nAll simulations completed successfully.");
}

fn seeded_engine() -> Engine<MemoryLedger> {
    let ledger = MemoryLedger::new();
    ledger.seed_market(Market::new(
        MarketId(1),
        "Will it rain tomorrow?",
        Notional::new(dec!(1000)),
        Timestamp::from_millis(0),
    ));
    ledger.seed_balance(Balance::new(UserId(1), Timestamp::from_millis(0)));
    ledger.seed_balance(Balance::new(UserId(2), Timestamp::from_millis(0)));

    let engine = Engine::new(ledger, EngineConfig::default());
    engine.set_time(Timestamp::now());
    engine.deposit(UserId(1), Notional::new(dec!(1000))).unwrap();
    engine.deposit(UserId(2), Notional::new(dec!(1000))).unwrap();
    engine
}

/// A market buy against a fresh market at even odds.
fn scenario_1_fresh_market_buy() {
    println!("Scenario 1: Fresh Market Buy\n");

    let engine = seeded_engine();
    println!("  Market opens at YES 0.50 / NO 0.50, user 1 deposits $1,000");

    let outcome = engine
        .place_order(OrderRequest::market(
            UserId(1),
            MarketId(1),
            Side::Buy,
            Outcome::Yes,
            dec!(100),
        ))
        .unwrap();

    let trade = outcome.trade.unwrap();
    println!(
        "  BUY $100 YES filled: {} shares @ {}",
        trade.shares, trade.price
    );

    let quote = engine.quote(MarketId(1)).unwrap();
    println!("  New quote: YES {} / NO {}", quote.yes(), quote.no());

    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    println!(
        "  Balance ${}, position {} shares @ avg {} (cost ${})\n",
        balance.available, position.shares, position.avg_price, position.total_cost
    );
}

/// Buy, partial sell, then full close.
fn scenario_2_position_roundtrip() {
    println!("Scenario 2: Position Roundtrip\n");

    let engine = seeded_engine();

    engine
        .place_order(OrderRequest::market(
            UserId(1),
            MarketId(1),
            Side::Buy,
            Outcome::Yes,
            dec!(100),
        ))
        .unwrap();
    println!("  Opened 200 YES shares @ 0.50");

    let quote = engine.quote(MarketId(1)).unwrap();
    let sell_notional = dec!(100) * quote.yes().value();
    let outcome = engine
        .place_order(OrderRequest::market(
            UserId(1),
            MarketId(1),
            Side::Sell,
            Outcome::Yes,
            sell_notional,
        ))
        .unwrap();
    println!(
        "  Sold 100 shares for ${} @ {}",
        sell_notional,
        outcome.execution_price.unwrap()
    );

    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    println!(
        "  Remaining: {} shares, cost ${}, avg {}",
        position.shares, position.total_cost, position.avg_price
    );

    let quote = engine.quote(MarketId(1)).unwrap();
    let close_notional = position.shares * quote.yes().value();
    engine
        .place_order(OrderRequest::market(
            UserId(1),
            MarketId(1),
            Side::Sell,
            Outcome::Yes,
            close_notional,
        ))
        .unwrap();

    let position = engine
        .gateway()
        .get_position(UserId(1), MarketId(1), Outcome::Yes)
        .unwrap()
        .unwrap();
    let balance = engine.gateway().get_balance(UserId(1)).unwrap().unwrap();
    println!(
        "  Closed out: {} shares, cost ${}, final balance ${}\n",
        position.shares, position.total_cost, balance.available
    );
}

/// A limit buy below the market rests as pending.
fn scenario_3_resting_limit_order() {
    println!("Scenario 3: Resting Limit Order\n");

    let engine = seeded_engine();

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

    println!(
        "  Limit BUY @ 0.40 with quote at 0.50: executed = {}",
        outcome.executed
    );
    println!("  Order status: {:?}, message: {}", outcome.order.status, outcome.message);

    let quote = engine.quote(MarketId(1)).unwrap();
    println!("  Quote unchanged: YES {} / NO {}\n", quote.yes(), quote.no());
}

/// Rejection paths leave every ledger untouched.
fn scenario_4_rejections() {
    println!("Scenario 4: Rejections\n");

    let engine = seeded_engine();

    let result = engine.place_order(OrderRequest::market(
        UserId(2),
        MarketId(1),
        Side::Sell,
        Outcome::Yes,
        dec!(50),
    ));
    println!("  Sell with no position: {}", result.unwrap_err());

    let result = engine.place_order(OrderRequest::market(
        UserId(2),
        MarketId(1),
        Side::Buy,
        Outcome::Yes,
        dec!(5000),
    ));
    println!("  Buy beyond balance: {}", result.unwrap_err());

    let mut request = OrderRequest::market(UserId(2), MarketId(1), Side::Buy, Outcome::Yes, dec!(100));
    request.max_price = Some(Price::new_unchecked(dec!(0.30)));
    let result = engine.place_order(request);
    println!("  Buy over max price: {}", result.unwrap_err());

    let balance = engine.gateway().get_balance(UserId(2)).unwrap().unwrap();
    println!("  User 2 balance untouched: ${}\n", balance.available);
}

/// Concurrent orders on one market serialize; nothing is lost or overdrawn.
fn scenario_5_contention() {
    println!("Scenario 5: Concurrent Orders\n");

    let engine = Arc::new(seeded_engine());
    let num_threads = 8;

    thread::scope(|s| {
        for i in 0..num_threads {
            let engine = Arc::clone(&engine);
            s.spawn(move || {
                let user = if i % 2 == 0 { UserId(1) } else { UserId(2) };
                let outcome = if i % 2 == 0 { Outcome::Yes } else { Outcome::No };
                let _ = engine.place_order(OrderRequest::market(
                    user,
                    MarketId(1),
                    Side::Buy,
                    outcome,
                    dec!(50),
                ));
            });
        }
    });

    let quote = engine.quote(MarketId(1)).unwrap();
    let market = engine.gateway().get_market(MarketId(1)).unwrap().unwrap();
    println!("  {} threads traded against market 1", num_threads);
    println!("  Final quote: YES {} / NO {}", quote.yes(), quote.no());
    println!("  Quote sum: {}", quote.sum());
    println!("  Volume recorded: ${}", market.volume);
    println!("  Events captured: {}", engine.events().len());
}

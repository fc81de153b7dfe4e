//! State machine tests for the single-symbol quote subscription.

mod common;

use rust_decimal_macros::dec;

use coinwatch::feed::{
    ConnectionId, FEED_ERROR, QuoteSnapshot, QuoteSubscription, SubscriptionState,
    TransportEvent,
};
use coinwatch::models::trade::Quote;

use common::{Call, MockConnector, Recorder, subscribe, unsubscribe};

const TOKEN: &str = "test-token";

fn manager() -> (QuoteSubscription<MockConnector>, Recorder) {
    let (connector, recorder) = MockConnector::new();
    (QuoteSubscription::new(connector), recorder)
}

/// Selects `symbol` and completes the handshake of the resulting transport.
fn go_live(
    manager: &mut QuoteSubscription<MockConnector>,
    recorder: &Recorder,
    symbol: &str,
) -> ConnectionId {
    manager.set_target(Some(symbol), TOKEN);
    let id = recorder.last_opened().expect("no transport opened");
    manager.handle_event(id, TransportEvent::Open);
    assert_eq!(manager.state(), SubscriptionState::Live);
    id
}

fn trade(body: &str) -> TransportEvent {
    TransportEvent::Message(body.to_string())
}

#[test]
fn test_starts_idle_without_connecting() {
    let (manager, recorder) = manager();

    assert_eq!(manager.state(), SubscriptionState::Idle);
    assert_eq!(manager.snapshot(), QuoteSnapshot::default());
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_symbol_opens_transport_and_open_sends_subscribe() {
    let (mut manager, recorder) = manager();

    manager.set_target(Some("AAPL"), TOKEN);
    assert_eq!(manager.state(), SubscriptionState::Connecting);
    assert_eq!(manager.active_symbol(), Some("AAPL"));
    assert!(!manager.snapshot().connected);
    assert_eq!(recorder.calls(), vec![Call::Open(ConnectionId(0), TOKEN.to_string())]);

    manager.handle_event(ConnectionId(0), TransportEvent::Open);

    assert_eq!(manager.state(), SubscriptionState::Live);
    assert!(manager.snapshot().connected);
    assert_eq!(
        recorder.calls()[1],
        Call::Send(ConnectionId(0), subscribe("AAPL"))
    );
}

#[test]
fn test_never_more_than_one_transport_alive() {
    let (mut manager, recorder) = manager();

    for symbol in ["AAPL", "MSFT", "BINANCE:BTCUSDT", "TSLA"] {
        go_live(&mut manager, &recorder, symbol);
        assert_eq!(recorder.live(), 1);
    }
    // Switch while still connecting.
    manager.set_target(Some("NVDA"), TOKEN);
    manager.set_target(Some("AMZN"), TOKEN);
    assert_eq!(recorder.live(), 1);

    manager.set_target(None, TOKEN);
    assert_eq!(recorder.live(), 0);
    assert_eq!(recorder.max_live(), 1);
}

#[test]
fn test_switching_unsubscribes_and_closes_before_subscribing_next() {
    let (mut manager, recorder) = manager();
    let first = go_live(&mut manager, &recorder, "AAPL");

    manager.set_target(Some("MSFT"), TOKEN);
    let second = recorder.last_opened().unwrap();
    assert_ne!(first, second);
    manager.handle_event(second, TransportEvent::Open);

    let unsubscribed = recorder.position(&Call::Send(first, unsubscribe("AAPL"))).unwrap();
    let closed = recorder.position(&Call::Close(first)).unwrap();
    let opened = recorder
        .position(&Call::Open(second, TOKEN.to_string()))
        .unwrap();
    let subscribed = recorder.position(&Call::Send(second, subscribe("MSFT"))).unwrap();

    assert!(unsubscribed < closed);
    assert!(closed < opened);
    assert!(opened < subscribed);
}

#[test]
fn test_last_trade_in_batch_becomes_quote() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.handle_event(
        id,
        trade(r#"{"type":"trade","data":[{"p":100,"t":1000},{"p":101,"t":2000}]}"#),
    );

    assert_eq!(
        manager.snapshot().quote,
        Some(Quote {
            symbol: "AAPL".to_string(),
            price: dec!(101),
            bid: None,
            ask: None,
            timestamp: Some(2000),
        })
    );
}

#[test]
fn test_unreadable_earlier_records_do_not_block_latest_trade() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.handle_event(
        id,
        trade(r#"{"type":"trade","data":[{"p":null,"t":1},{"p":189.75,"t":2}]}"#),
    );

    let quote = manager.snapshot().quote.unwrap();
    assert_eq!(quote.price, dec!(189.75));
    assert_eq!(quote.timestamp, Some(2));
}

#[test]
fn test_quote_copies_bid_and_ask() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "BINANCE:BTCUSDT");

    let body = r#"{"type":"trade","data":[{
        "p":64000.5,"b":64000.1,"a":64000.9,"t":1700000000000,"s":"BINANCE:BTCUSDT","v":0.01
    }]}"#;
    manager.handle_event(id, trade(body));

    let quote = manager.snapshot().quote.unwrap();
    assert_eq!(quote.symbol, "BINANCE:BTCUSDT");
    assert_eq!(quote.price, dec!(64000.5));
    assert_eq!(quote.bid, Some(dec!(64000.1)));
    assert_eq!(quote.ask, Some(dec!(64000.9)));
    assert_eq!(quote.timestamp, Some(1_700_000_000_000));
}

#[test]
fn test_non_trade_and_malformed_messages_change_nothing() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");
    manager.handle_event(id, trade(r#"{"type":"trade","data":[{"p":5}]}"#));
    let before = manager.snapshot();

    for body in [
        r#"{"type":"ping"}"#,
        r#"{"type":"trade","data":[]}"#,
        r#"{"type":"trade"}"#,
        r#"{"type":"error","msg":"Subscribing to too many symbols"}"#,
        r#"{"type":"trade","data":[{"t":1}]}"#,
        "garbage",
    ] {
        manager.handle_event(id, trade(body));
        assert_eq!(manager.snapshot(), before, "changed by {body}");
        assert_eq!(manager.state(), SubscriptionState::Live);
    }
}

#[test]
fn test_error_signal_flags_fixed_message() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.handle_event(id, TransportEvent::Error("connection reset".to_string()));

    let snapshot = manager.snapshot();
    assert!(!snapshot.connected);
    assert_eq!(snapshot.error.as_deref(), Some(FEED_ERROR));
    // An error alone does not release the transport.
    assert_eq!(recorder.live(), 1);
}

#[test]
fn test_error_while_connecting_flags_fixed_message() {
    let (mut manager, recorder) = manager();
    manager.set_target(Some("AAPL"), TOKEN);
    let id = recorder.last_opened().unwrap();

    manager.handle_event(id, TransportEvent::Error("handshake failed".to_string()));

    assert!(!manager.snapshot().connected);
    assert_eq!(manager.snapshot().error.as_deref(), Some(FEED_ERROR));
}

#[test]
fn test_close_disconnects_and_ignores_later_messages() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.handle_event(id, TransportEvent::Close);
    assert_eq!(manager.state(), SubscriptionState::Closed);
    assert!(!manager.snapshot().connected);
    assert_eq!(recorder.live(), 0);

    manager.handle_event(id, trade(r#"{"type":"trade","data":[{"p":1,"t":1}]}"#));
    assert!(manager.snapshot().quote.is_none());
}

#[test]
fn test_clearing_symbol_unsubscribes_then_closes() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "BINANCE:BTCUSDT");

    manager.set_target(None, TOKEN);

    let calls = recorder.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[
            Call::Send(id, unsubscribe("BINANCE:BTCUSDT")),
            Call::Close(id)
        ]
    );
    assert_eq!(recorder.live(), 0);
    assert_eq!(manager.state(), SubscriptionState::Idle);
    assert!(!manager.snapshot().connected);
}

#[test]
fn test_same_target_while_live_is_a_noop() {
    let (mut manager, recorder) = manager();
    go_live(&mut manager, &recorder, "AAPL");
    let calls = recorder.calls();

    manager.set_target(Some("AAPL"), TOKEN);
    manager.set_target(Some("  AAPL "), TOKEN);

    assert_eq!(recorder.calls(), calls);
    assert_eq!(manager.state(), SubscriptionState::Live);
}

#[test]
fn test_credential_change_reconnects() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.set_target(Some("AAPL"), "rotated-token");

    assert!(recorder.position(&Call::Close(id)).is_some());
    assert_eq!(
        recorder.calls().last(),
        Some(&Call::Open(ConnectionId(1), "rotated-token".to_string()))
    );
}

#[test]
fn test_switching_while_connecting_closes_without_unsubscribe() {
    let (mut manager, recorder) = manager();
    manager.set_target(Some("AAPL"), TOKEN);

    manager.set_target(Some("MSFT"), TOKEN);

    assert_eq!(
        recorder.calls(),
        vec![
            Call::Open(ConnectionId(0), TOKEN.to_string()),
            Call::Close(ConnectionId(0)),
            Call::Open(ConnectionId(1), TOKEN.to_string()),
        ]
    );
}

#[test]
fn test_events_from_replaced_connection_are_ignored() {
    let (mut manager, recorder) = manager();
    let old = go_live(&mut manager, &recorder, "AAPL");
    manager.set_target(Some("MSFT"), TOKEN);
    let new = recorder.last_opened().unwrap();

    manager.handle_event(old, trade(r#"{"type":"trade","data":[{"p":1}]}"#));
    manager.handle_event(old, TransportEvent::Error("late".to_string()));
    manager.handle_event(old, TransportEvent::Close);

    assert_eq!(manager.state(), SubscriptionState::Connecting);
    assert!(manager.snapshot().error.is_none());
    assert!(manager.snapshot().quote.is_none());

    manager.handle_event(new, TransportEvent::Open);
    assert!(manager.snapshot().connected);
}

#[test]
fn test_messages_before_open_are_ignored() {
    let (mut manager, recorder) = manager();
    manager.set_target(Some("AAPL"), TOKEN);
    let id = recorder.last_opened().unwrap();

    manager.handle_event(id, trade(r#"{"type":"trade","data":[{"p":1}]}"#));

    assert!(manager.snapshot().quote.is_none());
}

#[test]
fn test_stale_quote_kept_until_new_symbol_trades() {
    let (mut manager, recorder) = manager();
    let first = go_live(&mut manager, &recorder, "AAPL");
    manager.handle_event(first, trade(r#"{"type":"trade","data":[{"p":190}]}"#));

    let second = go_live(&mut manager, &recorder, "MSFT");
    assert_eq!(manager.snapshot().quote.unwrap().symbol, "AAPL");

    manager.handle_event(second, trade(r#"{"type":"trade","data":[{"p":410}]}"#));
    let quote = manager.snapshot().quote.unwrap();
    assert_eq!(quote.symbol, "MSFT");
    assert_eq!(quote.price, dec!(410));
}

#[test]
fn test_new_attempt_clears_previous_error() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");
    manager.handle_event(id, TransportEvent::Error("boom".to_string()));
    manager.handle_event(id, TransportEvent::Close);

    manager.set_target(Some("MSFT"), TOKEN);

    assert!(manager.snapshot().error.is_none());
    assert_eq!(manager.state(), SubscriptionState::Connecting);
}

#[test]
fn test_resupplying_symbol_after_close_reconnects() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");
    manager.handle_event(id, TransportEvent::Close);

    manager.set_target(Some("AAPL"), TOKEN);

    assert_eq!(manager.state(), SubscriptionState::Connecting);
    assert_eq!(recorder.last_opened(), Some(ConnectionId(1)));
}

#[test]
fn test_refresh_fully_closes_before_reopening() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");
    manager.handle_event(id, TransportEvent::Error("boom".to_string()));

    manager.refresh();

    let calls = recorder.calls();
    assert_eq!(
        &calls[calls.len() - 3..],
        &[
            Call::Send(id, unsubscribe("AAPL")),
            Call::Close(id),
            Call::Open(ConnectionId(1), TOKEN.to_string()),
        ]
    );
    assert!(manager.snapshot().error.is_none());
    assert_eq!(recorder.max_live(), 1);
}

#[test]
fn test_refresh_while_idle_does_nothing() {
    let (mut manager, recorder) = manager();

    manager.refresh();

    assert!(recorder.calls().is_empty());
    assert_eq!(manager.state(), SubscriptionState::Idle);
}

#[test]
fn test_blank_symbol_or_credential_stays_idle() {
    let (mut manager, recorder) = manager();

    manager.set_target(Some("   "), TOKEN);
    manager.set_target(Some("AAPL"), "");

    assert!(recorder.calls().is_empty());
    assert_eq!(manager.state(), SubscriptionState::Idle);
}

#[test]
fn test_blank_credential_tears_down_live_subscription() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    manager.set_target(Some("AAPL"), "");

    assert_eq!(recorder.calls().last(), Some(&Call::Close(id)));
    assert_eq!(manager.state(), SubscriptionState::Idle);
}

#[test]
fn test_open_failure_is_reported_as_error() {
    let (mut manager, recorder) = manager();
    recorder.fail_next_open();

    manager.set_target(Some("AAPL"), TOKEN);

    assert_eq!(manager.state(), SubscriptionState::Closed);
    assert!(!manager.snapshot().connected);
    assert_eq!(manager.snapshot().error.as_deref(), Some(FEED_ERROR));

    // The caller retries by supplying the symbol again.
    manager.set_target(Some("AAPL"), TOKEN);
    assert_eq!(manager.state(), SubscriptionState::Connecting);
    assert!(manager.snapshot().error.is_none());
}

#[test]
fn test_drop_releases_live_transport() {
    let (mut manager, recorder) = manager();
    let id = go_live(&mut manager, &recorder, "AAPL");

    drop(manager);

    let calls = recorder.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[Call::Send(id, unsubscribe("AAPL")), Call::Close(id)]
    );
    assert_eq!(recorder.live(), 0);
}

#[test]
fn test_watchers_see_quote_updates() {
    let (mut manager, recorder) = manager();
    let mut watcher = manager.subscribe();
    let id = go_live(&mut manager, &recorder, "AAPL");
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().connected);

    manager.handle_event(id, trade(r#"{"type":"ping"}"#));
    assert!(!watcher.has_changed().unwrap());

    manager.handle_event(id, trade(r#"{"type":"trade","data":[{"p":7}]}"#));
    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().quote.as_ref().unwrap().price, dec!(7));
}

//! End-to-end tests against an in-process market socket.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Instant;

use vaportrader_core::protocol::PresenceStatus;
use vaportrader_socket::transport::ConnectionState;
use vaportrader_socket::MarketClient;

use mock_market::{new_message, new_order, MockMarket, Session, TOKEN};

async fn connected(market: &MockMarket, client: &MarketClient) -> Session {
    let (session, res) = tokio::join!(market.accept(), client.connect());
    res.unwrap();
    session
}

async fn wait_for_state(client: &MarketClient, want: impl Fn(ConnectionState) -> bool) {
    let mut state = client.state();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| want(*s)))
        .await
        .expect("state never reached")
        .unwrap();
}

#[tokio::test]
async fn connect_sends_cookie_feeds_then_status() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();

    let mut session = connected(&market, &client).await;
    assert_eq!(session.cookie.as_deref(), Some("JWT=secret-jwt"));
    assert_eq!(*client.state().borrow(), ConnectionState::Connected);

    let frames = session.handshake(3).await;
    assert_eq!(frames[0], json!({"type": "@WS/SUBSCRIBE/MOST_RECENT"}));
    assert_eq!(frames[1], json!({"type": "@WS/USER/SET_STATUS", "payload": "invisible"}));
    assert_eq!(frames[2], json!({"type": "@WS/USER/SET_STATUS", "payload": "online"}));

    client.shutdown().await;
    assert_eq!(*client.state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn confirmed_send_resolves_with_the_market_ack() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();
    let mut session = connected(&market, &client).await;
    session.handshake(3).await;

    let sender = client.clone();
    let send = tokio::spawn(async move { sender.send_with_confirmation("wtb serration 30p", "c-1").await });

    let payload = session.ack_next_send().await;
    assert_eq!(payload["chat_id"], "c-1");
    assert_eq!(payload["message"], "wtb serration 30p");

    let ack = send.await.unwrap().unwrap();
    assert!(ack.success);
    assert_eq!(ack.temp_id, payload["temp_id"].as_str().unwrap());
    let stored = ack.message.unwrap();
    assert_eq!(stored.raw_message, "wtb serration 30p");
    assert_eq!(client.pending_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn unacknowledged_send_fails_after_the_ack_timeout() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();
    let mut session = connected(&market, &client).await;
    session.handshake(3).await;

    let started = Instant::now();
    let sender = client.clone();
    let send = tokio::spawn(async move { sender.send_with_temp_id("hello", "c-1", "abc123").await });

    let frame = session.recv().await;
    assert_eq!(frame["payload"]["temp_id"], "abc123");

    let ack = send.await.unwrap().unwrap();
    let waited = started.elapsed();
    assert!(!ack.success);
    assert_eq!(ack.temp_id, "abc123");
    assert!(ack.message.is_none());
    assert!(waited >= Duration::from_millis(300), "{waited:?}");
    assert!(waited < Duration::from_millis(1500), "{waited:?}");

    // A late acknowledgment is dropped without effect.
    session
        .send(json!({"type": "@WS/chats/MESSAGE_SENT", "payload": {"temp_id": "abc123"}}))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.pending_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn junk_and_unknown_frames_do_not_stop_the_reader() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();

    let (tx, mut orders) = mpsc::unbounded_channel();
    client.set_order_hook(move |order| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(order.id);
        }
    });

    let mut session = connected(&market, &client).await;
    session.handshake(3).await;

    session.send(json!({"type": "@WS/chats/TYPING", "payload": {"chat_id": "c-1"}})).await;
    session.send_raw("{not json").await;
    session
        .send(json!({"type": "@WS/SUBSCRIPTIONS/MOST_RECENT/NEW_ORDER", "payload": {"order": 7}}))
        .await;
    session.send(new_order("MOST_RECENT", "o-1")).await;

    let id = tokio::time::timeout(Duration::from_secs(2), orders.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, "o-1");
    assert_eq!(*client.state().borrow(), ConnectionState::Connected);

    client.shutdown().await;
}

#[tokio::test]
async fn private_hook_marks_read_replies_and_shadows_new_message_hook() {
    let market = MockMarket::bind().await;
    let mut cfg = market.config();
    cfg.pending.ack_timeout_ms = 2000;
    cfg.socket.reply_footer = Some("-- vaportrader".into());
    let client = MarketClient::new(cfg, TOKEN).unwrap();

    let (plain_tx, mut plain) = mpsc::unbounded_channel::<String>();
    client.set_new_message_hook(move |msg| {
        let tx = plain_tx.clone();
        async move {
            let _ = tx.send(msg.id);
        }
    });

    let (acks_tx, mut acks) = mpsc::unbounded_channel();
    client.set_private_message_hook(move |pm| {
        let tx = acks_tx.clone();
        async move {
            assert_eq!(pm.text(), "ping");
            assert_eq!(pm.author(), "u-9");
            let ack = pm.reply("pong").await;
            let _ = tx.send(ack);
        }
    });

    let mut session = connected(&market, &client).await;
    session.handshake(3).await;
    session.send(new_message("m-1", "u-9", "ping")).await;

    let receipt = session.recv().await;
    assert_eq!(
        receipt,
        json!({"type": "@WS/chats/MESSAGE_WAS_READ", "payload": {"message_id": "m-1"}})
    );

    let reply = session.ack_next_send().await;
    assert_eq!(reply["chat_id"], "c-1");
    assert_eq!(reply["message"], "pong\n\n-- vaportrader");

    let ack = tokio::time::timeout(Duration::from_secs(2), acks.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(ack.success);
    assert!(plain.try_recv().is_err());

    client.shutdown().await;
}

#[tokio::test]
async fn new_message_hook_gets_plain_messages_without_receipt() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();

    let (tx, mut got) = mpsc::unbounded_channel();
    client.set_new_message_hook(move |msg| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(msg.raw_message);
        }
    });

    let mut session = connected(&market, &client).await;
    session.handshake(3).await;
    session.send(new_message("m-2", "u-9", "hello")).await;

    let text = tokio::time::timeout(Duration::from_secs(2), got.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(text, "hello");
    session.expect_silence(Duration::from_millis(100)).await;

    client.shutdown().await;
}

#[tokio::test]
async fn reconnect_reapplies_feeds_and_status_and_keeps_hooks() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();

    let (tx, mut orders) = mpsc::unbounded_channel();
    client.set_order_hook(move |order| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(order.id);
        }
    });

    let mut first = connected(&market, &client).await;
    first.handshake(3).await;

    client.set_status(PresenceStatus::InGame).await.unwrap();
    client.subscribe("WTB").await.unwrap();
    assert_eq!(
        first.recv().await,
        json!({"type": "@WS/USER/SET_STATUS", "payload": "ingame"})
    );
    assert_eq!(first.recv().await, json!({"type": "@WS/SUBSCRIBE/WTB"}));

    first.close().await;
    let mut second = market.accept().await;
    assert_eq!(second.cookie.as_deref(), Some("JWT=secret-jwt"));

    let frames = second.handshake(4).await;
    assert_eq!(frames[0], json!({"type": "@WS/SUBSCRIBE/MOST_RECENT"}));
    assert_eq!(frames[1], json!({"type": "@WS/SUBSCRIBE/WTB"}));
    assert_eq!(frames[2], json!({"type": "@WS/USER/SET_STATUS", "payload": "invisible"}));
    assert_eq!(frames[3], json!({"type": "@WS/USER/SET_STATUS", "payload": "ingame"}));
    wait_for_state(&client, |s| s == ConnectionState::Connected).await;
    assert_eq!(client.status(), PresenceStatus::InGame);

    second.send(new_order("WTB", "o-2")).await;
    let id = tokio::time::timeout(Duration::from_secs(2), orders.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, "o-2");

    client.shutdown().await;
}

#[tokio::test]
async fn frames_queued_while_offline_go_out_after_reconnect() {
    let market = MockMarket::bind().await;
    let client = MarketClient::new(market.config(), TOKEN).unwrap();

    let mut first = connected(&market, &client).await;
    first.handshake(3).await;
    first.close().await;
    // The redial starts at once and parks until the next accept.
    wait_for_state(&client, |s| s != ConnectionState::Connected).await;

    client.mark_read("m-7").await.unwrap();

    let mut second = market.accept().await;
    second.handshake(3).await;
    assert_eq!(
        second.recv().await,
        json!({"type": "@WS/chats/MESSAGE_WAS_READ", "payload": {"message_id": "m-7"}})
    );

    client.shutdown().await;
}

#[tokio::test]
async fn concurrent_sends_resolve_independently() {
    const N: usize = 20;

    let market = MockMarket::bind().await;
    let mut cfg = market.config();
    cfg.pending.ack_timeout_ms = 5000;
    let client = MarketClient::new(cfg, TOKEN).unwrap();
    let mut session = connected(&market, &client).await;
    session.handshake(3).await;

    let sends: Vec<_> = (0..N)
        .map(|i| {
            let c = client.clone();
            tokio::spawn(async move { (i, c.send_with_confirmation(format!("msg-{i}"), "c-1").await) })
        })
        .collect();

    let mut payloads = Vec::with_capacity(N);
    for _ in 0..N {
        let frame = session.recv().await;
        payloads.push(frame["payload"].clone());
    }
    let temp_ids: HashSet<_> = payloads.iter().map(|p| p["temp_id"].as_str().unwrap().to_string()).collect();
    assert_eq!(temp_ids.len(), N);

    // Answer in reverse order; every caller must still get its own message back.
    for p in payloads.iter().rev() {
        session.send(mock_market::message_sent(p)).await;
    }

    for send in sends {
        let (i, ack) = send.await.unwrap();
        let ack = ack.unwrap();
        assert!(ack.success);
        assert_eq!(ack.message.unwrap().raw_message, format!("msg-{i}"));
    }
    assert_eq!(client.pending_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn shutdown_fails_outstanding_sends() {
    let market = MockMarket::bind().await;
    let mut cfg = market.config();
    cfg.pending.ack_timeout_ms = 30000;
    let client = MarketClient::new(cfg, TOKEN).unwrap();
    let mut session = connected(&market, &client).await;
    session.handshake(3).await;

    let sender = client.clone();
    let send = tokio::spawn(async move { sender.send_with_temp_id("hi", "c-1", "t-1").await });
    session.recv().await;

    client.shutdown().await;
    let ack = tokio::time::timeout(Duration::from_secs(2), send)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(ack.temp_id, "t-1");
    assert!(!ack.success);
    assert_eq!(*client.state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn reconnect_does_not_restart_a_pending_send_clock() {
    let market = MockMarket::bind().await;
    let mut cfg = market.config();
    cfg.pending.ack_timeout_ms = 400;
    let client = MarketClient::new(cfg, TOKEN).unwrap();
    let mut first = connected(&market, &client).await;
    first.handshake(3).await;

    let started = Instant::now();
    let sender = client.clone();
    let send = tokio::spawn(async move { sender.send_with_temp_id("hi", "c-1", "t-old").await });
    assert_eq!(first.recv().await["payload"]["temp_id"], "t-old");

    first.close().await;
    // The redial parks in the backlog until accepted.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let mut second = market.accept().await;
    second.handshake(3).await;
    let reconnected_at = started.elapsed();

    let ack = send.await.unwrap().unwrap();
    let waited = started.elapsed();
    assert!(!ack.success);
    assert_eq!(ack.temp_id, "t-old");
    assert!(waited >= Duration::from_millis(400), "{waited:?}");
    assert!(
        waited < reconnected_at + Duration::from_millis(400),
        "waited {waited:?}, reconnected at {reconnected_at:?}"
    );

    // Sends made on the new connection still resolve.
    let sender = client.clone();
    let fresh = tokio::spawn(async move { sender.send_with_confirmation("again", "c-1").await });
    second.ack_next_send().await;
    assert!(fresh.await.unwrap().unwrap().success);

    client.shutdown().await;
}

#[tokio::test]
async fn send_into_a_full_queue_with_no_writer_is_still_bounded() {
    let market = MockMarket::bind().await;
    let mut cfg = market.config();
    cfg.socket.outbound_capacity = 1;
    cfg.reconnect.max_attempts = 1;
    let client = MarketClient::new(cfg, TOKEN).unwrap();
    let session = connected(&market, &client).await;

    // No server left to redial: the single reconnect attempt fails and the
    // supervisor gives up, leaving the queue without a writer.
    drop(market);
    session.close().await;
    wait_for_state(&client, |s| s != ConnectionState::Connected).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    client.mark_read("m-1").await.unwrap();

    let started = Instant::now();
    let ack = tokio::time::timeout(
        Duration::from_secs(3),
        client.send_with_temp_id("hi", "c-1", "abc123"),
    )
    .await
    .expect("send must not hang on a full queue")
    .unwrap();

    assert!(!ack.success);
    assert_eq!(ack.temp_id, "abc123");
    assert!(started.elapsed() < Duration::from_millis(1500), "{:?}", started.elapsed());
    assert_eq!(client.pending_count(), 0);

    client.shutdown().await;
}

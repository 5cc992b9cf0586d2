// Integration tests for the HTTP and WebSocket surface
use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

use tradewire_common::{Config, ConnectionInfo, PriceUpdate, QuoteUpdate};
use tradewire_server::{build_router, AppState};

async fn spawn_server() -> (SocketAddr, AppState, watch::Sender<bool>) {
    let (state, shutdown_tx) = AppState::new(Config::default());
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (addr, state, shutdown_tx)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

#[tokio::test]
async fn health_reports_ok() {
    let (addr, _state, _shutdown_tx) = spawn_server().await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "tradewire-server");
}

#[tokio::test]
async fn event_endpoints_accept_and_publish() {
    let (addr, state, _shutdown_tx) = spawn_server().await;
    let mut events = state.hub.subscribe();

    let quote = QuoteUpdate {
        symbol: "XAUUSD".to_string(),
        bid: 2320.5,
        ask: 2320.7,
        bid_size: 3.0,
        ask_size: 4.0,
        timestamp: Utc::now(),
    };
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/events/quote"))
        .json(&quote)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.kind(), "quote");
}

#[tokio::test]
async fn malformed_event_body_is_rejected() {
    let (addr, _state, _shutdown_tx) = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/events/price"))
        .header("content-type", "application/json")
        .body(r#"{"symbol":42}"#)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn socket_lifecycle_register_list_delete() {
    let (addr, _state, _shutdown_tx) = spawn_server().await;
    let http = reqwest::Client::new();

    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    settle().await;

    let listed: Vec<ConnectionInfo> = http
        .get(format!("http://{addr}/socket/connections"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].remote_endpoint.is_some());

    let id = listed[0].id.clone();
    let response = http
        .delete(format!("http://{addr}/socket/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    // The peer sees a graceful close with the server's remove reason.
    let close = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(frame))) => break frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    })
    .await
    .unwrap();
    let frame = close.expect("close frame should carry a reason");
    assert_eq!(u16::from(frame.code), 1000);
    assert_eq!(frame.reason, "removed by server");

    settle().await;
    let listed: Vec<ConnectionInfo> = http
        .get(format!("http://{addr}/socket/connections"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    // Deleting an unknown id is still a success.
    let response = http
        .delete(format!("http://{addr}/socket/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn oversize_message_closes_with_too_big() {
    let (addr, state, _shutdown_tx) = spawn_server().await;

    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    settle().await;

    // One byte past the 2 MiB cap.
    let oversize = "x".repeat(2 * 1024 * 1024 + 1);
    ws.send(Message::Text(oversize)).await.unwrap();

    let close = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(frame))) => break frame,
                Some(Ok(_)) => continue,
                None => panic!("stream ended without close frame"),
                Some(Err(e)) => panic!("read error: {e}"),
            }
        }
    })
    .await
    .unwrap();
    let frame = close.expect("close frame should carry a reason");
    assert_eq!(u16::from(frame.code), 1009);
    assert_eq!(frame.reason, "message too big");

    settle().await;
    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn raw_message_is_relayed_to_other_connections() {
    let (addr, state, _shutdown_tx) = spawn_server().await;

    let (mut ws_a, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    settle().await;
    let (mut ws_b, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    settle().await;

    let infos = state.registry.list().await;
    assert_eq!(infos.len(), 2);
    let sender_id = infos[1].id.clone();

    ws_b.send(Message::Text("morning update".to_string()))
        .await
        .unwrap();

    let relayed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws_a.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("expected relayed text, got {other:?}"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(relayed, format!("{sender_id}: morning update"));
}

#[tokio::test]
async fn hub_endpoint_streams_published_events() {
    let (addr, state, _shutdown_tx) = spawn_server().await;

    let (mut hub, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/hub/trading"))
            .await
            .unwrap();
    settle().await;

    let price = PriceUpdate {
        symbol: "XAUUSD".to_string(),
        bid: 2320.5,
        ask: 2320.7,
        last: 2320.6,
        volume: 10.0,
        timestamp: Utc::now(),
    };
    state.broadcaster.publish_price(price.clone());

    let text = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match hub.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("expected event text, got {other:?}"),
            }
        }
    })
    .await
    .unwrap();

    let envelope: tradewire_common::Envelope = serde_json::from_str(&text).unwrap();
    assert_eq!(envelope.kind, "price");
    let decoded = tradewire_common::UpdateEvent::from_envelope(&envelope)
        .unwrap()
        .unwrap();
    assert_eq!(decoded, tradewire_common::UpdateEvent::Price(price));
}

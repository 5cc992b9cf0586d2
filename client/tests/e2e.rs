// End-to-end: hub publish plus raw-socket relay through a real server
use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use tradewire_client::ConnectionService;
use tradewire_common::{Config, PriceUpdate, UpdateEvent};
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

#[tokio::test]
async fn hub_publish_and_raw_relay() {
    let (addr, state, _shutdown_tx) = spawn_server().await;

    // Hub-transport client.
    let service = ConnectionService::new();
    let mut events = service.subscribe_events();
    service
        .start_hub_push(&format!("ws://{addr}/hub/trading"))
        .await
        .unwrap();
    // Let the server-side hub handler subscribe before publishing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let price = PriceUpdate {
        symbol: "XAUUSD".to_string(),
        bid: 2320.5,
        ask: 2320.7,
        last: 2320.6,
        volume: 10.0,
        timestamp: Utc::now(),
    };

    // Publish over HTTP; the endpoint acknowledges before delivery.
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/events/price"))
        .json(&price)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, UpdateEvent::Price(price.clone()));

    // Two raw socket clients.
    let (mut ws_a, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (mut ws_b, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket/connect"))
            .await
            .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let infos = state.registry.list().await;
    assert_eq!(infos.len(), 2);
    let sender_id = infos[1].id.clone();

    // The second client sends a price envelope as raw text.
    let envelope_text = UpdateEvent::Price(price.clone()).encode().unwrap();
    ws_b.send(Message::Text(envelope_text.clone()))
        .await
        .unwrap();

    // The first socket client receives the sender-attributed relay.
    let relayed = timeout(Duration::from_secs(5), async {
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
    assert_eq!(relayed, format!("{sender_id}: {envelope_text}"));

    // The hub client's typed event fires again for the relayed envelope.
    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, UpdateEvent::Price(price));

    service.stop().await;
}

// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Integration tests for the reconnecting WebSocket client using a mock Axum server.

use std::{
    future::Future,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use orderdesk_network::{
    error::WebSocketError,
    websocket::{
        ConnectionState, WebSocketClient, WebSocketConfig, WsEvent, WsEventReceiver,
        channel_event_handler,
    },
};

// ------------------------------------------------------------------------------------------------
// Test Server State
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
struct TestServerState {
    connection_count: AtomicUsize,
    received: tokio::sync::Mutex<Vec<String>>,
    close_after_greeting: AtomicBool,
}

async fn handle_ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<TestServerState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<TestServerState>) {
    let connection = state.connection_count.fetch_add(1, Ordering::SeqCst) + 1;

    let greeting = format!(r#"{{"type":"status","message":"hello {connection}"}}"#);
    if socket.send(Message::Text(greeting.into())).await.is_err() {
        return;
    }

    if state.close_after_greeting.swap(false, Ordering::SeqCst) {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    while let Some(message) = socket.recv().await {
        let Ok(message) = message else { break };
        match message {
            Message::Text(text) => state.received.lock().await.push(text.to_string()),
            Message::Close(_) => break,
            _ => {}
        }
    }
}

async fn start_ws_server(state: Arc<TestServerState>) -> SocketAddr {
    let router = Router::new()
        .route("/ws", get(handle_ws_upgrade))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind websocket listener");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("websocket server failed");
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

fn test_config(addr: SocketAddr, reconnect_delay_ms: u64) -> WebSocketConfig {
    let mut config = WebSocketConfig::new(format!("ws://{addr}/ws"));
    config.reconnect_delay_ms = reconnect_delay_ms;
    config.connect_timeout_ms = 1_000;
    config
}

async fn wait_until_async<F, Fut>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while !condition().await {
        assert!(start.elapsed() < timeout, "condition not met within {timeout:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn next_text(rx: &mut WsEventReceiver) -> String {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        if let WsEvent::Text(text) = event {
            return text;
        }
    }
}

async fn next_state(rx: &mut WsEventReceiver) -> ConnectionState {
    loop {
        if let WsEvent::StateChanged(state) = rx.recv().await.expect("event channel closed") {
            return state;
        }
    }
}

fn drain_states(rx: &mut WsEventReceiver) -> Vec<ConnectionState> {
    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let WsEvent::StateChanged(state) = event {
            states.push(state);
        }
    }
    states
}

// ================================================================================================
// Connection Tests
// ================================================================================================

#[tokio::test]
async fn test_connect_and_receive_frame() {
    let state = Arc::new(TestServerState::default());
    let addr = start_ws_server(state.clone()).await;
    let (handler, mut rx) = channel_event_handler();

    let mut client = WebSocketClient::connect(test_config(addr, 3_000), handler)
        .await
        .expect("connect failed");

    let text = next_text(&mut rx).await;

    assert_eq!(text, r#"{"type":"status","message":"hello 1"}"#);
    assert!(client.is_active());
    assert_eq!(client.connection_state(), ConnectionState::Connected);

    client.disconnect().await;

    assert!(!client.is_active());
    assert!(client.is_closed());
}

#[tokio::test]
async fn test_send_text_reaches_server() {
    let state = Arc::new(TestServerState::default());
    let addr = start_ws_server(state.clone()).await;
    let (handler, _rx) = channel_event_handler();

    let mut client = WebSocketClient::connect(test_config(addr, 3_000), handler)
        .await
        .expect("connect failed");
    client.wait_until_active(2.0).await.expect("client inactive");

    client
        .send_text(r#"{"command":"stop_stream"}"#.to_string())
        .expect("send failed");

    wait_until_async(
        || {
            let state = state.clone();
            async move { state.received.lock().await.len() == 1 }
        },
        Duration::from_secs(2),
    )
    .await;

    assert_eq!(
        state.received.lock().await[0],
        r#"{"command":"stop_stream"}"#
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_wait_until_active_timeout() {
    let (handler, _rx) = channel_event_handler();
    let mut config = WebSocketConfig::new("ws://127.0.0.1:9/ws");
    config.connect_timeout_ms = 200;

    let mut client = WebSocketClient::connect(config, handler)
        .await
        .expect("connect failed");

    let result = client.wait_until_active(0.3).await;

    assert!(matches!(result, Err(WebSocketError::Timeout(_))));
    assert!(matches!(
        client.send_text("{}".to_string()),
        Err(WebSocketError::NotConnected)
    ));

    client.disconnect().await;
}

// ================================================================================================
// Reconnection Tests
// ================================================================================================

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let state = Arc::new(TestServerState::default());
    state.close_after_greeting.store(true, Ordering::SeqCst);
    let addr = start_ws_server(state.clone()).await;
    let (handler, mut rx) = channel_event_handler();

    let mut client = WebSocketClient::connect(test_config(addr, 200), handler)
        .await
        .expect("connect failed");

    assert_eq!(next_text(&mut rx).await, r#"{"type":"status","message":"hello 1"}"#);
    assert_eq!(next_text(&mut rx).await, r#"{"type":"status","message":"hello 2"}"#);

    assert_eq!(state.connection_count.load(Ordering::SeqCst), 2);
    assert!(client.is_active());

    client.disconnect().await;

    let states = drain_states(&mut rx);
    // Earlier transitions were consumed while waiting for frames
    assert_eq!(states, vec![ConnectionState::Disconnected]);
}

#[tokio::test]
async fn test_disconnect_cancels_pending_retry() {
    let state = Arc::new(TestServerState::default());
    state.close_after_greeting.store(true, Ordering::SeqCst);
    let addr = start_ws_server(state.clone()).await;
    let (handler, mut rx) = channel_event_handler();

    let mut client = WebSocketClient::connect(test_config(addr, 300), handler)
        .await
        .expect("connect failed");

    next_text(&mut rx).await;
    let client_ref = &client;
    wait_until_async(
        || async move { client_ref.connection_state() == ConnectionState::Disconnected },
        Duration::from_secs(2),
    )
    .await;

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(state.connection_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_manual_reconnect_while_connected_is_noop() {
    let state = Arc::new(TestServerState::default());
    let addr = start_ws_server(state.clone()).await;
    let (handler, mut rx) = channel_event_handler();

    let mut client = WebSocketClient::connect(test_config(addr, 3_000), handler)
        .await
        .expect("connect failed");
    next_text(&mut rx).await;

    client.reconnect().expect("reconnect failed");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(state.connection_count.load(Ordering::SeqCst), 1);
    assert!(client.is_active());

    client.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_fires_once_after_fixed_delay() {
    let (handler, mut rx) = channel_event_handler();
    let mut config = WebSocketConfig::new("ws://127.0.0.1:9/ws");
    config.connect_timeout_ms = 200;
    config.reconnect_delay_ms = 3_000;

    let mut client = WebSocketClient::connect(config, handler)
        .await
        .expect("connect failed");

    assert_eq!(next_state(&mut rx).await, ConnectionState::Connecting);
    assert_eq!(next_state(&mut rx).await, ConnectionState::Disconnected);
    let dropped_at = tokio::time::Instant::now();

    assert_eq!(next_state(&mut rx).await, ConnectionState::Connecting);
    let elapsed = dropped_at.elapsed();

    assert!(elapsed >= Duration::from_millis(2_900), "retried after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3_500), "retried after {elapsed:?}");

    client.disconnect().await;
}

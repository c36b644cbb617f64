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

//! Reconnecting WebSocket client.
//!
//! The client spawns a dedicated Tokio task which exclusively owns the transport and the
//! [`ConnectionStateMachine`]. Callers interact with it through an unbounded command channel
//! and receive [`WsEvent`]s (state changes and text frames) through the handler channel
//! passed to [`WebSocketClient::connect`].
//!
//! Sends are rejected synchronously with [`WebSocketError::NotConnected`] unless the
//! connection is `Connected`; nothing is buffered across disconnects.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{
    net::TcpStream,
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::{Instant, Interval},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderName, HeaderValue},
    },
};

use super::{
    config::WebSocketConfig,
    state::{ConnectionEffect, ConnectionEvent, ConnectionState, ConnectionStateMachine, RetryToken},
};
use crate::error::{WebSocketError, WebSocketResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Events delivered to the handler channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A text frame was received while connected.
    Text(String),
}

/// Sending half of the handler channel.
pub type WsEventSender = UnboundedSender<WsEvent>;

/// Receiving half of the handler channel.
pub type WsEventReceiver = UnboundedReceiver<WsEvent>;

/// Creates a handler channel for [`WebSocketClient::connect`].
#[must_use]
pub fn channel_event_handler() -> (WsEventSender, WsEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

#[derive(Debug)]
enum ClientCommand {
    Send(Message),
    Reconnect,
    Disconnect,
}

/// A single logical WebSocket connection with automatic fixed-delay reconnection.
#[derive(Debug)]
pub struct WebSocketClient {
    url: String,
    state: Arc<AtomicU8>,
    cmd_tx: UnboundedSender<ClientCommand>,
    task_handle: Option<JoinHandle<()>>,
}

impl WebSocketClient {
    /// Starts the connection task and issues the initial connection attempt.
    ///
    /// Returns as soon as the task is running; the handshake and any later
    /// reconnections happen in the background and are reported through `handler`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL cannot form a handshake request.
    pub async fn connect(config: WebSocketConfig, handler: WsEventSender) -> WebSocketResult<Self> {
        build_request(&config)?;

        let state = Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8));
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();

        let task = ConnectionTask::new(config.clone(), state.clone(), cmd_rx, handler);
        let task_handle = tokio::spawn(task.run());

        Ok(Self {
            url: config.url,
            state,
            cmd_tx,
            task_handle: Some(task_handle),
        })
    }

    /// Returns the URL being used by the client.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns a value indicating whether the client is connected.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// Returns a value indicating whether the connection task has finished.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_none_or(tokio::task::JoinHandle::is_finished)
    }

    /// Sends a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`WebSocketError::NotConnected`] if the connection is not `Connected`,
    /// or [`WebSocketError::Closed`] if the client has been shut down.
    pub fn send_text(&self, text: String) -> WebSocketResult<()> {
        if !self.is_active() {
            return Err(WebSocketError::NotConnected);
        }

        tracing::trace!("Sending message: {text}");
        self.cmd_tx
            .send(ClientCommand::Send(Message::Text(text.into())))
            .map_err(|_| WebSocketError::Closed)
    }

    /// Requests an immediate connection attempt.
    ///
    /// This is a no-op when already connecting or connected.
    ///
    /// # Errors
    ///
    /// Returns [`WebSocketError::Closed`] if the client has been shut down.
    pub fn reconnect(&self) -> WebSocketResult<()> {
        self.cmd_tx
            .send(ClientCommand::Reconnect)
            .map_err(|_| WebSocketError::Closed)
    }

    /// Waits until the client is connected or `timeout_secs` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`WebSocketError::Timeout`] if the connection is not active in time.
    pub async fn wait_until_active(&self, timeout_secs: f64) -> WebSocketResult<()> {
        let timeout = Duration::from_secs_f64(timeout_secs.max(0.0));

        tokio::time::timeout(timeout, async {
            while !self.is_active() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| {
            WebSocketError::Timeout(format!(
                "connection not active after {timeout_secs:.1}s ({})",
                self.url
            ))
        })
    }

    /// Closes the connection, cancels any pending retry and waits for the task to finish.
    pub async fn disconnect(&mut self) {
        tracing::debug!("Disconnecting WebSocket");

        if self.cmd_tx.send(ClientCommand::Disconnect).is_err() {
            tracing::debug!("Connection task already stopped");
        }

        if let Some(handle) = self.task_handle.take()
            && let Err(e) = handle.await
        {
            tracing::error!("Connection task failed: {e}");
        }
    }
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

fn build_request(config: &WebSocketConfig) -> WebSocketResult<Request> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| WebSocketError::InvalidUrl(e.to_string()))?;

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WebSocketError::InvalidUrl(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| WebSocketError::InvalidUrl(format!("header value: {e}")))?;
        request.headers_mut().insert(name, value);
    }

    Ok(request)
}

async fn open_transport(config: WebSocketConfig) -> Result<WsStream, String> {
    let request = build_request(&config).map_err(|e| e.to_string())?;

    match tokio::time::timeout(
        config.connect_timeout(),
        tokio_tungstenite::connect_async(request),
    )
    .await
    {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!(
            "handshake timed out after {}ms",
            config.connect_timeout_ms
        )),
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

struct ConnectionTask {
    config: WebSocketConfig,
    machine: ConnectionStateMachine,
    state: Arc<AtomicU8>,
    cmd_rx: UnboundedReceiver<ClientCommand>,
    handler: WsEventSender,
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    heartbeat: Option<Interval>,
    retry: Option<(RetryToken, Instant)>,
}

impl ConnectionTask {
    fn new(
        config: WebSocketConfig,
        state: Arc<AtomicU8>,
        cmd_rx: UnboundedReceiver<ClientCommand>,
        handler: WsEventSender,
    ) -> Self {
        let machine =
            ConnectionStateMachine::new(config.reconnect_delay(), config.reconnect_max_attempts);

        Self {
            config,
            machine,
            state,
            cmd_rx,
            handler,
            writer: None,
            reader: None,
            heartbeat: None,
            retry: None,
        }
    }

    async fn run(mut self) {
        self.dispatch(ConnectionEvent::Start).await;

        loop {
            let keep_running = match self.machine.state() {
                ConnectionState::Connecting => self.run_connecting().await,
                ConnectionState::Connected => self.run_connected().await,
                ConnectionState::Disconnected => self.run_disconnected().await,
            };

            if !keep_running {
                break;
            }
        }

        tracing::debug!("Connection task finished ({})", self.config.url);
    }

    async fn run_connecting(&mut self) -> bool {
        tracing::debug!("Connecting to {}", self.config.url);

        let connect = open_transport(self.config.clone());
        tokio::pin!(connect);

        loop {
            let deadline = self.retry.map(|(_, deadline)| deadline);

            tokio::select! {
                result = &mut connect => {
                    match result {
                        Ok(stream) => {
                            let (writer, reader) = stream.split();
                            self.writer = Some(writer);
                            self.reader = Some(reader);
                            self.heartbeat = self.config.heartbeat.map(|secs| {
                                let period = Duration::from_secs(secs.max(1));
                                tokio::time::interval_at(Instant::now() + period, period)
                            });
                            self.dispatch(ConnectionEvent::HandshakeSucceeded).await;
                        }
                        Err(reason) => {
                            self.dispatch(ConnectionEvent::HandshakeFailed(reason)).await;
                        }
                    }
                    return true;
                }
                () = sleep_until_deadline(deadline) => {
                    if let Some((token, _)) = self.retry.take() {
                        self.dispatch(ConnectionEvent::RetryTimerFired(token)).await;
                    }
                }
                cmd = self.cmd_rx.recv() => {
                    if !self.handle_command(cmd).await {
                        return false;
                    }
                    if self.machine.state() != ConnectionState::Connecting {
                        return true;
                    }
                }
            }
        }
    }

    async fn run_connected(&mut self) -> bool {
        let Some(reader) = self.reader.as_mut() else {
            self.dispatch(ConnectionEvent::TransportClosed("reader missing".to_string()))
                .await;
            return true;
        };

        tokio::select! {
            msg = reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::trace!("Received text frame ({} bytes)", text.len());
                        self.emit(WsEvent::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => self.emit(WsEvent::Text(text)),
                        Err(e) => tracing::warn!("Dropping non UTF-8 binary frame: {e}"),
                    },
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        tracing::trace!("Received ping/pong");
                    }
                    Some(Ok(Message::Frame(_))) => {
                        tracing::trace!("Received raw frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map_or_else(
                            || "close frame".to_string(),
                            |f| format!("close frame {}: {}", f.code, f.reason.as_str()),
                        );
                        self.dispatch(ConnectionEvent::TransportClosed(reason)).await;
                    }
                    Some(Err(e)) => {
                        self.dispatch(ConnectionEvent::TransportClosed(e.to_string())).await;
                    }
                    None => {
                        self.dispatch(ConnectionEvent::TransportClosed("stream ended".to_string()))
                            .await;
                    }
                }
                true
            }
            () = next_heartbeat(&mut self.heartbeat) => {
                self.write(Message::Ping(Default::default())).await;
                true
            }
            cmd = self.cmd_rx.recv() => self.handle_command(cmd).await,
        }
    }

    async fn run_disconnected(&mut self) -> bool {
        if self.machine.is_stopped() {
            // Stopped but not dropped: only a reconnect or disconnect can follow
            let cmd = self.cmd_rx.recv().await;
            return self.handle_command(cmd).await;
        }

        let deadline = self.retry.map(|(_, deadline)| deadline);

        tokio::select! {
            () = sleep_until_deadline(deadline) => {
                if let Some((token, _)) = self.retry.take() {
                    self.dispatch(ConnectionEvent::RetryTimerFired(token)).await;
                }
                true
            }
            cmd = self.cmd_rx.recv() => self.handle_command(cmd).await,
        }
    }

    async fn handle_command(&mut self, cmd: Option<ClientCommand>) -> bool {
        match cmd {
            Some(ClientCommand::Send(message)) => {
                if self.machine.state().is_connected() {
                    self.write(message).await;
                } else {
                    tracing::warn!("Dropping message, not connected");
                }
                true
            }
            Some(ClientCommand::Reconnect) => {
                self.dispatch(ConnectionEvent::Start).await;
                true
            }
            Some(ClientCommand::Disconnect) | None => {
                self.dispatch(ConnectionEvent::Stop).await;
                false
            }
        }
    }

    async fn write(&mut self, message: Message) {
        let Some(writer) = self.writer.as_mut() else {
            tracing::warn!("Dropping message, writer not available");
            return;
        };

        if let Err(e) = writer.send(message).await {
            tracing::error!("Send failed: {e}");
            self.dispatch(ConnectionEvent::TransportClosed(e.to_string()))
                .await;
        }
    }

    async fn dispatch(&mut self, event: ConnectionEvent) {
        let effects = self.machine.handle(event);

        for effect in effects {
            match effect {
                ConnectionEffect::OpenTransport => {
                    // Performed by `run_connecting` on the next loop iteration
                }
                ConnectionEffect::CloseTransport => self.close_transport().await,
                ConnectionEffect::ScheduleRetry { token, delay } => {
                    self.retry = Some((token, Instant::now() + delay));
                }
                ConnectionEffect::CancelRetry(token) => {
                    if self.retry.is_some_and(|(pending, _)| pending == token) {
                        self.retry = None;
                    }
                }
                ConnectionEffect::StateChanged(state) => {
                    self.state.store(state as u8, Ordering::Release);
                    if state == ConnectionState::Disconnected {
                        self.writer = None;
                        self.reader = None;
                        self.heartbeat = None;
                    }
                    self.emit(WsEvent::StateChanged(state));
                }
            }
        }
    }

    async fn close_transport(&mut self) {
        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.send(Message::Close(None)).await
        {
            tracing::debug!("Error sending close frame: {e}");
        }
        self.reader = None;
        self.heartbeat = None;
    }

    fn emit(&self, event: WsEvent) {
        if self.handler.send(event).is_err() {
            tracing::debug!("Event handler dropped");
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

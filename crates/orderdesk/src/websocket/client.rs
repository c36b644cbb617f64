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

//! Order desk client event loop.
//!
//! [`OrderDeskClient::start`] opens the reconnecting connection and spawns one task that
//! owns the [`OrderDesk`] and the [`Presenter`]. The task waits on connection events and
//! operator actions with `tokio::select!`, applies each to completion, then renders. No two
//! mutations of the desk ever interleave.

use orderdesk_network::websocket::{
    ConnectionState, WebSocketClient, WsEvent, WsEventReceiver, channel_event_handler,
};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use super::messages::OutboundCommand;
use crate::{
    action::OperatorAction,
    config::OrderDeskConfig,
    desk::{CommandSink, OrderDesk},
    error::{DeskError, DeskResult},
    presenter::Presenter,
};

impl CommandSink for WebSocketClient {
    fn connection_state(&self) -> ConnectionState {
        Self::connection_state(self)
    }

    fn send_command(&mut self, command: &OutboundCommand) -> DeskResult<()> {
        let text = command
            .to_json()
            .map_err(|e| DeskError::Encode(e.to_string()))?;
        self.send_text(text).map_err(DeskError::from)
    }

    fn reconnect(&mut self) -> DeskResult<()> {
        Self::reconnect(self).map_err(DeskError::from)
    }
}

/// Handle to a running order desk.
#[derive(Debug)]
pub struct OrderDeskClient {
    action_tx: UnboundedSender<OperatorAction>,
    task_handle: Option<JoinHandle<OrderDesk>>,
}

impl OrderDeskClient {
    /// Connects to the order service and starts the desk event loop.
    ///
    /// The initial handshake happens in the background; the desk starts `Disconnected`
    /// and follows the connection as it changes state.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the URL cannot be used.
    pub async fn start<P>(config: OrderDeskConfig, presenter: P) -> DeskResult<Self>
    where
        P: Presenter + Send + 'static,
    {
        let desk = OrderDesk::new(&config)?;
        let (handler, events) = channel_event_handler();
        let ws_client = WebSocketClient::connect(config.websocket_config(), handler)
            .await
            .map_err(|e| DeskError::InvalidConfig(e.to_string()))?;

        tracing::info!("Order desk started ({})", ws_client.url());

        let (action_tx, action_rx) = tokio::sync::mpsc::unbounded_channel();
        let event_loop = DeskEventLoop {
            desk,
            presenter,
            ws_client,
            events,
            actions: action_rx,
        };
        let task_handle = tokio::spawn(event_loop.run());

        Ok(Self {
            action_tx,
            task_handle: Some(task_handle),
        })
    }

    /// Queues an operator action for the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if the event loop has finished.
    pub fn submit(&self, action: OperatorAction) -> DeskResult<()> {
        self.action_tx
            .send(action)
            .map_err(|_| DeskError::InvalidOperation("order desk has shut down".to_string()))
    }

    /// Returns a value indicating whether the event loop has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_none_or(tokio::task::JoinHandle::is_finished)
    }

    /// Waits for the event loop to finish and returns the final desk state.
    ///
    /// Returns `None` if the loop was already joined or did not complete normally.
    pub async fn join(&mut self) -> Option<OrderDesk> {
        let handle = self.task_handle.take()?;
        match handle.await {
            Ok(desk) => Some(desk),
            Err(e) => {
                tracing::error!("Order desk task failed: {e}");
                None
            }
        }
    }

    /// Stops the event loop, closes the connection and returns the final desk state.
    pub async fn shutdown(&mut self) -> Option<OrderDesk> {
        if self.action_tx.send(OperatorAction::Quit).is_err() {
            tracing::debug!("Order desk already stopped");
        }
        self.join().await
    }
}

impl Drop for OrderDeskClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

struct DeskEventLoop<P> {
    desk: OrderDesk,
    presenter: P,
    ws_client: WebSocketClient,
    events: WsEventReceiver,
    actions: UnboundedReceiver<OperatorAction>,
}

impl<P: Presenter> DeskEventLoop<P> {
    async fn run(mut self) -> OrderDesk {
        self.presenter.render(&self.desk.view());

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(WsEvent::StateChanged(state)) => self.desk.on_connection_state(state),
                    Some(WsEvent::Text(text)) => {
                        self.desk.handle_text(&text);
                    }
                    None => {
                        tracing::warn!("Connection event channel closed");
                        break;
                    }
                },
                action = self.actions.recv() => match action {
                    None | Some(OperatorAction::Quit) => break,
                    Some(action) => {
                        // Errors are already on the status line
                        let _ = self.desk.apply(action, &mut self.ws_client, &mut self.presenter);
                    }
                },
            }

            self.presenter.render(&self.desk.view());
        }

        self.ws_client.disconnect().await;
        self.desk.on_shutdown();
        tracing::info!("Order desk stopped");
        self.desk
    }
}

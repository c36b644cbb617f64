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

//! Test support: order stubs, a recording command sink and a recording presenter.

use std::{future::Future, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use orderdesk_network::websocket::ConnectionState;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{
    common::enums::{OrderPriority, OrderStatus},
    desk::{CommandSink, StatusLine},
    error::{DeskError, DeskResult},
    model::{Order, OrderCounts, OrderId},
    pagination::PageInfo,
    presenter::{DeskView, Presenter},
    websocket::messages::OutboundCommand,
};

/// Repeatedly evaluates `condition` until it returns `true` or `timeout` elapses.
///
/// # Panics
///
/// Panics if the condition is not met within `timeout`.
pub async fn wait_until_async<F, Fut>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while !condition().await {
        assert!(
            start.elapsed() < timeout,
            "Condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Returns an instant `secs` seconds after a fixed base time.
#[must_use]
pub fn stub_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_740_000_000 + secs, 0)
        .single()
        .unwrap_or_default()
}

/// Returns a `Pending` order created `secs` seconds after the base time.
#[must_use]
pub fn order_at(order_id: &str, secs: i64) -> Order {
    order_with_status(order_id, secs, OrderStatus::Pending)
}

/// Returns an order with the given status created `secs` seconds after the base time.
#[must_use]
pub fn order_with_status(order_id: &str, secs: i64, status: OrderStatus) -> Order {
    let timestamp = stub_timestamp(secs);
    Order {
        order_id: OrderId::from(order_id),
        customer_name: format!("Customer {order_id}"),
        status,
        priority: OrderPriority::Medium,
        details: String::new(),
        timestamp,
        processed_at: (status != OrderStatus::Pending).then_some(timestamp),
    }
}

/// Encodes `order` as an inbound frame of `kind` (`order_item` or `order_updated`).
#[must_use]
pub fn order_frame(kind: &str, order: &Order) -> String {
    serde_json::json!({ "type": kind, "data": order }).to_string()
}

/// A [`CommandSink`] that records commands instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub state: ConnectionState,
    pub sent: Vec<OutboundCommand>,
    pub reconnects: usize,
}

impl RecordingSink {
    #[must_use]
    pub fn connected() -> Self {
        Self {
            state: ConnectionState::Connected,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl CommandSink for RecordingSink {
    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    fn send_command(&mut self, command: &OutboundCommand) -> DeskResult<()> {
        if !self.state.is_connected() {
            return Err(DeskError::NotConnected);
        }
        self.sent.push(command.clone());
        Ok(())
    }

    fn reconnect(&mut self) -> DeskResult<()> {
        self.reconnects += 1;
        Ok(())
    }
}

/// An owned copy of a [`DeskView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedView {
    pub connection: ConnectionState,
    pub status: StatusLine,
    pub stream_running: bool,
    pub counts: OrderCounts,
    pub capacity: usize,
    pub page: PageInfo,
    pub order_ids: Vec<OrderId>,
    pub selected: Vec<OrderId>,
}

impl From<&DeskView<'_>> for RenderedView {
    fn from(view: &DeskView<'_>) -> Self {
        Self {
            connection: view.connection,
            status: view.status.clone(),
            stream_running: view.stream_running,
            counts: view.counts,
            capacity: view.capacity,
            page: view.page,
            order_ids: view.orders.iter().map(|o| o.order_id.clone()).collect(),
            selected: view.selection.iter().cloned().collect(),
        }
    }
}

/// A [`Presenter`] that forwards every render to a channel and answers confirmations
/// with a fixed value.
#[derive(Debug)]
pub struct RecordingPresenter {
    pub confirm: bool,
    pub confirmations: Vec<Vec<OrderId>>,
    tx: UnboundedSender<RenderedView>,
}

impl RecordingPresenter {
    /// Creates a presenter and the receiver for its renders.
    #[must_use]
    pub fn new(confirm: bool) -> (Self, UnboundedReceiver<RenderedView>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let presenter = Self {
            confirm,
            confirmations: Vec::new(),
            tx,
        };
        (presenter, rx)
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, view: &DeskView<'_>) {
        let _ = self.tx.send(RenderedView::from(view));
    }

    fn confirm_close(&mut self, orders: &[&Order]) -> bool {
        self.confirmations
            .push(orders.iter().map(|o| o.order_id.clone()).collect());
        self.confirm
    }
}

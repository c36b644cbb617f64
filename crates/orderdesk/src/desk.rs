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

//! The order desk: cache, selection and pagination driven by frames and operator actions.
//!
//! [`OrderDesk`] is mutated only through `&mut self`, one frame or one action at a time,
//! so every observer sees the cache, selection and page bound after all follow-up steps
//! of a mutation have run (ingest, evict, reconcile selection, re-clamp page).
//!
//! Order status is never changed locally. Process and close only emit commands; the cache
//! reflects a new status once the server echoes an `order_updated` frame.

use orderdesk_network::websocket::ConnectionState;

use crate::{
    action::OperatorAction,
    cache::{IngestOutcome, OrderCache},
    common::enums::{FrameKind, OrderStatus, StatusLevel},
    config::OrderDeskConfig,
    error::{DeskError, DeskResult},
    model::{Order, OrderCounts, OrderId},
    pagination::{PageInfo, Pagination},
    presenter::{DeskView, Presenter},
    selection::SelectionSet,
    websocket::{
        error::FrameDecodeError,
        handler::{FrameHandler, route_frame},
        messages::OutboundCommand,
    },
};

/// The connection seen from the desk: its state and a way to send commands.
pub trait CommandSink {
    fn connection_state(&self) -> ConnectionState;

    /// Sends one command.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::NotConnected`] if the connection is not `Connected`, or another
    /// error if the command could not be encoded or handed to the transport.
    fn send_command(&mut self, command: &OutboundCommand) -> DeskResult<()>;

    /// Requests an immediate connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection has been shut down.
    fn reconnect(&mut self) -> DeskResult<()>;
}

/// The most recent operator-facing message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

/// Client-side order desk state.
#[derive(Clone, Debug)]
pub struct OrderDesk {
    cache: OrderCache,
    selection: SelectionSet,
    pagination: Pagination,
    status: StatusLine,
    stream_running: bool,
    connection: ConnectionState,
    stream_frequency_secs: f64,
    batch_count: usize,
}

impl Default for OrderDesk {
    fn default() -> Self {
        let config = OrderDeskConfig::default();
        Self {
            cache: OrderCache::new(config.capacity),
            selection: SelectionSet::new(),
            pagination: Pagination::default(),
            status: StatusLine::default(),
            stream_running: false,
            connection: ConnectionState::Disconnected,
            stream_frequency_secs: config.stream_frequency_secs,
            batch_count: config.batch_count,
        }
    }
}

impl OrderDesk {
    /// Creates a new [`OrderDesk`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: &OrderDeskConfig) -> DeskResult<Self> {
        config.validate()?;

        Ok(Self {
            cache: OrderCache::new(config.capacity),
            selection: SelectionSet::new(),
            pagination: Pagination::new(config.page_size, config.page_size_choices.clone())?,
            status: StatusLine::default(),
            stream_running: false,
            connection: ConnectionState::Disconnected,
            stream_frequency_secs: config.stream_frequency_secs,
            batch_count: config.batch_count,
        })
    }

    #[must_use]
    pub const fn cache(&self) -> &OrderCache {
        &self.cache
    }

    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    #[must_use]
    pub const fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Returns whether the server last reported its stream as running.
    #[must_use]
    pub const fn is_stream_running(&self) -> bool {
        self.stream_running
    }

    /// Returns the last connection state reported to the desk.
    #[must_use]
    pub const fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    #[must_use]
    pub fn counts(&self) -> OrderCounts {
        self.cache.counts()
    }

    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        self.pagination.info(self.cache.len())
    }

    /// Returns the orders on the current page, newest first.
    #[must_use]
    pub fn current_page_items(&self) -> Vec<&Order> {
        self.cache.slice(self.pagination.page_range())
    }

    #[must_use]
    pub fn view(&self) -> DeskView<'_> {
        DeskView {
            connection: self.connection,
            status: &self.status,
            stream_running: self.stream_running,
            counts: self.cache.counts(),
            capacity: self.cache.capacity(),
            page: self.page_info(),
            orders: self.current_page_items(),
            selection: &self.selection,
        }
    }

    // -- Cache ----------------------------------------------------------------------------------

    /// Inserts or replaces `order`, then evicts, reconciles the selection and re-clamps the page.
    pub fn ingest(&mut self, order: Order) -> IngestOutcome {
        let outcome = self.cache.ingest(order);
        self.after_cache_mutation(&outcome.evicted);
        outcome
    }

    /// Changes the cache capacity (zero selects the default) and evicts immediately.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<OrderId> {
        let evicted = self.cache.set_capacity(capacity);
        self.after_cache_mutation(&evicted);
        self.report_info(format!(
            "Capacity set to {} ({} evicted)",
            self.cache.capacity(),
            evicted.len()
        ));
        evicted
    }

    fn after_cache_mutation(&mut self, evicted: &[OrderId]) {
        if !evicted.is_empty() {
            let cache = &self.cache;
            self.selection.reconcile(|order_id| cache.contains(order_id));
        }
        self.pagination.reclamp(self.cache.len());
    }

    // -- Pagination -----------------------------------------------------------------------------

    /// Changes the page size and re-clamps the current page.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if `page_size` is not an allowed choice.
    pub fn set_page_size(&mut self, page_size: usize) -> DeskResult<()> {
        self.pagination.set_page_size(page_size, self.cache.len())
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.pagination.go_to_page(page, self.cache.len())
    }

    pub fn next_page(&mut self) -> usize {
        self.pagination.next_page(self.cache.len())
    }

    pub fn previous_page(&mut self) -> usize {
        self.pagination.previous_page(self.cache.len())
    }

    // -- Selection ------------------------------------------------------------------------------

    /// Flips the selection of a cached order, returning `true` if it is now selected.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::UnknownOrder`] if the order is not in the cache.
    pub fn toggle_selection(&mut self, order_id: &OrderId) -> DeskResult<bool> {
        if !self.cache.contains(order_id.as_str()) {
            return Err(DeskError::UnknownOrder(order_id.clone()));
        }
        Ok(self.selection.toggle(order_id))
    }

    /// Selects every order on the current page, or deselects them all when all are selected.
    ///
    /// Returns `true` if the page is now selected.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if the current page is empty.
    pub fn toggle_page_selection(&mut self) -> DeskResult<bool> {
        let page_ids: Vec<OrderId> = self
            .current_page_items()
            .into_iter()
            .map(|order| order.order_id.clone())
            .collect();

        if page_ids.is_empty() {
            return Err(DeskError::InvalidOperation(
                "no orders on the current page".to_string(),
            ));
        }

        let all_selected = page_ids
            .iter()
            .all(|order_id| self.selection.contains(order_id.as_str()));

        for order_id in page_ids {
            if all_selected {
                self.selection.deselect(order_id.as_str());
            } else {
                self.selection.select(order_id);
            }
        }

        Ok(!all_selected)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -- Connection and frames ------------------------------------------------------------------

    /// Records a connection state change.
    pub fn on_connection_state(&mut self, state: ConnectionState) {
        if state == self.connection {
            return;
        }
        tracing::info!("Connection {} -> {state}", self.connection);
        self.connection = state;

        match state {
            ConnectionState::Connecting => self.report_info("Connecting to order service"),
            ConnectionState::Connected => self.report_info("Connected to order service"),
            ConnectionState::Disconnected => {
                self.stream_running = false;
                self.report_error_message("Disconnected, reconnecting automatically");
            }
        }
    }

    /// Records that the connection was closed for good.
    pub fn on_shutdown(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.stream_running = false;
        self.report_info("Order desk stopped");
    }

    /// Decodes and applies one inbound text frame.
    ///
    /// Frames that fail to decode are logged and dropped.
    pub fn handle_text(&mut self, text: &str) -> Option<FrameKind> {
        match route_frame(text, self) {
            Ok(kind) => Some(kind),
            Err(FrameDecodeError::UnknownKind(kind)) => {
                tracing::warn!("Ignoring frame of unknown kind '{kind}'");
                None
            }
            Err(e) => {
                tracing::warn!("Dropping undecodable frame: {e}");
                tracing::trace!("Frame text: {text}");
                None
            }
        }
    }

    // -- Commands -------------------------------------------------------------------------------

    /// Asks the server to start streaming orders, capped at the current capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if `frequency` is not positive or the command cannot be sent.
    pub fn start_stream<S>(&mut self, sink: &mut S, frequency: Option<f64>) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        let frequency = frequency.unwrap_or(self.stream_frequency_secs);
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(DeskError::InvalidOperation(format!(
                "frequency must be positive, was {frequency}"
            )));
        }

        let command = OutboundCommand::StartStream {
            frequency,
            max_orders: self.cache.capacity(),
        };
        self.send(sink, &command)?;
        self.report_info(format!("Requested stream every {frequency}s"));
        Ok(())
    }

    /// Asks the server to stop streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    pub fn stop_stream<S>(&mut self, sink: &mut S) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        self.send(sink, &OutboundCommand::StopStream)?;
        self.report_info("Requested stream stop");
        Ok(())
    }

    /// Asks the server for a batch of orders.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is zero or the command cannot be sent.
    pub fn generate_batch<S>(&mut self, sink: &mut S, count: Option<usize>) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        let count = count.unwrap_or(self.batch_count);
        if count == 0 {
            return Err(DeskError::InvalidOperation(
                "batch count must be positive".to_string(),
            ));
        }

        self.send(sink, &OutboundCommand::GenerateBatch { count })?;
        self.report_info(format!("Requested batch of {count} orders"));
        Ok(())
    }

    /// Emits `process_order` for a cached order.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::UnknownOrder`] for an id not in the cache, or
    /// [`DeskError::NotConnected`] when disconnected.
    pub fn process_order<S>(&mut self, sink: &mut S, order_id: &OrderId) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        if !self.cache.contains(order_id.as_str()) {
            return Err(DeskError::UnknownOrder(order_id.clone()));
        }

        self.send(
            sink,
            &OutboundCommand::ProcessOrder {
                order_id: order_id.clone(),
            },
        )?;
        self.report_info(format!("Requested processing of {order_id}"));
        Ok(())
    }

    /// Emits `close_order` for a `Processing` order once the operator confirms.
    ///
    /// Returns `false` if the operator declined.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::UnknownOrder`] for an id not in the cache,
    /// [`DeskError::InvalidOperation`] if the order is not `Processing`, or
    /// [`DeskError::NotConnected`] when disconnected.
    pub fn close_order<S, P>(
        &mut self,
        sink: &mut S,
        presenter: &mut P,
        order_id: &OrderId,
    ) -> DeskResult<bool>
    where
        S: CommandSink + ?Sized,
        P: Presenter + ?Sized,
    {
        let order = self
            .cache
            .get(order_id.as_str())
            .ok_or_else(|| DeskError::UnknownOrder(order_id.clone()))?;

        if !order.status.is_closable() {
            return Err(DeskError::InvalidOperation(format!(
                "order {order_id} is {}, only Processing orders can be closed",
                order.status
            )));
        }
        ensure_connected(sink)?;

        if !presenter.confirm_close(&[order]) {
            self.report_info(format!("Close of {order_id} not confirmed"));
            return Ok(false);
        }

        self.send(
            sink,
            &OutboundCommand::CloseOrder {
                order_id: order_id.clone(),
            },
        )?;
        self.report_info(format!("Requested close of {order_id}"));
        Ok(true)
    }

    /// Emits `process_order` for every selected order that is currently `Pending`.
    ///
    /// Returns the number of commands sent. The selection is cleared afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if no selected order is `Pending`, or a send
    /// error; commands after a failed send are dropped.
    pub fn process_selected<S>(&mut self, sink: &mut S) -> DeskResult<usize>
    where
        S: CommandSink + ?Sized,
    {
        let eligible = self.selected_where(OrderStatus::is_processable);
        if eligible.is_empty() {
            return Err(DeskError::InvalidOperation(
                "no selected orders are Pending".to_string(),
            ));
        }
        ensure_connected(sink)?;

        let sent = self.send_each(sink, eligible, |order_id| OutboundCommand::ProcessOrder {
            order_id,
        })?;
        self.selection.clear();
        self.report_info(format!("Requested processing of {sent} order(s)"));
        Ok(sent)
    }

    /// Emits `close_order` for every selected order that is currently `Processing`, after a
    /// single confirmation for the whole set.
    ///
    /// Returns the number of commands sent; zero if the operator declined.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if no selected order is `Processing`, or a send
    /// error; commands after a failed send are dropped.
    pub fn close_selected<S, P>(&mut self, sink: &mut S, presenter: &mut P) -> DeskResult<usize>
    where
        S: CommandSink + ?Sized,
        P: Presenter + ?Sized,
    {
        let eligible = self.selected_where(OrderStatus::is_closable);
        if eligible.is_empty() {
            return Err(DeskError::InvalidOperation(
                "no selected orders are Processing".to_string(),
            ));
        }
        ensure_connected(sink)?;

        let orders: Vec<&Order> = eligible
            .iter()
            .filter_map(|order_id| self.cache.get(order_id.as_str()))
            .collect();
        let confirmed = presenter.confirm_close(&orders);
        let count = orders.len();
        if !confirmed {
            self.report_info(format!("Close of {count} order(s) not confirmed"));
            return Ok(0);
        }

        let sent = self.send_each(sink, eligible, |order_id| OutboundCommand::CloseOrder {
            order_id,
        })?;
        self.selection.clear();
        self.report_info(format!("Requested close of {sent} order(s)"));
        Ok(sent)
    }

    /// Applies one operator action, recording any error on the status line.
    ///
    /// [`OperatorAction::Quit`] is a no-op here; the owner of the event loop handles it.
    ///
    /// # Errors
    ///
    /// Returns the error that was reported.
    pub fn apply<S, P>(
        &mut self,
        action: OperatorAction,
        sink: &mut S,
        presenter: &mut P,
    ) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
        P: Presenter + ?Sized,
    {
        tracing::debug!("Applying {action:?}");

        let result = match action {
            OperatorAction::StartStream { frequency } => self.start_stream(sink, frequency),
            OperatorAction::StopStream => self.stop_stream(sink),
            OperatorAction::GenerateBatch { count } => self.generate_batch(sink, count),
            OperatorAction::Process(order_id) => self.process_order(sink, &order_id),
            OperatorAction::Close(order_id) => {
                self.close_order(sink, presenter, &order_id).map(|_| ())
            }
            OperatorAction::ToggleSelect(order_id) => {
                self.toggle_selection(&order_id).map(|_| ())
            }
            OperatorAction::SelectPage => self.toggle_page_selection().map(|_| ()),
            OperatorAction::ClearSelection => {
                self.clear_selection();
                Ok(())
            }
            OperatorAction::ProcessSelected => self.process_selected(sink).map(|_| ()),
            OperatorAction::CloseSelected => self.close_selected(sink, presenter).map(|_| ()),
            OperatorAction::GoToPage(page) => {
                self.go_to_page(page);
                Ok(())
            }
            OperatorAction::NextPage => {
                self.next_page();
                Ok(())
            }
            OperatorAction::PreviousPage => {
                self.previous_page();
                Ok(())
            }
            OperatorAction::SetPageSize(page_size) => self.set_page_size(page_size),
            OperatorAction::SetCapacity(capacity) => {
                self.set_capacity(capacity);
                Ok(())
            }
            OperatorAction::Reconnect => self.reconnect(sink),
            OperatorAction::Quit => Ok(()),
        };

        if let Err(e) = &result {
            tracing::warn!("{e}");
            self.report_error_message(e.to_string());
        }
        result
    }

    fn reconnect<S>(&mut self, sink: &mut S) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        match sink.connection_state() {
            ConnectionState::Disconnected => {
                sink.reconnect()?;
                self.report_info("Reconnecting");
            }
            state => self.report_info(format!("Already {state}")),
        }
        Ok(())
    }

    fn selected_where(&self, eligible: fn(OrderStatus) -> bool) -> Vec<OrderId> {
        self.selection
            .iter()
            .filter(|order_id| {
                self.cache
                    .get(order_id.as_str())
                    .is_some_and(|order| eligible(order.status))
            })
            .cloned()
            .collect()
    }

    fn send_each<S, F>(
        &mut self,
        sink: &mut S,
        order_ids: Vec<OrderId>,
        command: F,
    ) -> DeskResult<usize>
    where
        S: CommandSink + ?Sized,
        F: Fn(OrderId) -> OutboundCommand,
    {
        let mut sent = 0;
        for order_id in order_ids {
            self.send(sink, &command(order_id))?;
            sent += 1;
        }
        Ok(sent)
    }

    fn send<S>(&self, sink: &mut S, command: &OutboundCommand) -> DeskResult<()>
    where
        S: CommandSink + ?Sized,
    {
        ensure_connected(sink)?;
        sink.send_command(command)?;
        tracing::debug!("Sent {}", command.name());
        Ok(())
    }

    fn report_info(&mut self, message: impl Into<String>) {
        self.status = StatusLine {
            level: StatusLevel::Info,
            message: message.into(),
        };
    }

    fn report_error_message(&mut self, message: impl Into<String>) {
        self.status = StatusLine {
            level: StatusLevel::Error,
            message: message.into(),
        };
    }
}

fn ensure_connected<S>(sink: &S) -> DeskResult<()>
where
    S: CommandSink + ?Sized,
{
    if sink.connection_state().is_connected() {
        Ok(())
    } else {
        Err(DeskError::NotConnected)
    }
}

impl FrameHandler for OrderDesk {
    fn on_order_item(&mut self, order: Order) {
        tracing::trace!("Order item {}", order.order_id);
        self.ingest(order);
    }

    fn on_order_updated(&mut self, order: Order) {
        if !self.cache.contains(order.order_id.as_str()) {
            tracing::debug!("Update for uncached order {}, inserting", order.order_id);
        }
        self.ingest(order);
    }

    fn on_status(&mut self, message: String, is_running: Option<bool>) {
        if let Some(is_running) = is_running {
            self.stream_running = is_running;
        }
        self.report_info(message);
    }

    fn on_error(&mut self, message: String) {
        tracing::warn!("Server error: {message}");
        self.report_error_message(message);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

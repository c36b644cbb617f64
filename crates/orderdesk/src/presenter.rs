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

//! Presentation boundary of the order desk.
//!
//! The desk hands a borrowed [`DeskView`] to a [`Presenter`] after every applied event and
//! asks it to confirm closes. [`TextPresenter`] is a plain-text implementation used by the
//! console binary.

use std::{fmt::Write as _, io::Write};

use orderdesk_network::websocket::ConnectionState;

use crate::{
    common::enums::StatusLevel,
    desk::StatusLine,
    model::{Order, OrderCounts, OrderId},
    pagination::PageInfo,
    selection::SelectionSet,
};

/// A read-only snapshot of the desk, valid for one render.
#[derive(Debug)]
pub struct DeskView<'a> {
    pub connection: ConnectionState,
    pub status: &'a StatusLine,
    pub stream_running: bool,
    pub counts: OrderCounts,
    pub capacity: usize,
    pub page: PageInfo,
    /// Orders on the current page, newest first.
    pub orders: Vec<&'a Order>,
    pub selection: &'a SelectionSet,
}

impl DeskView<'_> {
    #[must_use]
    pub fn is_selected(&self, order: &Order) -> bool {
        self.selection.contains(order.order_id.as_str())
    }
}

/// Renders desk state and answers confirmation requests.
pub trait Presenter {
    fn render(&mut self, view: &DeskView<'_>);

    /// Returns `true` if the operator confirms closing `orders`.
    fn confirm_close(&mut self, orders: &[&Order]) -> bool;
}

/// How [`TextPresenter`] answers close confirmations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Every close is confirmed.
    AssumeYes,
    /// A close is confirmed when the same request is issued twice in a row.
    #[default]
    Repeat,
}

/// Writes a plain-text table to `W`.
#[derive(Debug)]
pub struct TextPresenter<W> {
    out: W,
    mode: ConfirmMode,
    armed: Option<Vec<OrderId>>,
}

impl<W: Write> TextPresenter<W> {
    /// Creates a new [`TextPresenter`] instance.
    pub const fn new(out: W, mode: ConfirmMode) -> Self {
        Self {
            out,
            mode,
            armed: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn format_view(view: &DeskView<'_>) -> String {
        let mut text = String::new();
        let stream = if view.stream_running { "running" } else { "stopped" };
        let counts = view.counts;

        let _ = writeln!(
            text,
            "[{}] stream {stream} | total {} / {} | pending {} | processing {} | done {} | selected {}",
            view.connection,
            counts.total,
            view.capacity,
            counts.pending,
            counts.processing,
            counts.done,
            view.selection.size(),
        );

        if view.orders.is_empty() {
            let _ = writeln!(text, "  (no orders)");
        }
        for order in &view.orders {
            let marker = if view.is_selected(order) { '*' } else { ' ' };
            let _ = writeln!(
                text,
                "{marker} {:<16} {:<20} {:<10} {:<8} {} {}",
                order.order_id,
                order.customer_name,
                order.status.as_ref(),
                order.priority.as_ref(),
                order.timestamp.format("%Y-%m-%d %H:%M:%S"),
                order.details,
            );
        }

        let page = view.page;
        let _ = writeln!(
            text,
            "Page {} of {} ({} per page, {} orders)",
            page.page, page.total_pages, page.page_size, page.total_items
        );

        if !view.status.message.is_empty() {
            let prefix = match view.status.level {
                StatusLevel::Info => "",
                StatusLevel::Error => "error: ",
            };
            let _ = writeln!(text, "{prefix}{}", view.status.message);
        }

        text
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render(&mut self, view: &DeskView<'_>) {
        let text = Self::format_view(view);
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::error!("Failed to render view: {e}");
        }
    }

    fn confirm_close(&mut self, orders: &[&Order]) -> bool {
        match self.mode {
            ConfirmMode::AssumeYes => true,
            ConfirmMode::Repeat => {
                let ids: Vec<OrderId> = orders.iter().map(|o| o.order_id.clone()).collect();
                if self.armed.as_ref() == Some(&ids) {
                    self.armed = None;
                    return true;
                }

                let listed: Vec<&str> = ids.iter().map(OrderId::as_str).collect();
                let prompt = format!(
                    "Close {} order(s): {}? Repeat the command to confirm.\n",
                    ids.len(),
                    listed.join(", ")
                );
                if let Err(e) = self.out.write_all(prompt.as_bytes()) {
                    tracing::error!("Failed to write prompt: {e}");
                }
                self.armed = Some(ids);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        common::enums::{OrderPriority, OrderStatus},
        desk::OrderDesk,
        testing::order_with_status,
    };

    fn rendered(presenter: TextPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[rstest]
    fn test_render_marks_selection_and_page() {
        let mut desk = OrderDesk::default();
        desk.ingest(order_with_status("A", 1, OrderStatus::Pending));
        desk.ingest(order_with_status("B", 2, OrderStatus::Processing));
        desk.toggle_selection(&OrderId::from("A")).unwrap();
        let mut presenter = TextPresenter::new(Vec::new(), ConfirmMode::AssumeYes);

        presenter.render(&desk.view());
        let text = rendered(presenter);

        assert!(text.contains("[Disconnected] stream stopped | total 2 / 500"));
        assert!(text.contains("selected 1"));
        assert!(text.contains("* A "));
        assert!(text.contains("  B "));
        assert!(text.contains("Page 1 of 1 (10 per page, 2 orders)"));
        assert!(text.find("  B ").unwrap() < text.find("* A ").unwrap());
    }

    #[rstest]
    fn test_render_shows_server_priority_label() {
        let mut desk = OrderDesk::default();
        let mut order = order_with_status("A", 1, OrderStatus::Pending);
        order.priority = OrderPriority::Other("Urgent".to_string());
        desk.ingest(order);
        let mut presenter = TextPresenter::new(Vec::new(), ConfirmMode::AssumeYes);

        presenter.render(&desk.view());
        let text = rendered(presenter);

        assert!(text.contains(" Urgent "));
        assert!(!text.contains("Other"));
    }

    #[rstest]
    fn test_render_empty() {
        let desk = OrderDesk::default();
        let mut presenter = TextPresenter::new(Vec::new(), ConfirmMode::AssumeYes);

        presenter.render(&desk.view());

        assert!(rendered(presenter).contains("(no orders)"));
    }

    #[rstest]
    fn test_repeat_confirmation() {
        let order = order_with_status("A", 1, OrderStatus::Processing);
        let other = order_with_status("B", 1, OrderStatus::Processing);
        let mut presenter = TextPresenter::new(Vec::new(), ConfirmMode::Repeat);

        assert!(!presenter.confirm_close(&[&order]));
        assert!(!presenter.confirm_close(&[&other]));
        assert!(presenter.confirm_close(&[&other]));
        assert!(!presenter.confirm_close(&[&other]));
        assert!(
            rendered(presenter).contains("Close 1 order(s): B? Repeat the command to confirm.")
        );
    }
}

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

//! Configuration for WebSocket client connections.
//!
//! # Reconnection Strategy
//!
//! Reconnection uses a fixed delay (3000 ms by default) measured from the moment the
//! connection enters the `Disconnected` state. There is no exponential backoff and no jitter.
//!
//! The default configuration uses unlimited reconnection attempts (`reconnect_max_attempts: None`).
//! Use `Some(n)` primarily for testing or non-critical connections.

use std::{fmt::Debug, time::Duration};

/// The default delay (milliseconds) before an automatic reconnection attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

/// The default timeout (milliseconds) for a single connection handshake.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for WebSocket client connections.
///
/// This struct contains only static configuration settings. The event handler
/// is passed separately to [`crate::websocket::WebSocketClient::connect`].
#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// The URL to connect to.
    pub url: String,
    /// The default headers.
    pub headers: Vec<(String, String)>,
    /// The optional heartbeat interval (seconds), sent as ping frames while connected.
    pub heartbeat: Option<u64>,
    /// The timeout (milliseconds) for a single connection handshake.
    pub connect_timeout_ms: u64,
    /// The fixed delay (milliseconds) between entering `Disconnected` and the automatic retry.
    pub reconnect_delay_ms: u64,
    /// The maximum number of consecutive failed attempts before automatic retries stop.
    /// - `None`: Unlimited reconnection attempts (default).
    /// - `Some(n)`: After n consecutive drops or failed handshakes, wait for a manual reconnect.
    pub reconnect_max_attempts: Option<u32>,
}

impl WebSocketConfig {
    /// Creates a new [`WebSocketConfig`] for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            heartbeat: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            reconnect_max_attempts: None,
        }
    }

    /// Returns the reconnect delay as a [`Duration`].
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Returns the handshake timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_new_uses_fixed_three_second_delay() {
        let config = WebSocketConfig::new("ws://127.0.0.1:8000/ws");

        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.reconnect_max_attempts.is_none());
        assert!(config.headers.is_empty());
    }
}

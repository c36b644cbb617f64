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

//! WebSocket client error types.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Error types for the reconnecting WebSocket client.
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    /// Client is not in the `Connected` state.
    #[error("Not connected")]
    NotConnected,
    /// Client has been shut down and accepts no further commands.
    #[error("Client closed")]
    Closed,
    /// The configured URL could not be turned into a handshake request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Transport-level error during WebSocket communication.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Failed to send message over WebSocket.
    #[error("Send error: {0}")]
    Send(String),
    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<tungstenite::Error> for WebSocketError {
    fn from(error: tungstenite::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Result type alias for WebSocket operations.
pub type WebSocketResult<T> = Result<T, WebSocketError>;

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

//! Order desk error types.

use orderdesk_network::error::WebSocketError;
use thiserror::Error;

use crate::{model::OrderId, websocket::error::FrameDecodeError};

/// Errors reported by order desk operations.
///
/// Every variant is recoverable: the desk reports it on the status line and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeskError {
    /// A command was attempted while the connection is not `Connected`.
    #[error("Not connected, command dropped")]
    NotConnected,
    /// The order is not in the cache.
    #[error("Unknown order '{0}'")]
    UnknownOrder(OrderId),
    /// The operation does not apply in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// Configuration values were rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The connection refused the outbound frame.
    #[error("Send error: {0}")]
    Send(String),
    /// An outbound command could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),
    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] FrameDecodeError),
}

impl From<WebSocketError> for DeskError {
    fn from(error: WebSocketError) -> Self {
        match error {
            WebSocketError::NotConnected => Self::NotConnected,
            other => Self::Send(other.to_string()),
        }
    }
}

/// Result type alias for order desk operations.
pub type DeskResult<T> = Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_not_connected_maps_through() {
        assert_eq!(
            DeskError::from(WebSocketError::NotConnected),
            DeskError::NotConnected
        );
    }

    #[rstest]
    fn test_closed_maps_to_send() {
        assert!(matches!(
            DeskError::from(WebSocketError::Closed),
            DeskError::Send(_)
        ));
    }

    #[rstest]
    fn test_display() {
        let error = DeskError::UnknownOrder(OrderId::from("ORD-9"));
        assert_eq!(error.to_string(), "Unknown order 'ORD-9'");
    }
}

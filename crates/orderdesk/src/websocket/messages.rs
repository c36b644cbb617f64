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

//! Wire frames exchanged with the order service.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FrameDecodeError;
use crate::{
    common::enums::FrameKind,
    model::{Order, OrderId},
};

/// A decoded inbound frame.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// A new order.
    OrderItem { data: Order },
    /// A server-confirmed change to an existing order.
    OrderUpdated { data: Order },
    /// Informational status text, optionally carrying the stream state.
    Status {
        message: String,
        #[serde(default, rename = "isRunning")]
        is_running: Option<bool>,
    },
    /// Server-reported error text.
    Error { message: String },
}

impl InboundFrame {
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        match self {
            Self::OrderItem { .. } => FrameKind::OrderItem,
            Self::OrderUpdated { .. } => FrameKind::OrderUpdated,
            Self::Status { .. } => FrameKind::Status,
            Self::Error { .. } => FrameKind::Error,
        }
    }
}

/// An operator command sent to the order service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OutboundCommand {
    StartStream { frequency: f64, max_orders: usize },
    StopStream,
    GenerateBatch { count: usize },
    ProcessOrder { order_id: OrderId },
    CloseOrder { order_id: OrderId },
}

impl OutboundCommand {
    /// Returns the wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartStream { .. } => "start_stream",
            Self::StopStream => "stop_stream",
            Self::GenerateBatch { .. } => "generate_batch",
            Self::ProcessOrder { .. } => "process_order",
            Self::CloseOrder { .. } => "close_order",
        }
    }

    /// Encodes the command as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Parses a raw text frame into an [`InboundFrame`].
///
/// The `type` field is classified first so unknown kinds are distinguished from
/// malformed payloads of known kinds.
///
/// # Errors
///
/// Returns a [`FrameDecodeError`] describing why the frame was rejected.
pub fn parse_raw_message(text: &str) -> Result<InboundFrame, FrameDecodeError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(FrameDecodeError::MissingKind)?;

    if FrameKind::from_str(kind).is_err() {
        return Err(FrameDecodeError::UnknownKind(kind.to_string()));
    }
    let kind = kind.to_string();

    serde_json::from_value(value).map_err(|e| FrameDecodeError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::common::enums::OrderStatus;

    const ORDER_JSON: &str = r#"{"order_id":"ORD-1","customer_name":"Grace","status":"Pending","priority":"Medium","details":"1x gizmo","timestamp":"2025-03-01T09:00:00Z","processed_at":null}"#;

    #[rstest]
    #[case("order_item", FrameKind::OrderItem)]
    #[case("order_updated", FrameKind::OrderUpdated)]
    fn test_parse_order_frames(#[case] kind: &str, #[case] expected: FrameKind) {
        let text = format!(r#"{{"type":"{kind}","data":{ORDER_JSON}}}"#);

        let frame = parse_raw_message(&text).unwrap();

        assert_eq!(frame.kind(), expected);
        match frame {
            InboundFrame::OrderItem { data } | InboundFrame::OrderUpdated { data } => {
                assert_eq!(data.order_id.as_str(), "ORD-1");
                assert_eq!(data.status, OrderStatus::Pending);
            }
            other => panic!("Unexpected frame {other:?}"),
        }
    }

    #[rstest]
    #[case(r#"{"type":"status","message":"Streaming"}"#, None)]
    #[case(r#"{"type":"status","message":"Streaming","isRunning":true}"#, Some(true))]
    #[case(r#"{"type":"status","message":"Streaming","isRunning":false}"#, Some(false))]
    fn test_parse_status(#[case] text: &str, #[case] expected: Option<bool>) {
        let frame = parse_raw_message(text).unwrap();

        assert_eq!(
            frame,
            InboundFrame::Status {
                message: "Streaming".to_string(),
                is_running: expected,
            }
        );
    }

    #[rstest]
    fn test_parse_error() {
        let frame = parse_raw_message(r#"{"type":"error","message":"Order not found"}"#).unwrap();

        assert_eq!(
            frame,
            InboundFrame::Error {
                message: "Order not found".to_string()
            }
        );
    }

    #[rstest]
    fn test_parse_unknown_kind() {
        let result = parse_raw_message(r#"{"type":"new_item","item":{}}"#);

        assert_eq!(
            result,
            Err(FrameDecodeError::UnknownKind("new_item".to_string()))
        );
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2")]
    fn test_parse_invalid_json(#[case] text: &str) {
        assert!(matches!(
            parse_raw_message(text),
            Err(FrameDecodeError::Json(_))
        ));
    }

    #[rstest]
    #[case(r#"{"message":"hi"}"#)]
    #[case(r#"{"type":7}"#)]
    fn test_parse_missing_kind(#[case] text: &str) {
        assert_eq!(parse_raw_message(text), Err(FrameDecodeError::MissingKind));
    }

    #[rstest]
    fn test_parse_malformed_payload() {
        let result = parse_raw_message(r#"{"type":"order_item","data":{"order_id":"X"}}"#);

        assert!(matches!(
            result,
            Err(FrameDecodeError::Malformed { kind, .. }) if kind == "order_item"
        ));
    }

    #[rstest]
    #[case(
        OutboundCommand::StartStream { frequency: 2.0, max_orders: 500 },
        json!({"command": "start_stream", "frequency": 2.0, "max_orders": 500}),
    )]
    #[case(OutboundCommand::StopStream, json!({"command": "stop_stream"}))]
    #[case(
        OutboundCommand::GenerateBatch { count: 20 },
        json!({"command": "generate_batch", "count": 20}),
    )]
    #[case(
        OutboundCommand::ProcessOrder { order_id: OrderId::from("ORD-1") },
        json!({"command": "process_order", "order_id": "ORD-1"}),
    )]
    #[case(
        OutboundCommand::CloseOrder { order_id: OrderId::from("ORD-2") },
        json!({"command": "close_order", "order_id": "ORD-2"}),
    )]
    fn test_encode_commands(
        #[case] command: OutboundCommand,
        #[case] expected: serde_json::Value,
    ) {
        let encoded: serde_json::Value =
            serde_json::from_str(&command.to_json().unwrap()).unwrap();

        assert_eq!(encoded, expected);
        assert_eq!(encoded["command"], command.name());
    }
}

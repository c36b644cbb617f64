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

//! Routes decoded frames to per-kind handler entry points.

use super::{
    error::FrameDecodeError,
    messages::{InboundFrame, parse_raw_message},
};
use crate::{common::enums::FrameKind, model::Order};

/// Receives decoded inbound frames, one method per frame kind.
pub trait FrameHandler {
    fn on_order_item(&mut self, order: Order);
    fn on_order_updated(&mut self, order: Order);
    fn on_status(&mut self, message: String, is_running: Option<bool>);
    fn on_error(&mut self, message: String);
}

/// Decodes `text` and invokes the matching [`FrameHandler`] method.
///
/// Holds no state of its own.
///
/// # Errors
///
/// Returns the decode error when the frame is rejected; the handler is not called.
pub fn route_frame<H>(text: &str, handler: &mut H) -> Result<FrameKind, FrameDecodeError>
where
    H: FrameHandler + ?Sized,
{
    let frame = parse_raw_message(text)?;
    let kind = frame.kind();

    match frame {
        InboundFrame::OrderItem { data } => handler.on_order_item(data),
        InboundFrame::OrderUpdated { data } => handler.on_order_updated(data),
        InboundFrame::Status {
            message,
            is_running,
        } => handler.on_status(message, is_running),
        InboundFrame::Error { message } => handler.on_error(message),
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl FrameHandler for Recorder {
        fn on_order_item(&mut self, order: Order) {
            self.calls.push(format!("item:{}", order.order_id));
        }

        fn on_order_updated(&mut self, order: Order) {
            self.calls.push(format!("updated:{}", order.order_id));
        }

        fn on_status(&mut self, message: String, is_running: Option<bool>) {
            self.calls.push(format!("status:{message}:{is_running:?}"));
        }

        fn on_error(&mut self, message: String) {
            self.calls.push(format!("error:{message}"));
        }
    }

    #[rstest]
    fn test_routes_each_kind() {
        let order = r#"{"order_id":"A","customer_name":"C","status":"Done","priority":"Low","details":"","timestamp":"2025-01-01T00:00:00Z","processed_at":"2025-01-01T00:01:00Z"}"#;
        let frames = [
            format!(r#"{{"type":"order_item","data":{order}}}"#),
            format!(r#"{{"type":"order_updated","data":{order}}}"#),
            r#"{"type":"status","message":"ok","isRunning":true}"#.to_string(),
            r#"{"type":"error","message":"boom"}"#.to_string(),
        ];
        let mut recorder = Recorder::default();

        let kinds: Vec<FrameKind> = frames
            .iter()
            .map(|text| route_frame(text, &mut recorder).unwrap())
            .collect();

        assert_eq!(
            kinds,
            vec![
                FrameKind::OrderItem,
                FrameKind::OrderUpdated,
                FrameKind::Status,
                FrameKind::Error,
            ]
        );
        assert_eq!(
            recorder.calls,
            vec!["item:A", "updated:A", "status:ok:Some(true)", "error:boom"]
        );
    }

    #[rstest]
    fn test_rejected_frame_is_not_routed() {
        let mut recorder = Recorder::default();

        let result = route_frame(r#"{"type":"heartbeat"}"#, &mut recorder);

        assert!(matches!(result, Err(FrameDecodeError::UnknownKind(_))));
        assert!(recorder.calls.is_empty());
    }
}

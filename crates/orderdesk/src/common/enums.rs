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

//! Enumerations for orders and protocol frames.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Lifecycle status of an order, as reported by the server.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum OrderStatus {
    /// Received, not yet picked up for processing.
    Pending,
    /// Being processed by the server.
    Processing,
    /// Closed.
    Done,
}

impl OrderStatus {
    /// Returns whether a `process_order` command applies to this status.
    #[must_use]
    pub const fn is_processable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns whether a `close_order` command applies to this status.
    #[must_use]
    pub const fn is_closable(self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// Order priority. Carries no ordering semantics in the cache.
///
/// Labels without a variant of their own are kept verbatim in [`OrderPriority::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderPriority {
    Low,
    Medium,
    High,
    Critical,
    #[strum(default)]
    Other(String),
}

impl OrderPriority {
    /// Returns the wire label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Other(label) => label,
        }
    }
}

impl AsRef<str> for OrderPriority {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for OrderPriority {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Other(value))
    }
}

impl From<OrderPriority> for String {
    fn from(value: OrderPriority) -> Self {
        match value {
            OrderPriority::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Kinds of inbound frames.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum FrameKind {
    OrderItem,
    OrderUpdated,
    Status,
    Error,
}

/// Severity of the operator-facing status line.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Info,
    Error,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("order_item", FrameKind::OrderItem)]
    #[case("order_updated", FrameKind::OrderUpdated)]
    #[case("status", FrameKind::Status)]
    #[case("error", FrameKind::Error)]
    fn test_frame_kind_from_wire(#[case] raw: &str, #[case] expected: FrameKind) {
        assert_eq!(FrameKind::from_str(raw).unwrap(), expected);
        assert_eq!(expected.as_ref(), raw);
    }

    #[rstest]
    #[case("\"High\"", OrderPriority::High)]
    #[case("\"Urgent\"", OrderPriority::Other("Urgent".to_string()))]
    #[case("\"high\"", OrderPriority::Other("high".to_string()))]
    fn test_priority_label_is_kept(#[case] raw: &str, #[case] expected: OrderPriority) {
        let priority: OrderPriority = serde_json::from_str(raw).unwrap();

        assert_eq!(priority, expected);
        assert_eq!(serde_json::to_string(&priority).unwrap(), raw);
        assert_eq!(priority.to_string(), raw.trim_matches('"'));
    }

    #[rstest]
    #[case(OrderStatus::Pending, true, false)]
    #[case(OrderStatus::Processing, false, true)]
    #[case(OrderStatus::Done, false, false)]
    fn test_status_eligibility(
        #[case] status: OrderStatus,
        #[case] processable: bool,
        #[case] closable: bool,
    ) {
        assert_eq!(status.is_processable(), processable);
        assert_eq!(status.is_closable(), closable);
    }
}

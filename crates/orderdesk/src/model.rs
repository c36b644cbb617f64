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

//! Order records as mirrored from the order service.

use std::{borrow::Borrow, fmt::Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{
    enums::{OrderPriority, OrderStatus},
    parse::{deserialize_optional_timestamp, deserialize_timestamp},
};

/// Server-assigned order identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new [`OrderId`] instance.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OrderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single order as reported by the server.
///
/// The client never changes `status` itself; a new value only arrives with an
/// `order_updated` frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique, immutable identifier.
    pub order_id: OrderId,
    pub customer_name: String,
    pub status: OrderStatus,
    pub priority: OrderPriority,
    #[serde(default)]
    pub details: String,
    /// Creation instant; drives the cache ordering and eviction.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Present once the order has left `Pending`.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// Order totals by status, computed from the cache on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderCounts {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
}

impl OrderCounts {
    /// Adds a single order to the tallies.
    pub fn record(&mut self, status: OrderStatus) {
        self.total += 1;
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Processing => self.processing += 1,
            OrderStatus::Done => self.done += 1,
        }
    }
}

impl<'a> FromIterator<&'a Order> for OrderCounts {
    fn from_iter<I: IntoIterator<Item = &'a Order>>(iter: I) -> Self {
        let mut counts = Self::default();
        for order in iter {
            counts.record(order.status);
        }
        counts
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_deserialize_order() {
        let json = r#"{
            "order_id": "ORD-1001",
            "customer_name": "Ada Lovelace",
            "status": "Processing",
            "priority": "High",
            "details": "2x widgets",
            "timestamp": "2025-03-01T12:30:45Z",
            "processed_at": "2025-03-01T12:31:00"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();

        assert_eq!(order.order_id.as_str(), "ORD-1001");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.priority, OrderPriority::High);
        assert_eq!(
            order.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 45).unwrap()
        );
        assert_eq!(
            order.processed_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 31, 0).unwrap())
        );
    }

    #[rstest]
    #[case(r#""processed_at": null"#)]
    #[case(r#""processed_at": """#)]
    #[case(r#""details": "none""#)]
    fn test_deserialize_order_without_processed_at(#[case] extra: &str) {
        let json = format!(
            r#"{{"order_id": "A", "customer_name": "Bob", "status": "Pending",
                "priority": "Low", "timestamp": "2025-03-01T12:30:45Z", {extra}}}"#
        );

        let order: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order.processed_at, None);
    }

    #[rstest]
    fn test_unlisted_priority_survives_round_trip() {
        let json = r#"{"order_id": "A", "customer_name": "Bob", "status": "Pending",
            "priority": "Urgent", "timestamp": "2025-03-01T12:30:45Z"}"#;

        let order: Order = serde_json::from_str(json).unwrap();
        let encoded = serde_json::to_value(&order).unwrap();

        assert_eq!(order.priority.as_str(), "Urgent");
        assert_eq!(encoded["priority"], "Urgent");
    }

    #[rstest]
    fn test_deserialize_order_rejects_unknown_status() {
        let json = r#"{"order_id": "A", "customer_name": "Bob", "status": "Cancelled",
            "priority": "Low", "details": "", "timestamp": "2025-03-01T12:30:45Z"}"#;

        assert!(serde_json::from_str::<Order>(json).is_err());
    }

    #[rstest]
    fn test_order_counts() {
        let counts: OrderCounts = [OrderStatus::Pending, OrderStatus::Pending, OrderStatus::Done]
            .into_iter()
            .fold(OrderCounts::default(), |mut counts, status| {
                counts.record(status);
                counts
            });

        assert_eq!(
            counts,
            OrderCounts {
                total: 3,
                pending: 2,
                processing: 0,
                done: 1,
            }
        );
    }
}

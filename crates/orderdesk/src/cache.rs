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

//! Bounded, newest-first order cache.
//!
//! [`OrderCache`] exclusively owns every [`Order`] known to the client. It keeps a derived
//! ordering of identifiers by creation timestamp (newest first, ties resolved by insertion
//! order) and evicts from the oldest end whenever a mutation leaves it over capacity.

use std::{cmp::Reverse, ops::Range};

use ahash::AHashMap;

use crate::{
    common::{consts::DEFAULT_CAPACITY, parse::capacity_or_default},
    model::{Order, OrderCounts, OrderId},
};

#[derive(Clone, Debug)]
struct CacheEntry {
    order: Order,
    seq: u64,
}

/// The result of ingesting a single order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// `true` if the identifier was new to the cache.
    pub inserted: bool,
    /// Identifiers evicted by capacity pressure, oldest first.
    pub evicted: Vec<OrderId>,
}

/// Client-side mirror of server orders with a capacity bound.
#[derive(Clone, Debug)]
pub struct OrderCache {
    entries: AHashMap<OrderId, CacheEntry>,
    ordering: Vec<OrderId>,
    capacity: usize,
    next_seq: u64,
}

impl Default for OrderCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl OrderCache {
    /// Creates a new [`OrderCache`] instance.
    ///
    /// A `capacity` of zero selects the default capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity_or_default(capacity);
        // The bound may be far larger than what is ever cached
        let reserve = capacity.min(DEFAULT_CAPACITY);
        Self {
            entries: AHashMap::with_capacity(reserve),
            ordering: Vec::with_capacity(reserve),
            capacity,
            next_seq: 0,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    #[must_use]
    pub fn contains(&self, order_id: &str) -> bool {
        self.entries.contains_key(order_id)
    }

    #[must_use]
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.entries.get(order_id).map(|entry| &entry.order)
    }

    /// Inserts `order`, or replaces the record with the same identifier, then evicts
    /// the oldest entries beyond capacity.
    ///
    /// A replaced record keeps its original insertion rank for tie-breaking.
    pub fn ingest(&mut self, order: Order) -> IngestOutcome {
        let inserted = match self.entries.get_mut(order.order_id.as_str()) {
            Some(entry) => {
                entry.order = order;
                false
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries
                    .insert(order.order_id.clone(), CacheEntry { order, seq });
                true
            }
        };

        self.rebuild_ordering();
        let evicted = self.evict();

        IngestOutcome { inserted, evicted }
    }

    /// Updates the capacity bound and evicts immediately.
    ///
    /// A `capacity` of zero selects the default capacity.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<OrderId> {
        self.capacity = capacity_or_default(capacity);
        tracing::debug!("Cache capacity set to {}", self.capacity);
        self.evict()
    }

    /// Returns the current identifier ordering, newest first.
    #[must_use]
    pub fn ordering(&self) -> &[OrderId] {
        &self.ordering
    }

    /// Returns the orders in the current ordering, newest first.
    pub fn query(&self) -> impl DoubleEndedIterator<Item = &Order> + '_ {
        self.ordering.iter().filter_map(|id| self.get(id.as_str()))
    }

    /// Returns the orders at positions `range` of the current ordering.
    ///
    /// The range is clipped to the cache size.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Vec<&Order> {
        let end = range.end.min(self.ordering.len());
        let start = range.start.min(end);

        self.ordering[start..end]
            .iter()
            .filter_map(|id| self.get(id.as_str()))
            .collect()
    }

    #[must_use]
    pub fn counts(&self) -> OrderCounts {
        self.entries.values().map(|entry| &entry.order).collect()
    }

    fn rebuild_ordering(&mut self) {
        let mut keyed: Vec<_> = self
            .entries
            .iter()
            .map(|(order_id, entry)| {
                (
                    Reverse(entry.order.timestamp),
                    Reverse(entry.seq),
                    order_id,
                )
            })
            .collect();

        // Sequence numbers are unique, so an unstable sort is deterministic
        keyed.sort_unstable();

        self.ordering = keyed
            .into_iter()
            .map(|(_, _, order_id)| order_id.clone())
            .collect();
    }

    fn evict(&mut self) -> Vec<OrderId> {
        let excess = self.ordering.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }

        let keep = self.ordering.len() - excess;
        let evicted: Vec<OrderId> = self.ordering.drain(keep..).rev().collect();

        for order_id in &evicted {
            self.entries.remove(order_id.as_str());
        }

        tracing::debug!(
            "Evicted {} order(s) over capacity {}",
            evicted.len(),
            self.capacity
        );
        evicted
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

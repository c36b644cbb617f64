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

//! Operator selection of orders.

use indexmap::IndexSet;

use crate::model::OrderId;

/// The set of order identifiers currently marked by the operator.
///
/// Iteration follows insertion order, so bulk actions walk the selection in the
/// order the operator built it.
#[derive(Clone, Debug, Default)]
pub struct SelectionSet {
    ids: IndexSet<OrderId>,
}

impl SelectionSet {
    /// Creates a new empty [`SelectionSet`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `order_id`, returning `true` if it is now selected.
    pub fn toggle(&mut self, order_id: &OrderId) -> bool {
        if self.ids.shift_remove(order_id) {
            false
        } else {
            self.ids.insert(order_id.clone());
            true
        }
    }

    /// Adds `order_id`, returning `true` if it was not already selected.
    pub fn select(&mut self, order_id: OrderId) -> bool {
        self.ids.insert(order_id)
    }

    /// Removes `order_id`, returning `true` if it was selected.
    pub fn deselect(&mut self, order_id: &str) -> bool {
        self.ids.shift_remove(order_id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, order_id: &str) -> bool {
        self.ids.contains(order_id)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates the selection in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderId> {
        self.ids.iter()
    }

    /// Drops every selected identifier for which `is_present` returns `false`.
    ///
    /// Returns the number of identifiers removed.
    pub fn reconcile<F>(&mut self, mut is_present: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.ids.len();
        self.ids.retain(|order_id| is_present(order_id.as_str()));
        let removed = before - self.ids.len();

        if removed > 0 {
            tracing::debug!("Dropped {removed} evicted order(s) from selection");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn id(value: &str) -> OrderId {
        OrderId::from(value)
    }

    #[rstest]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionSet::new();

        assert!(selection.toggle(&id("A")));
        assert!(selection.contains("A"));
        assert_eq!(selection.size(), 1);

        assert!(!selection.toggle(&id("A")));
        assert!(!selection.contains("A"));
        assert!(selection.is_empty());
    }

    #[rstest]
    fn test_iteration_follows_insertion_order() {
        let mut selection = SelectionSet::new();
        selection.toggle(&id("C"));
        selection.toggle(&id("A"));
        selection.toggle(&id("B"));
        selection.toggle(&id("A"));
        selection.toggle(&id("A"));

        let order: Vec<&str> = selection.iter().map(OrderId::as_str).collect();

        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[rstest]
    fn test_reconcile_drops_missing() {
        let mut selection = SelectionSet::new();
        selection.select(id("A"));
        selection.select(id("B"));
        selection.select(id("C"));

        let removed = selection.reconcile(|order_id| order_id != "B");

        assert_eq!(removed, 1);
        assert!(!selection.contains("B"));
        assert_eq!(selection.size(), 2);
    }

    #[rstest]
    fn test_clear() {
        let mut selection = SelectionSet::new();
        selection.select(id("A"));
        selection.select(id("B"));

        selection.clear();

        assert_eq!(selection.size(), 0);
        assert!(!selection.deselect("A"));
    }
}

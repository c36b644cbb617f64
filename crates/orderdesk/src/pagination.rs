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

//! Page arithmetic over the cache ordering.
//!
//! [`Pagination`] stores only the page number and page size. Totals always come from the
//! cache at call time, so the visible page can never drift from the ordering it slices.

use std::ops::Range;

use crate::{
    common::consts::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_CHOICES},
    error::{DeskError, DeskResult},
};

/// Summary of the current page for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
}

/// Current page number and page size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
    choices: Vec<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            choices: DEFAULT_PAGE_SIZE_CHOICES.to_vec(),
        }
    }
}

impl Pagination {
    /// Creates a new [`Pagination`] instance on page 1.
    ///
    /// # Errors
    ///
    /// Returns an error if `choices` is empty or contains zero, or if `page_size`
    /// is not one of `choices`.
    pub fn new(page_size: usize, choices: Vec<usize>) -> DeskResult<Self> {
        if choices.is_empty() || choices.contains(&0) {
            return Err(DeskError::InvalidConfig(format!(
                "page size choices must be non-empty and positive, was {choices:?}"
            )));
        }
        if !choices.contains(&page_size) {
            return Err(DeskError::InvalidConfig(format!(
                "page size {page_size} is not one of {choices:?}"
            )));
        }

        Ok(Self {
            page: 1,
            page_size,
            choices,
        })
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn choices(&self) -> &[usize] {
        &self.choices
    }

    /// Returns `max(1, ceil(total_items / page_size))`.
    #[must_use]
    pub const fn total_pages(&self, total_items: usize) -> usize {
        let pages = total_items.div_ceil(self.page_size);
        if pages == 0 { 1 } else { pages }
    }

    /// Changes the page size and re-clamps the current page.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidOperation`] if `page_size` is not one of the choices.
    pub fn set_page_size(&mut self, page_size: usize, total_items: usize) -> DeskResult<()> {
        if !self.choices.contains(&page_size) {
            return Err(DeskError::InvalidOperation(format!(
                "page size {page_size} is not one of {:?}",
                self.choices
            )));
        }

        self.page_size = page_size;
        self.reclamp(total_items);
        Ok(())
    }

    /// Moves to `page`, clamped to `[1, total_pages]`, and returns the resulting page.
    pub fn go_to_page(&mut self, page: usize, total_items: usize) -> usize {
        self.page = page.clamp(1, self.total_pages(total_items));
        self.page
    }

    pub fn next_page(&mut self, total_items: usize) -> usize {
        self.go_to_page(self.page.saturating_add(1), total_items)
    }

    pub fn previous_page(&mut self, total_items: usize) -> usize {
        self.go_to_page(self.page.saturating_sub(1), total_items)
    }

    /// Re-applies the page bound after the item count changed.
    pub fn reclamp(&mut self, total_items: usize) {
        self.go_to_page(self.page, total_items);
    }

    /// Returns the ordering positions `[(page - 1) * page_size, page * page_size)`.
    ///
    /// The range may extend past `total_items` on the last page; callers clip it.
    #[must_use]
    pub fn page_range(&self) -> Range<usize> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        start..start.saturating_add(self.page_size)
    }

    #[must_use]
    pub const fn info(&self, total_items: usize) -> PageInfo {
        PageInfo {
            page: self.page,
            total_pages: self.total_pages(total_items),
            page_size: self.page_size,
            total_items,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

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

//! Order desk constants and defaults.

/// Default WebSocket endpoint of the order service.
pub const ORDERDESK_WS_URL: &str = "ws://127.0.0.1:8000/ws";

/// Default maximum number of orders held by the cache.
pub const DEFAULT_CAPACITY: usize = 500;

/// Default number of orders shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes the operator may choose from.
pub const DEFAULT_PAGE_SIZE_CHOICES: [usize; 5] = [5, 10, 25, 50, 100];

/// Default stream frequency (seconds between generated orders).
pub const DEFAULT_STREAM_FREQUENCY_SECS: f64 = 2.0;

/// Default number of orders requested by a batch.
pub const DEFAULT_BATCH_COUNT: usize = 20;

/// Prefix for environment variable overrides.
pub const ORDERDESK_ENV_PREFIX: &str = "ORDERDESK_";

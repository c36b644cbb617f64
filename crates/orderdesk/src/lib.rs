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

//! Client-side order desk for a streaming order service.
//!
//! The desk keeps a bounded, newest-first mirror of the orders pushed over a reconnecting
//! WebSocket connection, together with the operator's selection and a paginated view.
//! Operators start and stop the server stream, request batches, and process or close
//! orders; status changes only ever arrive from the server.
//!
//! # Modules
//!
//! - [`cache`]: the bounded order store and its derived ordering.
//! - [`selection`] and [`pagination`]: operator state derived from the cache.
//! - [`desk`]: frame handling and command handlers over the above.
//! - [`websocket`]: wire frames, frame routing and the client event loop.
//! - [`presenter`]: the rendering and confirmation boundary.

#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]

pub mod action;
pub mod cache;
pub mod common;
pub mod config;
pub mod desk;
pub mod error;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod presenter;
pub mod selection;
pub mod testing;
pub mod websocket;

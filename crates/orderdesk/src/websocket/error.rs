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

//! Frame decoding error types.

use thiserror::Error;

/// Errors raised while decoding an inbound frame.
///
/// None of these are fatal: the router logs the error and drops the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDecodeError {
    /// The frame is not valid JSON.
    #[error("JSON error: {0}")]
    Json(String),
    /// The frame has no string `type` field.
    #[error("Frame has no 'type' field")]
    MissingKind,
    /// The `type` field names a kind this client does not handle.
    #[error("Unknown frame kind '{0}'")]
    UnknownKind(String),
    /// The frame kind is known but its payload does not match.
    #[error("Malformed '{kind}' frame: {reason}")]
    Malformed {
        /// The frame kind.
        kind: String,
        /// Why the payload was rejected.
        reason: String,
    },
}

impl From<serde_json::Error> for FrameDecodeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

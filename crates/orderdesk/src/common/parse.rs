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

//! Parsing helpers for wire values and operator input.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};

use super::consts::DEFAULT_CAPACITY;

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 timestamp into a UTC instant.
///
/// Timestamps without an offset are interpreted as UTC.
///
/// # Errors
///
/// Returns an error if `value` is not a recognizable ISO-8601 timestamp.
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    anyhow::bail!("Invalid ISO-8601 timestamp: '{value}'")
}

/// Deserializes an ISO-8601 timestamp string.
///
/// # Errors
///
/// Returns an error if the value is not a string or cannot be parsed.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(D::Error::custom)
}

/// Deserializes an optional ISO-8601 timestamp string, treating `null` and `""` as absent.
///
/// # Errors
///
/// Returns an error if a present value cannot be parsed.
pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Parses an operator supplied cache capacity.
///
/// Anything other than a positive integer yields the default capacity.
#[must_use]
pub fn parse_capacity(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(capacity) if capacity > 0 => capacity,
        _ => {
            tracing::warn!("Invalid capacity '{raw}', using default {DEFAULT_CAPACITY}");
            DEFAULT_CAPACITY
        }
    }
}

/// Returns `capacity`, or the default when it is zero.
#[must_use]
pub const fn capacity_or_default(capacity: usize) -> usize {
    if capacity == 0 {
        DEFAULT_CAPACITY
    } else {
        capacity
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

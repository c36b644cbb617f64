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

//! Configuration for the order desk.
//!
//! Values come from defaults, then `ORDERDESK_*` environment variables (a `.env` file is
//! loaded first when present), then command line flags applied by the binary.

use orderdesk_network::websocket::{
    WebSocketConfig,
    config::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_RECONNECT_DELAY_MS},
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{
        consts::{
            DEFAULT_BATCH_COUNT, DEFAULT_CAPACITY, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_CHOICES,
            DEFAULT_STREAM_FREQUENCY_SECS, ORDERDESK_ENV_PREFIX, ORDERDESK_WS_URL,
        },
        parse::parse_capacity,
    },
    error::{DeskError, DeskResult},
};

/// Order desk configuration. None of it is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDeskConfig {
    /// The WebSocket endpoint of the order service.
    pub ws_url: String,
    /// Maximum number of orders held in the cache.
    pub capacity: usize,
    /// Initial page size; must be one of `page_size_choices`.
    pub page_size: usize,
    pub page_size_choices: Vec<usize>,
    /// Seconds between generated orders when starting the stream.
    pub stream_frequency_secs: f64,
    /// Orders requested by a batch when no count is given.
    pub batch_count: usize,
    pub reconnect_delay_ms: u64,
    pub connect_timeout_ms: u64,
    /// `None` retries forever.
    pub reconnect_max_attempts: Option<u32>,
}

impl Default for OrderDeskConfig {
    fn default() -> Self {
        Self {
            ws_url: ORDERDESK_WS_URL.to_string(),
            capacity: DEFAULT_CAPACITY,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_choices: DEFAULT_PAGE_SIZE_CHOICES.to_vec(),
            stream_frequency_secs: DEFAULT_STREAM_FREQUENCY_SECS,
            batch_count: DEFAULT_BATCH_COUNT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            reconnect_max_attempts: None,
        }
    }
}

impl OrderDeskConfig {
    /// Loads the configuration from `ORDERDESK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!("Failed to load .env file: {e}");
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from `lookup`, which resolves full variable names.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed or the configuration is invalid.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{ORDERDESK_ENV_PREFIX}{suffix}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = var("WS_URL") {
            config.ws_url = url;
        }
        if let Some(raw) = var("CAPACITY") {
            config.capacity = parse_capacity(&raw);
        }
        if let Some(raw) = var("PAGE_SIZE") {
            config.page_size = parse_var("PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = var("PAGE_SIZE_CHOICES") {
            config.page_size_choices = raw
                .split(',')
                .map(|choice| parse_var("PAGE_SIZE_CHOICES", choice.trim()))
                .collect::<anyhow::Result<_>>()?;
        }
        if let Some(raw) = var("STREAM_FREQUENCY_SECS") {
            config.stream_frequency_secs = parse_var("STREAM_FREQUENCY_SECS", &raw)?;
        }
        if let Some(raw) = var("BATCH_COUNT") {
            config.batch_count = parse_var("BATCH_COUNT", &raw)?;
        }
        if let Some(raw) = var("RECONNECT_DELAY_MS") {
            config.reconnect_delay_ms = parse_var("RECONNECT_DELAY_MS", &raw)?;
        }
        if let Some(raw) = var("CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms = parse_var("CONNECT_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = var("RECONNECT_MAX_ATTEMPTS") {
            config.reconnect_max_attempts = Some(parse_var("RECONNECT_MAX_ATTEMPTS", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the desk cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> DeskResult<()> {
        if self.ws_url.trim().is_empty() {
            return Err(DeskError::InvalidConfig("ws_url is empty".to_string()));
        }
        if self.page_size_choices.is_empty() || self.page_size_choices.contains(&0) {
            return Err(DeskError::InvalidConfig(format!(
                "page_size_choices must be non-empty and positive, was {:?}",
                self.page_size_choices
            )));
        }
        if !self.page_size_choices.contains(&self.page_size) {
            return Err(DeskError::InvalidConfig(format!(
                "page_size {} is not one of {:?}",
                self.page_size, self.page_size_choices
            )));
        }
        if !self.stream_frequency_secs.is_finite() || self.stream_frequency_secs <= 0.0 {
            return Err(DeskError::InvalidConfig(format!(
                "stream_frequency_secs must be positive, was {}",
                self.stream_frequency_secs
            )));
        }
        if self.batch_count == 0 {
            return Err(DeskError::InvalidConfig(
                "batch_count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the connection settings for the order service.
    #[must_use]
    pub fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::new(self.ws_url.clone());
        config.reconnect_delay_ms = self.reconnect_delay_ms;
        config.connect_timeout_ms = self.connect_timeout_ms;
        config.reconnect_max_attempts = self.reconnect_max_attempts;
        config
    }
}

fn parse_var<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid {ORDERDESK_ENV_PREFIX}{name} '{raw}': {e}"))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

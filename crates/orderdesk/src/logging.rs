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

//! Logging initialization for binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to binaries.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_level` when set. Repeat calls are no-ops.
///
/// # Errors
///
/// Returns an error if `default_level` is not a valid filter directive or another global
/// subscriber is already installed.
pub fn init_logging(default_level: &str) -> anyhow::Result<()> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let _ = LOGGING_INITIALIZED.set(());
    Ok(())
}

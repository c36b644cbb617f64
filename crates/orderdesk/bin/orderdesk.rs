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

//! Console operator for the order desk.
//!
//! Reads one command per line from stdin (type `help` for the grammar) and prints the
//! current page after every change.
//!
//! # Environment Variables
//!
//! - `ORDERDESK_WS_URL`, `ORDERDESK_CAPACITY`, `ORDERDESK_PAGE_SIZE` and the other
//!   `ORDERDESK_*` settings; a `.env` file is honoured.
//! - `RUST_LOG` overrides `--log-level`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p orderdesk --bin orderdesk -- --url ws://127.0.0.1:8000/ws --page-size 25
//! ```

use clap::Parser;
use orderdesk::{
    action::{CONSOLE_HELP, OperatorAction},
    common::parse::parse_capacity,
    config::OrderDeskConfig,
    logging::init_logging,
    presenter::{ConfirmMode, TextPresenter},
    websocket::OrderDeskClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "orderdesk", version, about = "Operate a streaming order service from the console")]
struct Cli {
    /// WebSocket endpoint of the order service.
    #[arg(long)]
    url: Option<String>,
    /// Maximum number of orders to keep (non-positive values select 500).
    #[arg(long)]
    capacity: Option<String>,
    /// Initial page size.
    #[arg(long)]
    page_size: Option<usize>,
    /// Default seconds between streamed orders.
    #[arg(long)]
    frequency: Option<f64>,
    /// Default number of orders per batch.
    #[arg(long)]
    batch_count: Option<usize>,
    /// Delay before reconnecting after a drop (milliseconds).
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
    /// Confirm closes without asking.
    #[arg(long, short = 'y')]
    yes: bool,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn apply(&self, config: &mut OrderDeskConfig) {
        if let Some(url) = &self.url {
            config.ws_url.clone_from(url);
        }
        if let Some(capacity) = &self.capacity {
            config.capacity = parse_capacity(capacity);
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(frequency) = self.frequency {
            config.stream_frequency_secs = frequency;
        }
        if let Some(batch_count) = self.batch_count {
            config.batch_count = batch_count;
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.reconnect_delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut config = OrderDeskConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let mode = if cli.yes {
        ConfirmMode::AssumeYes
    } else {
        ConfirmMode::Repeat
    };
    let presenter = TextPresenter::new(std::io::stdout(), mode);
    let mut client = OrderDeskClient::start(config, presenter).await?;

    println!("{CONSOLE_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("help") {
                    println!("{CONSOLE_HELP}");
                    continue;
                }

                match line.parse::<OperatorAction>() {
                    Ok(OperatorAction::Quit) => break,
                    Ok(action) => client.submit(action)?,
                    Err(e) => println!("{e} (type 'help' for commands)"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            () = wait_finished(&client) => break,
        }
    }

    client.shutdown().await;
    Ok(())
}

async fn wait_finished(client: &OrderDeskClient) {
    while !client.is_finished() {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }
}

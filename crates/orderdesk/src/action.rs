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

//! Operator actions and the console command grammar.

use std::str::FromStr;

use crate::{
    common::parse::parse_capacity,
    error::{DeskError, DeskResult},
    model::OrderId,
};

/// A single operator intent.
#[derive(Clone, Debug, PartialEq)]
pub enum OperatorAction {
    /// Start the server stream; `None` uses the configured frequency.
    StartStream { frequency: Option<f64> },
    StopStream,
    /// Request a batch of orders; `None` uses the configured count.
    GenerateBatch { count: Option<usize> },
    Process(OrderId),
    Close(OrderId),
    ToggleSelect(OrderId),
    /// Select every order on the current page, or deselect them if all are selected.
    SelectPage,
    ClearSelection,
    ProcessSelected,
    CloseSelected,
    GoToPage(usize),
    NextPage,
    PreviousPage,
    SetPageSize(usize),
    SetCapacity(usize),
    Reconnect,
    Quit,
}

/// Console usage text.
pub const CONSOLE_HELP: &str = "\
Commands:
  start [frequency]      start the order stream
  stop                   stop the order stream
  batch [count]          generate a batch of orders
  process <order_id>     process a pending order
  close <order_id>       close a processing order
  select <order_id>      toggle selection of an order
  select-page            toggle selection of the current page
  clear-selection        clear the selection
  process-selected       process selected pending orders
  close-selected         close selected processing orders
  page <n> | next | prev navigate pages
  size <n>               set the page size
  capacity <n>           set the cache capacity
  reconnect              reconnect now
  quit                   exit";

impl FromStr for OperatorAction {
    type Err = DeskError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(DeskError::InvalidOperation("empty command".to_string()));
        };
        let arg = parts.next();
        if let Some(extra) = parts.next() {
            return Err(DeskError::InvalidOperation(format!(
                "unexpected argument '{extra}' for '{verb}'"
            )));
        }

        let action = match verb.to_ascii_lowercase().as_str() {
            "start" => Self::StartStream {
                frequency: arg.map(|raw| parse_arg(verb, raw)).transpose()?,
            },
            "stop" => Self::StopStream,
            "batch" => Self::GenerateBatch {
                count: arg.map(|raw| parse_arg(verb, raw)).transpose()?,
            },
            "process" => Self::Process(require_id(verb, arg)?),
            "close" => Self::Close(require_id(verb, arg)?),
            "select" => Self::ToggleSelect(require_id(verb, arg)?),
            "select-page" => Self::SelectPage,
            "clear-selection" => Self::ClearSelection,
            "process-selected" => Self::ProcessSelected,
            "close-selected" => Self::CloseSelected,
            "page" => Self::GoToPage(parse_arg(verb, require(verb, arg)?)?),
            "next" => Self::NextPage,
            "prev" | "previous" => Self::PreviousPage,
            "size" => Self::SetPageSize(parse_arg(verb, require(verb, arg)?)?),
            "capacity" => Self::SetCapacity(parse_capacity(require(verb, arg)?)),
            "reconnect" => Self::Reconnect,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(DeskError::InvalidOperation(format!(
                    "unknown command '{other}'"
                )));
            }
        };

        Ok(action)
    }
}

fn require<'a>(verb: &str, arg: Option<&'a str>) -> DeskResult<&'a str> {
    arg.ok_or_else(|| DeskError::InvalidOperation(format!("'{verb}' needs an argument")))
}

fn require_id(verb: &str, arg: Option<&str>) -> DeskResult<OrderId> {
    require(verb, arg).map(OrderId::from)
}

fn parse_arg<T: FromStr>(verb: &str, raw: &str) -> DeskResult<T> {
    raw.parse()
        .map_err(|_| DeskError::InvalidOperation(format!("invalid argument '{raw}' for '{verb}'")))
}

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

//! Connection lifecycle state machine.
//!
//! ```text
//!                 Start / RetryTimerFired
//!  Disconnected ───────────────────────────▶ Connecting
//!       ▲                                        │
//!       │ TransportClosed     HandshakeSucceeded │
//!       │                                        ▼
//!       └──────────────────────────────────── Connected
//! ```
//!
//! Every transition is a pure function of the current state and one
//! [`ConnectionEvent`], returning the [`ConnectionEffect`]s the driver must perform.
//! Entering `Disconnected` always schedules exactly one retry timer (replacing any
//! older one); reaching `Connected` cancels it.

use std::time::Duration;

use strum::{AsRefStr, Display};

/// The lifecycle state of the single logical connection.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, AsRefStr)]
#[repr(u8)]
pub enum ConnectionState {
    /// No transport is open.
    #[default]
    Disconnected = 0,
    /// A handshake is in flight.
    Connecting = 1,
    /// The transport is open and frames are flowing.
    Connected = 2,
}

impl ConnectionState {
    /// Decodes a state previously stored with `as u8`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// Returns whether commands may be sent in this state.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Identifies one scheduled retry timer so stale expirations can be ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RetryToken(u64);

impl RetryToken {
    /// Returns the raw generation number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Inputs to the connection state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Explicit start or manual reconnect request.
    Start,
    /// The transport handshake completed.
    HandshakeSucceeded,
    /// The transport handshake failed.
    HandshakeFailed(String),
    /// The open transport closed or errored, for any reason.
    TransportClosed(String),
    /// A previously scheduled retry timer expired.
    RetryTimerFired(RetryToken),
    /// Shut the connection down; no further automatic retries.
    Stop,
}

/// Side effects requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEffect {
    /// Begin a transport handshake.
    OpenTransport,
    /// Close and release the open transport.
    CloseTransport,
    /// Arm a retry timer.
    ScheduleRetry { token: RetryToken, delay: Duration },
    /// Disarm a retry timer.
    CancelRetry(RetryToken),
    /// The observable state changed.
    StateChanged(ConnectionState),
}

/// Pure connection lifecycle state machine.
#[derive(Clone, Debug)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
    reconnect_delay: Duration,
    max_attempts: Option<u32>,
    failed_attempts: u32,
    pending_retry: Option<RetryToken>,
    next_token: u64,
    stopped: bool,
}

impl ConnectionStateMachine {
    /// Creates a new [`ConnectionStateMachine`] in the `Disconnected` state.
    #[must_use]
    pub const fn new(reconnect_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            max_attempts,
            failed_attempts: 0,
            pending_retry: None,
            next_token: 0,
            stopped: false,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the currently armed retry timer, if any.
    #[must_use]
    pub const fn pending_retry(&self) -> Option<RetryToken> {
        self.pending_retry
    }

    /// Returns whether the machine has been stopped.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Returns the number of consecutive drops or failed handshakes.
    #[must_use]
    pub const fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Applies `event` and returns the effects the driver must perform, in order.
    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<ConnectionEffect> {
        match event {
            ConnectionEvent::Start => self.on_start(),
            ConnectionEvent::HandshakeSucceeded => self.on_handshake_succeeded(),
            ConnectionEvent::HandshakeFailed(reason) => {
                if self.state == ConnectionState::Connecting {
                    tracing::warn!("Connection attempt failed: {reason}");
                    self.enter_disconnected()
                } else {
                    Vec::new()
                }
            }
            ConnectionEvent::TransportClosed(reason) => {
                if self.state == ConnectionState::Connected {
                    tracing::warn!("Connection closed: {reason}");
                    self.enter_disconnected()
                } else {
                    Vec::new()
                }
            }
            ConnectionEvent::RetryTimerFired(token) => self.on_retry_timer(token),
            ConnectionEvent::Stop => self.on_stop(),
        }
    }

    fn on_start(&mut self) -> Vec<ConnectionEffect> {
        self.stopped = false;

        if self.state != ConnectionState::Disconnected {
            tracing::debug!("Start ignored while {}", self.state);
            return Vec::new();
        }

        // An armed retry timer stays armed: only reaching Connected disarms it
        self.transition(ConnectionState::Connecting, vec![ConnectionEffect::OpenTransport])
    }

    fn on_handshake_succeeded(&mut self) -> Vec<ConnectionEffect> {
        if self.state != ConnectionState::Connecting {
            // Stopped while the handshake was in flight
            return vec![ConnectionEffect::CloseTransport];
        }

        self.failed_attempts = 0;

        let mut effects = Vec::new();
        if let Some(token) = self.pending_retry.take() {
            effects.push(ConnectionEffect::CancelRetry(token));
        }

        self.transition(ConnectionState::Connected, effects)
    }

    fn on_retry_timer(&mut self, token: RetryToken) -> Vec<ConnectionEffect> {
        if self.pending_retry != Some(token) {
            tracing::trace!("Ignoring stale retry timer {}", token.value());
            return Vec::new();
        }
        self.pending_retry = None;

        if self.stopped || self.state != ConnectionState::Disconnected {
            // A manual reconnect won the race; its attempt stands in for this one
            return Vec::new();
        }

        tracing::info!("Reconnecting (attempt {})", self.failed_attempts + 1);
        self.transition(ConnectionState::Connecting, vec![ConnectionEffect::OpenTransport])
    }

    fn on_stop(&mut self) -> Vec<ConnectionEffect> {
        self.stopped = true;

        let mut effects = Vec::new();
        if let Some(token) = self.pending_retry.take() {
            effects.push(ConnectionEffect::CancelRetry(token));
        }
        if self.state != ConnectionState::Disconnected {
            effects.push(ConnectionEffect::CloseTransport);
            return self.transition(ConnectionState::Disconnected, effects);
        }

        effects
    }

    fn enter_disconnected(&mut self) -> Vec<ConnectionEffect> {
        self.failed_attempts = self.failed_attempts.saturating_add(1);

        let mut effects = self.transition(ConnectionState::Disconnected, Vec::new());

        if self.stopped {
            return effects;
        }

        if let Some(max) = self.max_attempts
            && self.failed_attempts >= max
        {
            tracing::warn!(
                "Reached maximum reconnection attempts ({max}), waiting for manual reconnect"
            );
            if let Some(token) = self.pending_retry.take() {
                effects.push(ConnectionEffect::CancelRetry(token));
            }
            return effects;
        }

        if let Some(stale) = self.pending_retry.take() {
            effects.push(ConnectionEffect::CancelRetry(stale));
        }

        let token = RetryToken(self.next_token);
        self.next_token += 1;
        self.pending_retry = Some(token);

        tracing::debug!(
            "Scheduling reconnect in {}ms (token {})",
            self.reconnect_delay.as_millis(),
            token.value()
        );
        effects.push(ConnectionEffect::ScheduleRetry {
            token,
            delay: self.reconnect_delay,
        });

        effects
    }

    fn transition(
        &mut self,
        next: ConnectionState,
        mut effects: Vec<ConnectionEffect>,
    ) -> Vec<ConnectionEffect> {
        if self.state != next {
            tracing::info!("Connection state {} -> {}", self.state, next);
            self.state = next;
            effects.push(ConnectionEffect::StateChanged(next));
        }
        effects
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    const DELAY: Duration = Duration::from_millis(3_000);

    #[fixture]
    fn machine() -> ConnectionStateMachine {
        ConnectionStateMachine::new(DELAY, None)
    }

    fn connected(mut machine: ConnectionStateMachine) -> ConnectionStateMachine {
        machine.handle(ConnectionEvent::Start);
        machine.handle(ConnectionEvent::HandshakeSucceeded);
        assert_eq!(machine.state(), ConnectionState::Connected);
        machine
    }

    fn scheduled_token(effects: &[ConnectionEffect]) -> RetryToken {
        effects
            .iter()
            .find_map(|effect| match effect {
                ConnectionEffect::ScheduleRetry { token, .. } => Some(*token),
                _ => None,
            })
            .expect("expected a scheduled retry")
    }

    #[rstest]
    fn test_start_opens_transport(mut machine: ConnectionStateMachine) {
        let effects = machine.handle(ConnectionEvent::Start);

        assert_eq!(
            effects,
            vec![
                ConnectionEffect::OpenTransport,
                ConnectionEffect::StateChanged(ConnectionState::Connecting),
            ]
        );
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[rstest]
    fn test_transport_close_schedules_fixed_delay_retry(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);

        let effects = machine.handle(ConnectionEvent::TransportClosed("server gone".into()));

        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(effects.len(), 2);
        assert_eq!(
            effects[0],
            ConnectionEffect::StateChanged(ConnectionState::Disconnected)
        );
        match &effects[1] {
            ConnectionEffect::ScheduleRetry { delay, .. } => assert_eq!(*delay, DELAY),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[rstest]
    fn test_retry_timer_reconnects_exactly_once(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);
        let effects = machine.handle(ConnectionEvent::TransportClosed("eof".into()));
        let token = scheduled_token(&effects);

        let first = machine.handle(ConnectionEvent::RetryTimerFired(token));
        let second = machine.handle(ConnectionEvent::RetryTimerFired(token));

        assert_eq!(
            first,
            vec![
                ConnectionEffect::OpenTransport,
                ConnectionEffect::StateChanged(ConnectionState::Connecting),
            ]
        );
        assert!(second.is_empty());
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert!(machine.pending_retry().is_none());
    }

    #[rstest]
    fn test_connected_cancels_pending_retry(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);
        let effects = machine.handle(ConnectionEvent::TransportClosed("eof".into()));
        let token = scheduled_token(&effects);

        // Manual reconnect races the timer
        machine.handle(ConnectionEvent::Start);
        let effects = machine.handle(ConnectionEvent::HandshakeSucceeded);

        assert!(effects.contains(&ConnectionEffect::CancelRetry(token)));
        assert!(machine.pending_retry().is_none());
        assert!(
            machine
                .handle(ConnectionEvent::RetryTimerFired(token))
                .is_empty()
        );
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[rstest]
    fn test_manual_reconnect_keeps_timer_armed(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);
        let effects = machine.handle(ConnectionEvent::TransportClosed("eof".into()));
        let token = scheduled_token(&effects);

        machine.handle(ConnectionEvent::Start);

        assert_eq!(machine.pending_retry(), Some(token));
        // Timer fires mid-handshake: redundant, nothing to do
        assert!(
            machine
                .handle(ConnectionEvent::RetryTimerFired(token))
                .is_empty()
        );
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[rstest]
    fn test_failed_handshake_replaces_stale_timer(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);
        let first = scheduled_token(&machine.handle(ConnectionEvent::TransportClosed("eof".into())));

        machine.handle(ConnectionEvent::Start);
        let effects = machine.handle(ConnectionEvent::HandshakeFailed("refused".into()));
        let second = scheduled_token(&effects);

        assert_ne!(first, second);
        assert!(effects.contains(&ConnectionEffect::CancelRetry(first)));
        assert!(
            machine
                .handle(ConnectionEvent::RetryTimerFired(first))
                .is_empty()
        );
        assert_eq!(machine.pending_retry(), Some(second));
    }

    #[rstest]
    fn test_start_is_noop_when_connected(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);

        assert!(machine.handle(ConnectionEvent::Start).is_empty());
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[rstest]
    fn test_close_ignored_unless_connected(mut machine: ConnectionStateMachine) {
        assert!(
            machine
                .handle(ConnectionEvent::TransportClosed("late".into()))
                .is_empty()
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(machine.pending_retry().is_none());
    }

    #[rstest]
    fn test_stop_closes_and_disarms(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);

        let effects = machine.handle(ConnectionEvent::Stop);

        assert_eq!(
            effects,
            vec![
                ConnectionEffect::CloseTransport,
                ConnectionEffect::StateChanged(ConnectionState::Disconnected),
            ]
        );
        assert!(machine.is_stopped());
    }

    #[rstest]
    fn test_stop_while_disconnected_cancels_timer(machine: ConnectionStateMachine) {
        let mut machine = connected(machine);
        let token = scheduled_token(&machine.handle(ConnectionEvent::TransportClosed("eof".into())));

        let effects = machine.handle(ConnectionEvent::Stop);

        assert_eq!(effects, vec![ConnectionEffect::CancelRetry(token)]);
        assert!(
            machine
                .handle(ConnectionEvent::RetryTimerFired(token))
                .is_empty()
        );
    }

    #[rstest]
    fn test_handshake_after_stop_closes_transport(mut machine: ConnectionStateMachine) {
        machine.handle(ConnectionEvent::Start);
        machine.handle(ConnectionEvent::Stop);

        let effects = machine.handle(ConnectionEvent::HandshakeSucceeded);

        assert_eq!(effects, vec![ConnectionEffect::CloseTransport]);
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[rstest]
    fn test_max_attempts_stops_automatic_retry() {
        let mut machine = ConnectionStateMachine::new(DELAY, Some(2));
        machine.handle(ConnectionEvent::Start);

        let effects = machine.handle(ConnectionEvent::HandshakeFailed("refused".into()));
        let token = scheduled_token(&effects);
        machine.handle(ConnectionEvent::RetryTimerFired(token));
        let effects = machine.handle(ConnectionEvent::HandshakeFailed("refused".into()));

        assert_eq!(machine.failed_attempts(), 2);
        assert_eq!(
            effects,
            vec![ConnectionEffect::StateChanged(ConnectionState::Disconnected)]
        );
        assert!(machine.pending_retry().is_none());
    }

    #[rstest]
    #[case(0, ConnectionState::Disconnected)]
    #[case(1, ConnectionState::Connecting)]
    #[case(2, ConnectionState::Connected)]
    #[case(9, ConnectionState::Disconnected)]
    fn test_state_from_u8(#[case] raw: u8, #[case] expected: ConnectionState) {
        assert_eq!(ConnectionState::from_u8(raw), expected);
    }
}

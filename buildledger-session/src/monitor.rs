//! Idle-session state machine

use buildledger_config::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Warning,
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Active => "active",
            SessionState::Warning => "warning",
            SessionState::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// User input counted as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Mouse,
    Key,
    Scroll,
    Touch,
}

/// State change produced by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Active → Warning, with the time left before expiry
    WarningRaised { remaining: Duration },
    /// Warning → Active
    WarningCleared,
    /// Active/Warning → Expired
    Expired,
}

/// Tracks the last activity of one session and derives its state
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    idle_timeout: Duration,
    warning_after: Duration,
    last_activity: Instant,
    state: SessionState,
    warning_shown: bool,
}

impl SessionMonitor {
    pub fn new(config: &SessionConfig, now: Instant) -> Self {
        Self {
            idle_timeout: config.idle_timeout,
            warning_after: config.warning_after(),
            last_activity: now,
            state: SessionState::Active,
            warning_shown: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn warning_shown(&self) -> bool {
        self.warning_shown
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Time left before the idle timeout; zero once expired
    pub fn time_until_expiry(&self, now: Instant) -> Duration {
        if self.state == SessionState::Expired {
            return Duration::ZERO;
        }
        self.idle_timeout.saturating_sub(self.idle_for(now))
    }

    /// Re-derive the state from elapsed idle time
    pub fn evaluate(&mut self, now: Instant) -> Option<Transition> {
        if self.state == SessionState::Expired {
            return None;
        }

        let idle = self.idle_for(now);

        if idle >= self.idle_timeout {
            self.state = SessionState::Expired;
            self.warning_shown = false;
            return Some(Transition::Expired);
        }

        if idle >= self.warning_after && self.state == SessionState::Active {
            self.state = SessionState::Warning;
            self.warning_shown = true;
            return Some(Transition::WarningRaised {
                remaining: self.idle_timeout - idle,
            });
        }

        None
    }

    /// Register user input
    ///
    /// Input arriving after the idle timeout has already elapsed cannot
    /// revive the session; it expires instead.
    pub fn record_activity(&mut self, _kind: ActivityKind, now: Instant) -> Option<Transition> {
        self.touch(now)
    }

    /// The user acknowledged the warning and chose to stay signed in
    pub fn dismiss_warning(&mut self, now: Instant) -> Option<Transition> {
        if self.state != SessionState::Warning {
            return None;
        }
        self.touch(now)
    }

    fn touch(&mut self, now: Instant) -> Option<Transition> {
        match self.state {
            SessionState::Expired => None,
            _ if self.idle_for(now) >= self.idle_timeout => self.evaluate(now),
            SessionState::Warning => {
                self.last_activity = now;
                self.state = SessionState::Active;
                self.warning_shown = false;
                Some(Transition::WarningCleared)
            }
            SessionState::Active => {
                self.last_activity = now;
                None
            }
        }
    }
}

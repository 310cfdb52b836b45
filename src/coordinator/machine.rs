//! Redirect state machine, free of timers and I/O.
//!
//! ```text
//!   Idle ──begin──► CountingDown{n} ──tick──► CountingDown{n-1} ── … ──► Navigated
//!     │                   │                                               ▲
//!     └────────finish─────┴───────────────────finish──────────────────────┘
//! ```
//!
//! `begin` is guarded by `attempted`: a machine enters `CountingDown` at most
//! once in its lifetime, no matter how many qualifying signals arrive.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RedirectState {
    Idle,
    CountingDown { remaining: u32 },
    Navigated,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u32),
    Expired,
}

#[derive(Debug, Clone)]
pub struct RedirectMachine {
    state: RedirectState,
    attempted: bool,
    countdown_secs: u32,
}

impl RedirectMachine {
    #[must_use]
    pub fn new(countdown_secs: u32) -> Self {
        Self { state: RedirectState::Idle, attempted: false, countdown_secs }
    }

    #[must_use]
    pub fn state(&self) -> RedirectState {
        self.state
    }

    /// Whether a session has ever started (or the machine was finished).
    #[must_use]
    pub fn attempted(&self) -> bool {
        self.attempted
    }

    /// Idle → CountingDown. Returns the starting count, or `None` if a session
    /// was already attempted.
    pub fn begin(&mut self) -> Option<u32> {
        if self.attempted {
            return None;
        }
        self.attempted = true;
        self.state = RedirectState::CountingDown { remaining: self.countdown_secs };
        Some(self.countdown_secs)
    }

    /// Decrement the countdown. `None` when not counting down.
    pub fn tick(&mut self) -> Option<Tick> {
        let RedirectState::CountingDown { remaining } = self.state else {
            return None;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.state = RedirectState::Navigated;
            Some(Tick::Expired)
        } else {
            self.state = RedirectState::CountingDown { remaining };
            Some(Tick::Remaining(remaining))
        }
    }

    /// Any state → Navigated. Used for expiry and manual override alike.
    pub fn finish(&mut self) {
        self.attempted = true;
        self.state = RedirectState::Navigated;
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod tests;

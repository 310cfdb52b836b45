//! Redirect coordinator - decides when the shell jumps to the target URL.
//!
//! ARCHITECTURE
//! ============
//! One tokio task owns every piece of mutable state: the persisted auth flag,
//! the redirect state machine, the countdown timer, and the loading flag. It
//! `select!`s over:
//!
//! - the inbox (bridge messages, key chords, the manual control, load signal)
//! - the countdown tick, while a session is active
//! - a fallback poll of the host's current URL
//! - the loading overlay deadline
//! - the cancellation token
//!
//! Because nothing else touches that state, no locking is needed. Flag reads
//! and writes run on tokio's blocking pool; writes are not awaited.
//!
//! LIFECYCLE
//! =========
//! `spawn_coordinator` returns a `CoordinatorHandle`. `teardown` (or dropping
//! the handle) cancels the task; the countdown interval, poll interval, and
//! loading deadline are owned by the task and die with it, so no tick can
//! reach the host afterwards.

pub mod countdown;
pub mod machine;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bridge::ParentPort;
use crate::config::{ShellConfig, Timings};
use crate::host::ShellHost;
use crate::message::{KeyChord, NavigationEvent, ShellInput};
use crate::signin::{HomePattern, is_signed_in_url};
use crate::storage::{AuthFlag, KvStore};
use countdown::Countdown;
use machine::{RedirectMachine, RedirectState, Tick};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellStatus {
    pub redirect: RedirectState,
    pub loading: bool,
}

// =============================================================================
// HANDLE
// =============================================================================

pub struct CoordinatorHandle {
    inbox: mpsc::UnboundedSender<ShellInput>,
    status: watch::Receiver<ShellStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CoordinatorHandle {
    /// Queue an input. Returns false once the coordinator has stopped.
    pub fn send(&self, input: ShellInput) -> bool {
        self.inbox.send(input).is_ok()
    }

    /// Message port for a bridge posting into this coordinator.
    #[must_use]
    pub fn port(&self) -> ParentPort {
        ParentPort::new(self.inbox.clone())
    }

    #[must_use]
    pub fn status(&self) -> ShellStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ShellStatus> {
        self.status.clone()
    }

    /// Cancel the coordinator and wait for its task to finish.
    pub async fn teardown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "coordinator task ended abnormally");
            }
        }
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the coordinator task on the current runtime.
pub fn spawn_coordinator<H, S>(config: &ShellConfig, host: H, store: S) -> CoordinatorHandle
where
    H: ShellHost,
    S: KvStore,
{
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(ShellStatus { redirect: RedirectState::Idle, loading: true });
    let cancel = CancellationToken::new();

    let coordinator = Coordinator {
        host,
        auth: AuthFlag::new(store, config.auth_key.clone()),
        machine: RedirectMachine::new(config.timings.countdown_secs),
        countdown: Countdown::idle(),
        loading: true,
        target_url: config.target_url.to_string(),
        home: config.home.clone(),
        manual_chord: config.manual_chord.clone(),
        timings: config.timings,
        status_tx,
    };
    let task = tokio::spawn(coordinator.run(inbox_rx, cancel.clone()));

    CoordinatorHandle { inbox: inbox_tx, status: status_rx, cancel, task: Some(task) }
}

// =============================================================================
// COORDINATOR TASK
// =============================================================================

struct Coordinator<H, S> {
    host: H,
    auth: AuthFlag<S>,
    machine: RedirectMachine,
    countdown: Countdown,
    loading: bool,
    target_url: String,
    home: HomePattern,
    manual_chord: KeyChord,
    timings: Timings,
    status_tx: watch::Sender<ShellStatus>,
}

impl<H: ShellHost, S: KvStore> Coordinator<H, S> {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<ShellInput>, cancel: CancellationToken) {
        self.host.loading_changed(true);
        if self.auth.load().await {
            self.begin_session("previously signed in");
        }

        let poll_every = countdown::repeating_period(self.timings.poll_interval);
        let mut poll = tokio::time::interval_at(Instant::now() + poll_every, poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let loading_deadline = tokio::time::sleep(self.timings.loading_timeout);
        tokio::pin!(loading_deadline);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                maybe_input = inbox.recv() => {
                    let Some(input) = maybe_input else {
                        break;
                    };
                    self.handle_input(input);
                }
                () = self.countdown.tick(), if self.countdown.is_active() => self.on_tick(),
                () = &mut loading_deadline, if self.loading => self.finish_loading("timeout"),
                _ = poll.tick() => self.poll_location(),
            }
        }

        self.countdown.cancel();
        debug!("coordinator stopped");
    }

    fn handle_input(&mut self, input: ShellInput) {
        match input {
            ShellInput::Message { data } => match NavigationEvent::from_message(&data) {
                Some(NavigationEvent::Navigation { url }) => {
                    self.host.record_current_url(&url);
                    if is_signed_in_url(&url, &self.home) {
                        self.begin_session("signed-in navigation");
                    }
                }
                Some(NavigationEvent::LinkClick { url }) => self.host.record_outbound_url(&url),
                None => debug!(%data, "ignoring unrecognized message"),
            },
            ShellInput::Key(pressed) => {
                if self.manual_chord.matches(&pressed) {
                    self.navigate_to_target("key chord");
                }
            }
            ShellInput::GoToTarget => self.navigate_to_target("manual control"),
            ShellInput::ContentLoaded => {
                if self.loading {
                    self.finish_loading("content loaded");
                }
            }
        }
    }

    fn begin_session(&mut self, reason: &'static str) {
        let Some(remaining) = self.machine.begin() else {
            debug!(reason, "redirect already attempted; ignoring");
            return;
        };
        self.persist_flag();
        info!(reason, remaining, "redirect countdown started");

        if remaining == 0 {
            self.navigate_to_target("zero-length countdown");
            return;
        }
        self.countdown = Countdown::start(self.timings.tick);
        self.host.countdown_changed(Some(remaining));
        self.publish();
    }

    fn on_tick(&mut self) {
        match self.machine.tick() {
            Some(Tick::Remaining(remaining)) => {
                self.host.countdown_changed(Some(remaining));
                self.publish();
            }
            Some(Tick::Expired) => self.navigate_to_target("countdown expired"),
            None => self.countdown.cancel(),
        }
    }

    fn poll_location(&mut self) {
        if self.machine.attempted() {
            return;
        }
        let Some(url) = self.host.current_url() else {
            return;
        };
        if is_signed_in_url(&url, &self.home) {
            self.begin_session("location poll");
        }
    }

    fn navigate_to_target(&mut self, reason: &'static str) {
        self.countdown.cancel();
        self.machine.finish();
        self.persist_flag();
        info!(reason, url = %self.target_url, "navigating to target");
        self.host.countdown_changed(None);
        self.host.navigate(&self.target_url);
        self.publish();
    }

    fn finish_loading(&mut self, reason: &'static str) {
        self.loading = false;
        debug!(reason, "loading overlay hidden");
        self.host.loading_changed(false);
        self.publish();
    }

    fn persist_flag(&self) {
        let _write = self.auth.mark_in_background();
    }

    fn publish(&self) {
        self.status_tx.send_replace(ShellStatus { redirect: self.machine.state(), loading: self.loading });
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

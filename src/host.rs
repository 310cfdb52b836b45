//! Host-side operations the coordinator calls into.
//!
//! DESIGN
//! ======
//! The native window (webview, overlay, button) is an external collaborator.
//! The coordinator only needs it to record URLs, navigate, report where it
//! currently is, and reflect countdown/loading state in the UI. All calls are
//! fire-and-forget: nothing the host returns feeds back into the state machine
//! except `current_url`, which polling reads.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

pub trait ShellHost: Send + 'static {
    /// A link meant to open outside the embedded page was clicked.
    fn record_outbound_url(&mut self, url: &str);
    /// The embedded page navigated in place.
    fn record_current_url(&mut self, url: &str);
    /// Move the shell's main view to `url`.
    fn navigate(&mut self, url: &str);
    /// Where the embedded view currently is, if known.
    fn current_url(&self) -> Option<String>;
    /// Countdown display: `Some(n)` while counting, `None` once resolved.
    fn countdown_changed(&mut self, _remaining: Option<u32>) {}
    /// Loading overlay visibility.
    fn loading_changed(&mut self, _loading: bool) {}
}

// =============================================================================
// WIRE COMMANDS
// =============================================================================

/// One host call, as written to the sidecar's output stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum HostCommand {
    RecordOutboundUrl { url: String },
    RecordCurrentUrl { url: String },
    Navigate { url: String },
    Countdown { remaining: Option<u32> },
    Loading { visible: bool },
}

/// Latest location reported by the native window. Shared between the input
/// reader (writer side) and the host (reader side).
#[derive(Debug, Clone, Default)]
pub struct LocationCell {
    inner: Arc<Mutex<Option<String>>>,
}

impl LocationCell {
    pub fn set(&self, url: impl Into<String>) {
        *self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(url.into());
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Host that serializes every call as one JSON line.
pub struct StdioHost<W> {
    out: W,
    location: LocationCell,
}

impl<W: Write + Send + 'static> StdioHost<W> {
    pub fn new(out: W, location: LocationCell) -> Self {
        Self { out, location }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, command: &HostCommand) {
        let result = serde_json::to_string(command)
            .map_err(std::io::Error::other)
            .and_then(|line| writeln!(self.out, "{line}"))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, ?command, "host command write failed");
        }
    }
}

impl<W: Write + Send + 'static> ShellHost for StdioHost<W> {
    fn record_outbound_url(&mut self, url: &str) {
        self.send(&HostCommand::RecordOutboundUrl { url: url.to_string() });
    }

    fn record_current_url(&mut self, url: &str) {
        self.location.set(url);
        self.send(&HostCommand::RecordCurrentUrl { url: url.to_string() });
    }

    fn navigate(&mut self, url: &str) {
        self.send(&HostCommand::Navigate { url: url.to_string() });
    }

    fn current_url(&self) -> Option<String> {
        self.location.get()
    }

    fn countdown_changed(&mut self, remaining: Option<u32>) {
        self.send(&HostCommand::Countdown { remaining });
    }

    fn loading_changed(&mut self, loading: bool) {
        self.send(&HostCommand::Loading { visible: loading });
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "host_test.rs"]
mod tests;

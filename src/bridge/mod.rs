//! Navigation bridge - makes the embedded page's navigation observable.
//!
//! DESIGN
//! ======
//! The bridge installs three hooks into the page and forwards what they see
//! to the parent context as `NavigationEvent` messages:
//!
//! 1. completed `push_state`/`replace_state` → `navigation`
//! 2. back/forward traversal → `navigation`
//! 3. clicks whose nearest link opens a new browsing context → the page's
//!    default is cancelled and a `link-click` carrying the resolved URL is
//!    posted instead
//!
//! Right after installing, it posts one `navigation` with the current URL so
//! the parent starts from a snapshot. The bridge keeps no event log; it only
//! forwards.
//!
//! ERROR HANDLING
//! ==============
//! If the page's document cannot be reached the failure is logged and the
//! bridge goes inert for the life of the page: nothing installed, nothing
//! posted, no retry.

pub mod page;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::message::{NavigationEvent, ShellInput};
use crate::observer::Subscription;
use page::{ClickEvent, EmbeddedPage};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("embedded document at {url} is not accessible")]
    DocumentInaccessible { url: String },
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

// =============================================================================
// PARENT PORT
// =============================================================================

/// Sending half of the page-to-shell message channel.
///
/// Payloads are plain JSON, as a `postMessage` would carry them. Delivery is
/// in send order to the single receiver; there is no acknowledgement.
#[derive(Debug, Clone)]
pub struct ParentPort {
    tx: mpsc::UnboundedSender<ShellInput>,
}

impl ParentPort {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ShellInput>) -> Self {
        Self { tx }
    }

    pub fn post_message(&self, data: serde_json::Value) {
        if self.tx.send(ShellInput::Message { data }).is_err() {
            debug!("parent context gone; message dropped");
        }
    }

    fn post(&self, event: &NavigationEvent) {
        self.post_message(event.to_message());
    }
}

// =============================================================================
// BRIDGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    /// Not installed yet.
    Pending,
    /// Hooks installed and forwarding.
    Active,
    /// Installation failed; the bridge does nothing.
    Inert,
}

pub struct Bridge {
    port: ParentPort,
    hooks: Vec<Subscription>,
    status: BridgeStatus,
}

impl Bridge {
    #[must_use]
    pub fn new(port: ParentPort) -> Self {
        Self { port, hooks: Vec::new(), status: BridgeStatus::Pending }
    }

    #[must_use]
    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    /// Wait `delay` for the page to attach its DOM, then install.
    pub async fn install_after(&mut self, page: &EmbeddedPage, delay: Duration) -> BridgeStatus {
        tokio::time::sleep(delay).await;
        self.install(page)
    }

    /// Install hooks into `page` and post the initial snapshot.
    ///
    /// Runs once; later calls return the existing status unchanged.
    pub fn install(&mut self, page: &EmbeddedPage) -> BridgeStatus {
        if self.status != BridgeStatus::Pending {
            return self.status;
        }

        match self.hook(page) {
            Ok(hooks) => {
                self.hooks = hooks;
                self.status = BridgeStatus::Active;
                let url = page.location().to_string();
                info!(%url, "navigation bridge installed");
                self.port.post(&NavigationEvent::Navigation { url });
            }
            Err(e) => {
                error!(error = %e, "navigation bridge install failed; bridge inert");
                self.status = BridgeStatus::Inert;
            }
        }
        self.status
    }

    /// Unregister every hook. The bridge stops forwarding.
    pub fn detach(&mut self) {
        for hook in &mut self.hooks {
            hook.cancel();
        }
        self.hooks.clear();
    }

    fn hook(&self, page: &EmbeddedPage) -> Result<Vec<Subscription>, BridgeError> {
        // Resolve the document first so a failure leaves nothing half-installed.
        let document = page.document()?;

        let history_port = self.port.clone();
        let on_state_change = page.history().on_state_change(move |url| {
            history_port.post(&NavigationEvent::Navigation { url: url.to_string() });
        });

        let pop_port = self.port.clone();
        let on_popstate = page.history().on_popstate(move |url| {
            pop_port.post(&NavigationEvent::Navigation { url: url.to_string() });
        });

        let click_port = self.port.clone();
        let on_click = document.on_click(move |event| intercept_external_click(&click_port, event));

        Ok(vec![on_state_change, on_popstate, on_click])
    }
}

fn intercept_external_click(port: &ParentPort, event: &ClickEvent) {
    let Some(link) = event.target().closest_link() else {
        return;
    };
    if !link.opens_new_context() {
        return;
    }
    let Some(url) = link.href().and_then(|href| event.resolve(href)) else {
        debug!(href = ?link.href(), "external link href did not resolve; leaving click alone");
        return;
    };
    event.prevent_default();
    port.post(&NavigationEvent::LinkClick { url: url.to_string() });
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

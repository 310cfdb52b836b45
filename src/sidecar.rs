//! Stdio surface between the native window and the coordinator.
//!
//! The window process writes one JSON object per line to our stdin, tagged by
//! `channel` (see `message::ShellInput`), plus `{"channel":"location","url":...}`
//! reports that only update the polled location. Host commands go back out as
//! JSON lines on stdout via `host::StdioHost`. Logs stay on stderr.
//!
//! The binary does not run inside the embedded page. The window's in-page
//! script must do what `bridge::Bridge` does: post one `navigation` snapshot
//! once installed, a `navigation` per history push, replace, and traversal,
//! and a `link-click` (with the default action cancelled) for links that open
//! a new browsing context. Each payload is relayed here wrapped as
//! `{"channel":"message","data":{...}}`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config::ShellConfig;
use crate::coordinator::{CoordinatorHandle, spawn_coordinator};
use crate::host::{LocationCell, StdioHost};
use crate::message::ShellInput;
use crate::storage::FileStore;

#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    #[error("reading window input failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("coordinator stopped while window input was still open")]
    CoordinatorStopped,
}

/// Run the shell until stdin closes or the process is interrupted.
pub async fn run(config: ShellConfig) -> Result<(), SidecarError> {
    let location = LocationCell::default();
    location.set(config.signin_url.as_str());

    let host = StdioHost::new(std::io::stdout(), location.clone());
    let store = FileStore::new(config.store_path.clone());
    let handle = spawn_coordinator(&config, host, store);

    let stdin = BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        result = pump(stdin, &handle, &location) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(0)
        }
    };

    handle.teardown().await;
    let forwarded = result?;
    info!(forwarded, "window input closed; shell stopped");
    Ok(())
}

/// Feed window input lines into the coordinator until EOF.
///
/// Returns how many inputs were forwarded. Location reports update `location`
/// and are not forwarded; unreadable lines are skipped. Fails if the
/// coordinator is no longer accepting input.
pub async fn pump<R>(reader: R, handle: &CoordinatorHandle, location: &LocationCell) -> Result<usize, SidecarError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "skipping non-JSON input line");
                continue;
            }
        };

        if value.get("channel").and_then(serde_json::Value::as_str) == Some("location") {
            match value.get("url").and_then(serde_json::Value::as_str) {
                Some(url) => location.set(url),
                None => debug!(%value, "location report without url"),
            }
            continue;
        }

        let input: ShellInput = match serde_json::from_value(value) {
            Ok(input) => input,
            Err(e) => {
                debug!(error = %e, "skipping unrecognized input line");
                continue;
            }
        };

        if !handle.send(input) {
            return Err(SidecarError::CoordinatorStopped);
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

#[cfg(test)]
#[path = "sidecar_test.rs"]
mod tests;

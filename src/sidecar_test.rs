use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::*;
use crate::config::Timings;
use crate::coordinator::machine::RedirectState;
use crate::host::{HostCommand, ShellHost};
use crate::host::test_helpers::RecordingHost;
use crate::signin::HomePattern;
use crate::storage::MemoryStore;

fn test_config() -> ShellConfig {
    ShellConfig {
        signin_url: Url::parse("https://kagi.com/signin").unwrap(),
        target_url: Url::parse("https://kagi.com/assistant").unwrap(),
        home: HomePattern::new("kagi.com", vec!["/search".to_string()]),
        auth_key: "kagiLoggedIn".to_string(),
        store_path: PathBuf::from("unused.json"),
        manual_chord: "Ctrl+Shift+A".parse().unwrap(),
        timings: Timings::default(),
    }
}

fn start() -> (CoordinatorHandle, RecordingHost) {
    let host = RecordingHost::new();
    let handle = spawn_coordinator(&test_config(), host.clone(), MemoryStore::new());
    (handle, host)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn forwards_channel_lines_to_coordinator() {
    let (handle, host) = start();
    let input = concat!(
        r#"{"channel":"message","data":{"type":"link-click","url":"https://example.com/"}}"#,
        "\n",
        r#"{"channel":"go-to-target"}"#,
        "\n",
    );

    let forwarded = pump(input.as_bytes(), &handle, &host.location).await.unwrap();
    assert_eq!(forwarded, 2);

    advance(1).await;
    assert_eq!(
        host.operations(),
        vec![
            HostCommand::RecordOutboundUrl { url: "https://example.com/".into() },
            HostCommand::Navigate { url: "https://kagi.com/assistant".into() },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn key_line_triggers_manual_chord() {
    let (handle, host) = start();
    let input = "{\"channel\":\"key\",\"key\":\"A\",\"ctrl\":true,\"shift\":true}\n";

    pump(input.as_bytes(), &handle, &host.location).await.unwrap();
    advance(1).await;

    assert_eq!(host.navigations(), vec!["https://kagi.com/assistant".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn location_reports_feed_polling_only() {
    let (handle, host) = start();
    let input = "{\"channel\":\"location\",\"url\":\"https://kagi.com/\"}\n";

    let forwarded = pump(input.as_bytes(), &handle, &host.location).await.unwrap();
    assert_eq!(forwarded, 0);
    assert_eq!(host.location.get().as_deref(), Some("https://kagi.com/"));

    advance(2_100).await;
    assert_eq!(handle.status().redirect, RedirectState::CountingDown { remaining: 5 });
    assert!(host.operations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_lines_are_skipped() {
    let (handle, host) = start();
    let input = concat!(
        "not json\n",
        "\n",
        "[1, 2, 3]\n",
        "{\"channel\":\"bogus\"}\n",
        "{\"channel\":\"location\"}\n",
        "{\"channel\":\"content-loaded\"}\n",
    );

    let forwarded = pump(input.as_bytes(), &handle, &host.location).await.unwrap();
    assert_eq!(forwarded, 1);
    assert_eq!(host.location.get(), None);

    advance(1).await;
    assert!(!handle.status().loading);
}

#[tokio::test(start_paused = true)]
async fn empty_input_forwards_nothing() {
    let (handle, host) = start();
    let forwarded = pump(&b""[..], &handle, &host.location).await.unwrap();
    assert_eq!(forwarded, 0);
}

/// Host whose first call brings the coordinator task down.
struct CrashingHost;

impl ShellHost for CrashingHost {
    fn record_outbound_url(&mut self, _url: &str) {}
    fn record_current_url(&mut self, _url: &str) {}
    fn navigate(&mut self, _url: &str) {}
    fn current_url(&self) -> Option<String> {
        None
    }
    fn loading_changed(&mut self, _loading: bool) {
        panic!("window gone");
    }
}

#[tokio::test(start_paused = true)]
async fn stopped_coordinator_is_reported() {
    let handle = spawn_coordinator(&test_config(), CrashingHost, MemoryStore::new());
    advance(1).await;

    let location = crate::host::LocationCell::default();
    let result = pump(&b"{\"channel\":\"go-to-target\"}\n"[..], &handle, &location).await;
    assert!(matches!(result, Err(SidecarError::CoordinatorStopped)));
}

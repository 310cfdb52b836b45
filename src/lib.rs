//! Assistant shell - navigation bridge and redirect coordinator.
//!
//! ARCHITECTURE
//! ============
//! The shell embeds a remote web application in a native window. Two pieces
//! cooperate across the page/shell boundary:
//!
//! - `bridge` runs against the embedded page. It observes history navigation
//!   and external-target link clicks and posts `message::NavigationEvent`s to
//!   the parent context.
//! - `coordinator` runs in the shell. It consumes those messages, keeps the
//!   persisted "previously authenticated" flag, and drives the countdown that
//!   moves the shell to the assistant URL.
//!
//! Everything that draws pixels lives behind `host::ShellHost`. The binary
//! speaks to the native window over stdio (`sidecar`); in that setup the
//! window's own in-page script plays the `bridge` role and must post the same
//! messages.

pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod host;
pub mod message;
pub mod observer;
pub mod sidecar;
pub mod signin;
pub mod storage;

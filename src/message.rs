//! Messages crossing from the embedded page and the native window into the shell.
//!
//! DESIGN
//! ======
//! The page-to-shell channel carries plain JSON values, the same way a
//! `postMessage` payload arrives. Only two shapes are meaningful:
//!
//! ```text
//! { "type": "navigation", "url": "..." }
//! { "type": "link-click", "url": "..." }
//! ```
//!
//! Anything else (unknown type, missing url, non-object) is dropped without
//! side effects. `ShellInput` wraps those raw values together with the other
//! inputs the coordinator reacts to: key chords, the manual control, and the
//! content-loaded signal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// NAVIGATION EVENT
// =============================================================================

/// Event posted by the bridge to the parent context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NavigationEvent {
    /// The page's URL changed in place.
    Navigation { url: String },
    /// The user clicked a link meant to open outside the page.
    LinkClick { url: String },
}

impl NavigationEvent {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Navigation { url } | Self::LinkClick { url } => url,
        }
    }

    /// Decode a raw channel value. Returns `None` for any other shape.
    #[must_use]
    pub fn from_message(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    #[must_use]
    pub fn to_message(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

// =============================================================================
// KEY CHORD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordParseError;

impl fmt::Display for ChordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected modifiers and one key, e.g. Ctrl+Shift+A")
    }
}

impl std::error::Error for ChordParseError {}

/// A key press with its modifier state. Keys compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyChord {
    /// Whether a key press triggers this chord. Modifiers must match exactly.
    #[must_use]
    pub fn matches(&self, pressed: &KeyChord) -> bool {
        self.key.eq_ignore_ascii_case(&pressed.key)
            && self.ctrl == pressed.ctrl
            && self.shift == pressed.shift
            && self.alt == pressed.alt
            && self.meta == pressed.meta
    }
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    /// Parse `Ctrl+Shift+A` style text. The last segment is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or(ChordParseError)?;

        let mut chord = KeyChord { key: key.to_ascii_lowercase(), ..KeyChord::default() };
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                _ => return Err(ChordParseError),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [(self.ctrl, "Ctrl"), (self.shift, "Shift"), (self.alt, "Alt"), (self.meta, "Meta")] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

// =============================================================================
// SHELL INPUT
// =============================================================================

/// Everything the coordinator consumes from its inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum ShellInput {
    /// Raw cross-context message from the embedded page.
    Message { data: serde_json::Value },
    /// Key press observed while the shell window has focus.
    Key(KeyChord),
    /// The "go to assistant" control was activated.
    GoToTarget,
    /// The embedded content finished loading.
    ContentLoaded,
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

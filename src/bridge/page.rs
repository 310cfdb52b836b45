//! The embedded page as the bridge sees it.
//!
//! DESIGN
//! ======
//! Only the surfaces the bridge hooks into are modelled:
//!
//! - `History`: session history entries with push/replace/back/forward.
//!   Completed push/replace operations and back/forward traversals are
//!   observable through `Listeners`, which is how the bridge "wraps" them.
//! - `Document`: click dispatch over an element chain. Listeners run before
//!   the default action and may prevent it.
//!
//! A page can be detached (its document inaccessible, as with a cross-origin
//! frame). History still works; anything needing the document fails.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use url::Url;

use super::BridgeError;
use crate::observer::{Listeners, Subscription};

// =============================================================================
// HISTORY
// =============================================================================

pub struct History {
    entries: RefCell<Vec<Url>>,
    index: Cell<usize>,
    state_changed: Listeners<Url>,
    popstate: Listeners<Url>,
}

impl History {
    #[must_use]
    pub fn new(initial: Url) -> Self {
        Self {
            entries: RefCell::new(vec![initial]),
            index: Cell::new(0),
            state_changed: Listeners::new(),
            popstate: Listeners::new(),
        }
    }

    /// URL of the current entry.
    #[must_use]
    pub fn current(&self) -> Url {
        self.entries.borrow()[self.index.get()].clone()
    }

    /// Number of entries, including the current one.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Add an entry after the current one, discarding forward entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` does not resolve against the current entry.
    pub fn push_state(&self, url: &str) -> Result<(), BridgeError> {
        let resolved = self.resolve(url)?;
        {
            let mut entries = self.entries.borrow_mut();
            let next = self.index.get() + 1;
            entries.truncate(next);
            entries.push(resolved.clone());
            self.index.set(next);
        }
        self.state_changed.emit(&resolved);
        Ok(())
    }

    /// Overwrite the current entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` does not resolve against the current entry.
    pub fn replace_state(&self, url: &str) -> Result<(), BridgeError> {
        let resolved = self.resolve(url)?;
        self.entries.borrow_mut()[self.index.get()] = resolved.clone();
        self.state_changed.emit(&resolved);
        Ok(())
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.traverse(-1)
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.traverse(1)
    }

    /// Observe completed `push_state`/`replace_state` calls.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn on_state_change(&self, callback: impl Fn(&Url) + 'static) -> Subscription {
        self.state_changed.subscribe(callback)
    }

    /// Observe back/forward traversal.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn on_popstate(&self, callback: impl Fn(&Url) + 'static) -> Subscription {
        self.popstate.subscribe(callback)
    }

    fn traverse(&self, delta: isize) -> bool {
        let Some(target) = self.index.get().checked_add_signed(delta) else {
            return false;
        };
        if target >= self.entry_count() {
            return false;
        }
        self.index.set(target);
        self.popstate.emit(&self.current());
        true
    }

    fn resolve(&self, url: &str) -> Result<Url, BridgeError> {
        self.current()
            .join(url)
            .map_err(|source| BridgeError::InvalidUrl { url: url.to_string(), source })
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A node in the element chain from click target up to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    href: Option<String>,
    target: Option<String>,
    parent: Option<Rc<Element>>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into().to_ascii_lowercase(), href: None, target: None, parent: None }
    }

    /// `<a href=...>` shorthand.
    #[must_use]
    pub fn link(href: impl Into<String>) -> Self {
        Self::new("a").with_href(href)
    }

    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn inside(mut self, parent: &Rc<Element>) -> Self {
        self.parent = Some(Rc::clone(parent));
        self
    }

    #[must_use]
    pub fn into_node(self) -> Rc<Element> {
        Rc::new(self)
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Nearest element, starting at `self`, that is a link with an href.
    #[must_use]
    pub fn closest_link(&self) -> Option<&Element> {
        let mut node = Some(self);
        while let Some(el) = node {
            if matches!(el.tag.as_str(), "a" | "area") && el.href.is_some() {
                return Some(el);
            }
            node = el.parent.as_deref();
        }
        None
    }

    /// Whether following this link opens a new browsing context.
    #[must_use]
    pub fn opens_new_context(&self) -> bool {
        self.target
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"))
    }
}

/// A click travelling through the document's listeners.
pub struct ClickEvent {
    target: Rc<Element>,
    base: Url,
    default_prevented: Cell<bool>,
}

impl ClickEvent {
    #[must_use]
    pub fn target(&self) -> &Element {
        &self.target
    }

    /// Resolve `href` against the document URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[derive(Default)]
pub struct Document {
    click: Listeners<ClickEvent>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn on_click(&self, callback: impl Fn(&ClickEvent) + 'static) -> Subscription {
        self.click.subscribe(callback)
    }

    /// Run click listeners. Returns true if the default action should proceed.
    pub fn dispatch_click(&self, target: &Rc<Element>, base: &Url) -> bool {
        let event = ClickEvent { target: Rc::clone(target), base: base.clone(), default_prevented: Cell::new(false) };
        self.click.emit(&event);
        !event.default_prevented()
    }
}

// =============================================================================
// PAGE
// =============================================================================

pub struct EmbeddedPage {
    history: History,
    document: Option<Document>,
}

impl EmbeddedPage {
    /// A loaded page whose document the bridge can reach.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` is not absolute.
    pub fn load(url: &str) -> Result<Self, BridgeError> {
        Ok(Self { history: History::new(parse(url)?), document: Some(Document::new()) })
    }

    /// A page whose document is not accessible to the bridge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` is not absolute.
    pub fn detached(url: &str) -> Result<Self, BridgeError> {
        Ok(Self { history: History::new(parse(url)?), document: None })
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn location(&self) -> Url {
        self.history.current()
    }

    /// # Errors
    ///
    /// Returns `DocumentInaccessible` for a detached page.
    pub fn document(&self) -> Result<&Document, BridgeError> {
        self.document
            .as_ref()
            .ok_or_else(|| BridgeError::DocumentInaccessible { url: self.location().to_string() })
    }

    /// Simulate a user click on `target`. Returns true if the page's own
    /// default action (following the link) would run.
    pub fn click(&self, target: &Rc<Element>) -> bool {
        match &self.document {
            Some(document) => document.dispatch_click(target, &self.location()),
            None => true,
        }
    }
}

fn parse(url: &str) -> Result<Url, BridgeError> {
    Url::parse(url).map_err(|source| BridgeError::InvalidUrl { url: url.to_string(), source })
}

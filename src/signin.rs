//! Signed-in URL predicate.
//!
//! DESIGN
//! ======
//! The embedded site has no API the shell can ask "is the user signed in?".
//! Instead, landing on the site's home page or one of its public routes (for
//! example search) is taken as evidence of a session. All of that policy lives
//! in `is_signed_in_url` so it can be audited and tested on its own.

use url::Url;

/// Host and public route prefixes that indicate a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomePattern {
    host: String,
    public_prefixes: Vec<String>,
}

impl HomePattern {
    #[must_use]
    pub fn new(host: impl Into<String>, public_prefixes: Vec<String>) -> Self {
        Self { host: host.into().to_ascii_lowercase(), public_prefixes }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn public_prefixes(&self) -> &[String] {
        &self.public_prefixes
    }

    fn matches_host(&self, host: &str) -> bool {
        let bare = self.host.strip_prefix("www.").unwrap_or(&self.host);
        let candidate = host.strip_prefix("www.").unwrap_or(host);
        candidate.eq_ignore_ascii_case(bare)
    }

    fn matches_path(&self, path: &str) -> bool {
        if path.is_empty() || path == "/" {
            return true;
        }
        self.public_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            // Segment boundary: "/search" matches "/search/x" but not "/searches".
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Whether `url` looks like a page only a signed-in user would land on.
///
/// Qualifies when the URL is http(s), its host is the pattern host (with or
/// without `www.`), and its path is the root or starts with a public prefix.
/// Query strings and fragments are ignored. Unparseable input never qualifies.
#[must_use]
pub fn is_signed_in_url(url: &str, pattern: &HomePattern) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    pattern.matches_host(host) && pattern.matches_path(parsed.path())
}

#[cfg(test)]
#[path = "signin_test.rs"]
mod tests;

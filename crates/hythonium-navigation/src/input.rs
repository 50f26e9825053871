//! Input resolution for address bar
//!
//! The order of the checks matters: a scheme prefix always wins over the
//! TLD heuristic, and the TLD heuristic always wins over search.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Prefixes that mark input as an absolute URL. Matched case-sensitively.
const SCHEME_PREFIXES: &[&str] = &["http:", "https:", "file:", "ftp:", "about:"];

/// Trailing labels accepted as a bare domain. Compared lower-cased.
const KNOWN_TLDS: &[&str] = &[
    // Generic
    "com", "net", "org", "edu", "gov", "mil", "int", "info", "biz", "name", "pro",
    // Popular new gTLDs
    "io", "co", "ai", "app", "dev", "me", "tv", "cc", "xyz", "top", "site", "online", "tech",
    "store", "blog", "cloud", "page", "wiki", "news", "shop", "live", "link", "club", "fun",
    // Country codes
    "us", "uk", "cn", "de", "jp", "fr", "ru", "br", "in", "au", "ca", "eu", "nl", "it", "es",
    "ch", "se", "no", "fi", "dk", "pl", "kr", "tw", "hk", "sg", "nz", "za", "mx", "ar", "be",
    "at", "ie", "il", "pt", "gr", "cz", "tr", "ua", "vn", "th", "id", "my", "ph",
    // Local networks
    "local", "localhost", "test",
];

/// Characters that would change the meaning of a query string if left raw.
/// Spaces are left for the engine to normalise.
const QUERY_BREAKING: &AsciiSet = &CONTROLS
    .add(b'%')
    .add(b'&')
    .add(b'#')
    .add(b'+')
    .add(b'?')
    .add(b'=');

/// Which branch of the policy classified the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Url,
    Domain,
    Search,
}

/// Result of resolving address bar input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResolution {
    /// Input already carried a scheme; dispatched unchanged
    Url(String),
    /// Bare domain, `http://` prepended
    Domain(String),
    /// Search engine query URL
    Search(String),
}

impl InputResolution {
    /// The URL to dispatch to the engine
    pub fn url(&self) -> &str {
        match self {
            InputResolution::Url(url)
            | InputResolution::Domain(url)
            | InputResolution::Search(url) => url,
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            InputResolution::Url(_) => InputKind::Url,
            InputResolution::Domain(_) => InputKind::Domain,
            InputResolution::Search(_) => InputKind::Search,
        }
    }
}

pub struct InputResolver {
    /// Search engine query prefix, or a template containing `%s`
    search_prefix: String,
}

impl InputResolver {
    pub fn with_search_engine(search_prefix: impl Into<String>) -> Self {
        Self {
            search_prefix: search_prefix.into(),
        }
    }

    /// Resolve user input into the URL to load.
    ///
    /// Blank input yields `None`: the caller does not navigate.
    pub fn resolve(&self, input: &str) -> Option<InputResolution> {
        let input = input.trim();

        if input.is_empty() {
            return None;
        }

        if has_scheme_prefix(input) {
            return Some(InputResolution::Url(input.to_string()));
        }

        if looks_like_domain(input) {
            return Some(InputResolution::Domain(format!("http://{}", input)));
        }

        Some(InputResolution::Search(self.build_search_url(input)))
    }

    fn build_search_url(&self, query: &str) -> String {
        let encoded = utf8_percent_encode(query, QUERY_BREAKING).to_string();
        if self.search_prefix.contains("%s") {
            self.search_prefix.replace("%s", &encoded)
        } else {
            format!("{}{}", self.search_prefix, encoded)
        }
    }
}

/// Resolve `raw` against a search engine prefix in one call.
pub fn resolve_input(raw: &str, search_engine: &str) -> Option<InputResolution> {
    InputResolver::with_search_engine(search_engine).resolve(raw)
}

fn has_scheme_prefix(input: &str) -> bool {
    SCHEME_PREFIXES
        .iter()
        .any(|prefix| input.starts_with(prefix))
}

fn looks_like_domain(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }

    let host = strip_port(split_host(input));
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }

    labels
        .last()
        .map(|tld| KNOWN_TLDS.contains(&tld.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Host part of scheme-less input: everything before the first `/`, `?` or `#`.
fn split_host(input: &str) -> &str {
    let cut = input.find(['/', '?', '#']).unwrap_or(input.len());
    &input[..cut]
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

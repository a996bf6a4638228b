//! `Link` header parsing

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches one `<url>; rel="name"` entry. The rel may be unquoted.
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([^>]*)>\s*;[^,<]*?\brel\s*=\s*"?([^",;]+)"?"#).expect("link regex is valid")
});

/// One entry of a `Link` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Target URL as written in the header
    pub url: String,
    /// Relation name (`next`, `last`, ...)
    pub rel: String,
}

/// Parsed `Link` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkHeader {
    links: Vec<Link>,
}

impl LinkHeader {
    /// Parse a header value; malformed entries are skipped
    pub fn parse(header: &str) -> Self {
        let mut links = Vec::new();
        for caps in LINK_REGEX.captures_iter(header) {
            let url = caps[1].trim().to_string();
            // rel can hold several space-separated relation types
            for rel in caps[2].split_whitespace() {
                links.push(Link {
                    url: url.clone(),
                    rel: rel.to_ascii_lowercase(),
                });
            }
        }
        Self { links }
    }

    /// First URL with the given relation
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel.eq_ignore_ascii_case(rel))
            .map(|link| link.url.as_str())
    }

    /// All parsed entries
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Check if nothing was parsed
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Page number carried in a link's `page` query parameter.
///
/// Canvas sometimes uses opaque bookmarks (`page=bookmark:...`); those yield
/// `None`.
pub fn last_page_number(url: &Url) -> Option<u64> {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Magnet URI parsing and extraction
///
/// Helpers shared by the adapter layer and the engine's magnet-harvest
/// operation. A magnet link is identified by its BitTorrent info hash,
/// which is also the deduplication key.
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Matches a magnet URI up to the first character that would end it in
/// surrounding markup. Compile with case-insensitivity.
pub const MAGNET_URI_PATTERN: &str = r#"magnet:\?[^"'\s<>\]]+"#;

static EXTRACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(MAGNET_URI_PATTERN)
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// A magnet URI is well-formed when it carries a btih exact-topic with a
/// 40-char hex or 32-char base32 hash. The trailing terminator keeps the
/// hash an exact length: without it a 39-hex hash would match the first
/// 32 characters of the base32 alternative.
static VALIDATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)xt=urn:btih:([0-9a-fA-F]{40}|[0-9a-zA-Z]{32})($|[^0-9a-zA-Z])").unwrap()
});

/// A parsed magnet link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MagnetLink {
    /// Original URI as found in the page
    pub uri: String,

    /// Lowercased info hash from the btih exact-topic
    pub info_hash: String,

    /// Decoded `dn` parameter, when present
    pub display_name: Option<String>,
}

/// Parses a magnet URI into its components.
///
/// Returns `None` for anything that is not a magnet link or that lacks a
/// plausible btih info hash (40-char hex or 32-char base32).
pub fn parse_magnet(uri: &str) -> Option<MagnetLink> {
    let parsed = Url::parse(uri).ok()?;
    if parsed.scheme() != "magnet" {
        return None;
    }

    let mut info_hash = None;
    let mut display_name = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "xt" => {
                if let Some(hash) = value.strip_prefix("urn:btih:") {
                    if hash.len() == 40 || hash.len() == 32 {
                        info_hash = Some(hash.to_ascii_lowercase());
                    }
                }
            }
            "dn" if !value.is_empty() => display_name = Some(value.to_string()),
            _ => {}
        }
    }

    Some(MagnetLink {
        uri: uri.to_string(),
        info_hash: info_hash?,
        display_name,
    })
}

/// True when the URI carries a well-formed btih exact-topic
pub fn validate_magnet(uri: &str) -> bool {
    VALIDATION_PATTERN.is_match(uri)
}

/// Pulls every magnet link out of raw page content, deduplicated by info
/// hash in first-seen order. URIs without a parseable info hash are
/// dropped.
pub fn extract_magnets(content: &str) -> Vec<MagnetLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for m in EXTRACTION_PATTERN.find_iter(content) {
        if let Some(link) = parse_magnet(m.as_str()) {
            if seen.insert(link.info_hash.clone()) {
                links.push(link);
            }
        }
    }
    links
}

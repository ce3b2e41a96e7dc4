/// Site adapters: per-site extraction strategies
///
/// An adapter couples a URL matcher with a set of compiled field selectors.
/// The built-in kinds carry default selector sets tuned for the page shapes
/// this crawler meets; a site config may replace them with its own.
use crate::adapters::selector::CompiledSelector;
use crate::config::{SelectorConfig, SiteConfig};
use crate::model::FieldValue;
use crate::TideError;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeMap;
use std::fmt;

/// Adapter variants
///
/// Closed set of built-in kinds plus `Custom` for runtime-registered
/// constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Title and hyperlinks only
    Generic,

    /// Torrent listing pages: magnet links, file lists, sizes
    Torrent,

    /// Single-magnet detail pages
    Magnet,

    /// Site index/listing pages
    Index,

    /// Directory browse pages
    Directory,

    /// Registered at runtime under an arbitrary identifier
    Custom(String),
}

impl AdapterKind {
    /// Lowercase identifier used in config files and logs
    pub fn name(&self) -> &str {
        match self {
            Self::Generic => "generic",
            Self::Torrent => "torrent",
            Self::Magnet => "magnet",
            Self::Index => "index",
            Self::Directory => "directory",
            Self::Custom(id) => id,
        }
    }

    /// Parses an explicit adapter identifier from config
    pub fn from_config_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "generic" => Self::Generic,
            "torrent" => Self::Torrent,
            "magnet" => Self::Magnet,
            "index" => Self::Index,
            "directory" => Self::Directory,
            _ => Self::Custom(value.to_string()),
        }
    }

    /// Guesses the kind from keywords in the URL pattern
    pub fn detect_from_pattern(pattern: &str) -> Self {
        let pattern = pattern.to_ascii_lowercase();

        if ["torrent", "tracker", "seed", "leech"]
            .iter()
            .any(|k| pattern.contains(k))
        {
            return Self::Torrent;
        }
        if pattern.contains("magnet") {
            return Self::Magnet;
        }
        if ["index", "list", "browse"].iter().any(|k| pattern.contains(k)) {
            return Self::Index;
        }
        if ["dir", "folder", "directory"]
            .iter()
            .any(|k| pattern.contains(k))
        {
            return Self::Directory;
        }

        Self::Generic
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiled URL matcher with the precedence regex > glob > exact
enum UrlMatcher {
    /// `regex:`-prefixed pattern, unanchored search
    Pattern(Regex),

    /// Glob with `*`/`?` wildcards, anchored over the whole URL
    Glob(Regex),

    /// Exact string equality
    Exact(String),

    /// Empty pattern matches nothing
    Never,
}

impl UrlMatcher {
    fn compile(pattern: &str) -> Result<Self, TideError> {
        if pattern.is_empty() {
            return Ok(Self::Never);
        }

        if let Some(raw) = pattern.strip_prefix("regex:") {
            let regex = Regex::new(raw)
                .map_err(|e| TideError::Pattern(format!("URL pattern '{}': {}", pattern, e)))?;
            return Ok(Self::Pattern(regex));
        }

        if pattern.contains('*') || pattern.contains('?') {
            let regex = glob_to_regex(pattern)
                .map_err(|e| TideError::Pattern(format!("URL pattern '{}': {}", pattern, e)))?;
            return Ok(Self::Glob(regex));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    fn matches(&self, url: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(url),
            Self::Glob(regex) => regex.is_match(url),
            Self::Exact(pattern) => url == pattern,
            Self::Never => false,
        }
    }
}

/// Translates a glob pattern to an anchored regex: `*` spans any run of
/// characters, `?` exactly one.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 4);
    let mut literal = String::new();
    translated.push('^');
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                translated.push_str(&regex::escape(&literal));
                literal.clear();
                translated.push_str(if c == '*' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    translated.push_str(&regex::escape(&literal));
    translated.push('$');
    Regex::new(&translated)
}

/// One site's extraction strategy
pub struct SiteAdapter {
    name: String,
    kind: AdapterKind,
    matcher: UrlMatcher,
    selectors: Vec<CompiledSelector>,
}

impl SiteAdapter {
    /// Builds an adapter, detecting the kind from the config
    pub fn from_config(config: &SiteConfig) -> Result<Self, TideError> {
        let kind = match &config.adapter {
            Some(explicit) => AdapterKind::from_config_str(explicit),
            None => AdapterKind::detect_from_pattern(&config.url_pattern),
        };
        Self::with_kind(kind, config)
    }

    /// Builds an adapter of a specific kind.
    ///
    /// Declared selectors replace the kind's default set when present.
    /// Pattern and selector compilation errors surface here.
    pub fn with_kind(kind: AdapterKind, config: &SiteConfig) -> Result<Self, TideError> {
        let matcher = UrlMatcher::compile(&config.url_pattern)?;

        let declared;
        let raw = if config.selectors.is_empty() {
            declared = default_selectors(&kind);
            &declared
        } else {
            &config.selectors
        };

        let selectors = raw
            .iter()
            .map(CompiledSelector::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            kind,
            matcher,
            selectors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AdapterKind {
        &self.kind
    }

    /// True when this adapter's URL pattern matches
    pub fn can_handle(&self, url: &str) -> bool {
        self.matcher.matches(url)
    }

    /// Runs every selector against the content.
    ///
    /// The document is parsed at most once, and only when some selector
    /// needs CSS matching.
    pub fn extract(&self, content: &str) -> BTreeMap<String, FieldValue> {
        let document = self
            .selectors
            .iter()
            .any(CompiledSelector::is_css)
            .then(|| Html::parse_document(content));

        let mut fields = BTreeMap::new();
        for selector in &self.selectors {
            if let Some(value) = selector.extract(content, document.as_ref()) {
                fields.insert(selector.name.clone(), value);
            }
        }
        fields
    }

    /// Whole-result validity: every required field present and non-null.
    ///
    /// Multi-valued fields pass even when empty; a required single field
    /// that matched nothing is null and fails.
    pub fn validate(&self, fields: &BTreeMap<String, FieldValue>) -> bool {
        self.selectors
            .iter()
            .filter(|s| s.required)
            .all(|s| match fields.get(&s.name) {
                None => false,
                Some(value) => !matches!(value, FieldValue::Text(None)),
            })
    }
}

/// Default selector sets per adapter kind
fn default_selectors(kind: &AdapterKind) -> Vec<SelectorConfig> {
    match kind {
        AdapterKind::Generic => vec![
            SelectorConfig::new("title", "regex:<title>(.*?)</title>"),
            SelectorConfig::new("links", r#"regex:href=["']([^"']+)["']"#)
                .multiple()
                .optional(),
        ],
        AdapterKind::Torrent => vec![
            SelectorConfig::new("title", "regex:<title>(.*?)</title>").post_process("trim"),
            SelectorConfig::new("magnet_links", r#"regex:magnet:\?[^"'\s<>\]]+"#)
                .multiple()
                .optional()
                .post_process("trim"),
            SelectorConfig::new(
                "file_list",
                r#"regex:<a[^>]+href=["']([^"']+\.(?:torrent|zip|rar|7z))["']"#,
            )
            .multiple()
            .optional(),
            SelectorConfig::new(
                "description",
                r#"regex:<div[^>]+class=["'][^"']*desc[^"']*["'](.*?)</div>"#,
            )
            .optional(),
            SelectorConfig::new("size", r"regex:(\d+(?:\.\d+)?\s*(?:GB|MB|KB|TB))").optional(),
        ],
        AdapterKind::Magnet => vec![
            SelectorConfig::new("magnet_link", r#"regex:magnet:\?[^"'\s<>\]]+"#),
            SelectorConfig::new(
                "title",
                r"regex:<title>(.*?)(?:\s*-\s*magnet|\s*-\s*torrent)?</title>",
            )
            .optional(),
            SelectorConfig::new("announce", r"regex:urn:btih:([A-Fa-f0-9]{32,40})").optional(),
        ],
        AdapterKind::Index => vec![
            SelectorConfig::new(
                "entries",
                r#"regex:<a[^>]+href=["']([^"']+)["'][^>]*>(?:[^<]+)</a>"#,
            )
            .multiple()
            .optional(),
            SelectorConfig::new(
                "directories",
                r#"regex:<[^>]+class=["'][^"']*dir[^"']*["'][^>]*href=["']([^"']+)["']"#,
            )
            .multiple()
            .optional(),
            SelectorConfig::new(
                "parent_link",
                r#"regex:<a[^>]+href=["']([^"']*)\.\.[^"']*["'][^>]*>.*?parent"#,
            )
            .optional(),
        ],
        AdapterKind::Directory => vec![
            SelectorConfig::new(
                "files",
                r#"regex:<a[^>]+href=["']([^"']+\.(?:torrent|magnet))["'][^>]*>(?:[^<]+)</a>"#,
            )
            .multiple()
            .optional(),
            SelectorConfig::new(
                "folders",
                r#"regex:<[^>]+class=["'][^"']*folder[^"']*["'][^>]*href=["']([^"']+)["']"#,
            )
            .multiple()
            .optional(),
        ],
        AdapterKind::Custom(_) => Vec::new(),
    }
}

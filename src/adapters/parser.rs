/// Adapter dispatch and fallback parsing
///
/// The parser walks its adapters in registration order and hands the page
/// to the first one whose URL pattern matches and whose extraction
/// validates. Pages no adapter claims get a minimal fallback parse so the
/// pipeline always produces structured output.
use crate::adapters::factory::AdapterFactory;
use crate::adapters::site::SiteAdapter;
use crate::config::SiteConfig;
use crate::magnet::MAGNET_URI_PATTERN;
use crate::model::{FieldValue, ParsedData};
use crate::TideError;
use regex::RegexBuilder;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

pub struct AdaptiveParser {
    factory: AdapterFactory,
    adapters: RwLock<Vec<SiteAdapter>>,
    magnet_pattern: regex::Regex,
}

impl AdaptiveParser {
    /// Builds the parser and one adapter per configured site.
    ///
    /// Adapter construction errors surface immediately so a bad selector
    /// is caught at startup rather than mid-crawl.
    pub fn new(configs: &[SiteConfig], factory: AdapterFactory) -> Result<Self, TideError> {
        let adapters = configs
            .iter()
            .map(|config| factory.create(config))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Parser ready with {} site adapter(s)", adapters.len());

        let magnet_pattern = RegexBuilder::new(MAGNET_URI_PATTERN)
            .case_insensitive(true)
            .build()
            .map_err(|e| TideError::Pattern(format!("Magnet pattern: {}", e)))?;

        Ok(Self {
            factory,
            adapters: RwLock::new(adapters),
            magnet_pattern,
        })
    }

    /// Registers a site while the parser is live
    pub fn add_site(&self, config: &SiteConfig) -> Result<(), TideError> {
        let adapter = self.factory.create(config)?;
        tracing::info!("Added site '{}' ({} adapter)", config.name, adapter.kind());
        self.adapters.write().unwrap().push(adapter);
        Ok(())
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.read().unwrap().len()
    }

    /// Name of the first adapter claiming the URL, if any
    pub fn adapter_for_url(&self, url: &str) -> Option<String> {
        self.adapters
            .read()
            .unwrap()
            .iter()
            .find(|a| a.can_handle(url))
            .map(|a| a.name().to_string())
    }

    /// Parses page content into structured fields.
    ///
    /// Adapters are tried in registration order; one that matches the URL
    /// but extracts invalid data is skipped in favor of the next. The
    /// result names the adapter that produced it, or none for the
    /// fallback path.
    pub fn parse(&self, url: &str, content: &str) -> ParsedData {
        let adapters = self.adapters.read().unwrap();
        for adapter in adapters.iter() {
            if !adapter.can_handle(url) {
                continue;
            }
            let fields = adapter.extract(content);
            if adapter.validate(&fields) {
                tracing::debug!("Adapter '{}' handled {}", adapter.name(), url);
                return ParsedData {
                    fields,
                    adapter_used: Some(adapter.name().to_string()),
                };
            }
            tracing::debug!(
                "Adapter '{}' extracted invalid data from {}, trying next",
                adapter.name(),
                url
            );
        }
        drop(adapters);

        tracing::debug!("No adapter claimed {}, falling back", url);
        self.fallback_parse(url, content)
    }

    /// Minimal extraction for unclaimed pages: title, hyperlinks, and any
    /// magnet URIs, each list deduplicated in first-seen order.
    fn fallback_parse(&self, url: &str, content: &str) -> ParsedData {
        let document = Html::parse_document(content);

        let title = Selector::parse("title")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        if let Ok(sel) = Selector::parse("[href]") {
            for element in document.select(&sel) {
                if let Some(href) = element.value().attr("href") {
                    if seen.insert(href.to_string()) {
                        links.push(href.to_string());
                    }
                }
            }
        }

        let mut seen_magnets = HashSet::new();
        let mut magnet_links = Vec::new();
        for m in self.magnet_pattern.find_iter(content) {
            if seen_magnets.insert(m.as_str().to_string()) {
                magnet_links.push(m.as_str().to_string());
            }
        }

        let mut fields = BTreeMap::new();
        fields.insert("url".to_string(), FieldValue::Text(Some(url.to_string())));
        fields.insert("title".to_string(), FieldValue::Text(Some(title)));
        fields.insert("links".to_string(), FieldValue::List(links));
        fields.insert("magnet_links".to_string(), FieldValue::List(magnet_links));

        ParsedData {
            fields,
            adapter_used: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_with(configs: &[SiteConfig]) -> AdaptiveParser {
        AdaptiveParser::new(configs, AdapterFactory::new()).unwrap()
    }

    #[test]
    fn test_first_matching_adapter_wins() {
        let mut first = SiteConfig::new("first", "*://example.com/*");
        first.adapter = Some("generic".to_string());
        let mut second = SiteConfig::new("second", "*://example.com/*");
        second.adapter = Some("generic".to_string());

        let parser = parser_with(&[first, second]);
        let parsed = parser.parse("https://example.com/a", "<title>page</title>");
        assert_eq!(parsed.adapter_used.as_deref(), Some("first"));
    }

    #[test]
    fn test_invalid_extraction_tries_next_adapter() {
        // Magnet requires a magnet link; this page has none, so the
        // second adapter gets its turn.
        let mut strict = SiteConfig::new("strict", "*://example.com/*");
        strict.adapter = Some("magnet".to_string());
        let mut loose = SiteConfig::new("loose", "*://example.com/*");
        loose.adapter = Some("generic".to_string());

        let parser = parser_with(&[strict, loose]);
        let parsed = parser.parse("https://example.com/a", "<title>no magnets here</title>");
        assert_eq!(parsed.adapter_used.as_deref(), Some("loose"));
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let parser = parser_with(&[]);
        let html = r#"<html><title>  Plain Page  </title>
<a href="/one">1</a>
<a href="/two">2</a>
<a href="/one">again</a>
magnet:?xt=urn:btih:aabbccddeeff00112233445566778899aabbccdd
</html>"#;
        let parsed = parser.parse("https://unknown.example/x", html);

        assert!(parsed.adapter_used.is_none());
        assert_eq!(
            parsed.field("url").and_then(|f| f.as_text()),
            Some("https://unknown.example/x")
        );
        assert_eq!(
            parsed.field("title").and_then(|f| f.as_text()),
            Some("Plain Page")
        );
        assert_eq!(
            parsed.field("links").and_then(|f| f.as_list()),
            Some(&["/one".to_string(), "/two".to_string()][..])
        );
        let magnets = parsed.field("magnet_links").and_then(|f| f.as_list()).unwrap();
        assert_eq!(magnets.len(), 1);
    }

    #[test]
    fn test_fallback_title_defaults_to_empty() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("https://unknown.example/x", "<p>no title element</p>");
        assert_eq!(parsed.field("title").and_then(|f| f.as_text()), Some(""));
    }

    #[test]
    fn test_fallback_dedupes_magnets() {
        let parser = parser_with(&[]);
        let uri = "magnet:?xt=urn:btih:aabbccddeeff00112233445566778899aabbccdd";
        let html = format!("<a href=\"{0}\">m</a> <a href=\"{0}\">m2</a>", uri);
        let parsed = parser.parse("https://unknown.example/x", &html);
        let magnets = parsed.field("magnet_links").and_then(|f| f.as_list()).unwrap();
        assert_eq!(magnets.len(), 1);
    }

    #[test]
    fn test_add_site_takes_effect() {
        let parser = parser_with(&[]);
        assert_eq!(parser.adapter_count(), 0);
        assert!(parser.adapter_for_url("https://example.com/a").is_none());

        let mut config = SiteConfig::new("late", "*://example.com/*");
        config.adapter = Some("generic".to_string());
        parser.add_site(&config).unwrap();

        assert_eq!(parser.adapter_count(), 1);
        assert_eq!(
            parser.adapter_for_url("https://example.com/a").as_deref(),
            Some("late")
        );
        let parsed = parser.parse("https://example.com/a", "<title>t</title>");
        assert_eq!(parsed.adapter_used.as_deref(), Some("late"));
    }
}

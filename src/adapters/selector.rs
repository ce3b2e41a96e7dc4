/// Compiled field selectors
///
/// A declared `SelectorConfig` is compiled once, at adapter construction,
/// into either a regex matcher (`regex:`-prefixed selectors) or a CSS
/// selector backed by scraper. Compilation failures surface synchronously
/// as configuration defects.
use crate::config::SelectorConfig;
use crate::model::FieldValue;
use crate::TideError;
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};

/// Named transform applied to extracted values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Strip leading and trailing whitespace
    Trim,
}

impl PostProcess {
    fn parse(name: &str) -> Result<Self, TideError> {
        match name {
            "trim" => Ok(Self::Trim),
            other => Err(TideError::Pattern(format!(
                "Unknown post-process '{}'",
                other
            ))),
        }
    }

    fn apply(&self, value: String) -> String {
        match self {
            Self::Trim => value.trim().to_string(),
        }
    }
}

enum Matcher {
    /// Regex extraction over the raw content; group 1 when present,
    /// whole match otherwise
    Pattern(Regex),

    /// CSS selection over the parsed document; attribute value or
    /// element text
    Css {
        selector: Selector,
        attribute: Option<String>,
    },
}

/// One compiled field selector
pub struct CompiledSelector {
    pub name: String,
    pub multiple: bool,
    pub required: bool,
    matcher: Matcher,
    post_process: Option<PostProcess>,
}

impl CompiledSelector {
    /// Compiles a declared selector.
    ///
    /// Regex patterns are matched case-insensitively with `.` spanning
    /// newlines, which is what HTML extraction wants.
    pub fn compile(config: &SelectorConfig) -> Result<Self, TideError> {
        let matcher = if let Some(pattern) = config.selector.strip_prefix("regex:") {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .map_err(|e| {
                    TideError::Pattern(format!("Selector '{}': {}", config.name, e))
                })?;
            Matcher::Pattern(regex)
        } else {
            let selector = Selector::parse(&config.selector).map_err(|e| {
                TideError::Pattern(format!("Selector '{}': {}", config.name, e))
            })?;
            Matcher::Css {
                selector,
                attribute: config.attribute.clone(),
            }
        };

        let post_process = match &config.post_process {
            Some(name) => Some(PostProcess::parse(name)?),
            None => None,
        };

        Ok(Self {
            name: config.name.clone(),
            multiple: config.multiple,
            required: config.required,
            matcher,
            post_process,
        })
    }

    /// True when this selector needs a parsed document
    pub fn is_css(&self) -> bool {
        matches!(self.matcher, Matcher::Css { .. })
    }

    /// Extracts this field from the content.
    ///
    /// Returns `None` when an optional selector matched nothing - the field
    /// is then absent from the result. A required selector that matched
    /// nothing yields an explicit null, which fails whole-result validation.
    /// Multi-valued selectors always yield a list, possibly empty.
    pub fn extract(&self, content: &str, document: Option<&Html>) -> Option<FieldValue> {
        let values = match &self.matcher {
            Matcher::Pattern(regex) => self.collect_pattern(regex, content),
            Matcher::Css {
                selector,
                attribute,
            } => self.collect_css(selector, attribute.as_deref(), document?),
        };

        if self.multiple {
            return Some(FieldValue::List(values));
        }
        match values.into_iter().next() {
            Some(first) => Some(FieldValue::Text(Some(first))),
            None if self.required => Some(FieldValue::Text(None)),
            None => None,
        }
    }

    fn collect_pattern(&self, regex: &Regex, content: &str) -> Vec<String> {
        let mut values = Vec::new();
        for captures in regex.captures_iter(content) {
            let matched = captures.get(1).or_else(|| captures.get(0));
            if let Some(m) = matched {
                values.push(self.finish(m.as_str().to_string()));
                if !self.multiple {
                    break;
                }
            }
        }
        values
    }

    fn collect_css(
        &self,
        selector: &Selector,
        attribute: Option<&str>,
        document: &Html,
    ) -> Vec<String> {
        let mut values = Vec::new();
        for element in document.select(selector) {
            let value = match attribute {
                Some(attr) => element.value().attr(attr).map(|v| v.to_string()),
                None => {
                    let text = element.text().collect::<String>();
                    let text = text.trim();
                    if text.is_empty() {
                        None
                    } else {
                        Some(text.to_string())
                    }
                }
            };
            if let Some(v) = value {
                values.push(self.finish(v));
                if !self.multiple {
                    break;
                }
            }
        }
        values
    }

    fn finish(&self, value: String) -> String {
        match self.post_process {
            Some(transform) => transform.apply(value),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(config: SelectorConfig) -> CompiledSelector {
        CompiledSelector::compile(&config).unwrap()
    }

    #[test]
    fn test_regex_single_value() {
        let selector = compile(SelectorConfig::new("title", "regex:<title>(.*?)</title>"));
        let value = selector.extract("<html><title>Hello</title></html>", None);
        assert_eq!(value, Some(FieldValue::Text(Some("Hello".to_string()))));
    }

    #[test]
    fn test_regex_required_missing_is_null() {
        let selector = compile(SelectorConfig::new("title", "regex:<title>(.*?)</title>"));
        let value = selector.extract("<html><body>no title</body></html>", None);
        assert_eq!(value, Some(FieldValue::Text(None)));
    }

    #[test]
    fn test_regex_optional_missing_is_absent() {
        let selector = compile(
            SelectorConfig::new("size", r"regex:(\d+(?:\.\d+)?\s*(?:GB|MB|KB|TB))").optional(),
        );
        assert_eq!(selector.extract("<html></html>", None), None);
    }

    #[test]
    fn test_regex_multiple_collects_all() {
        let selector = compile(
            SelectorConfig::new("links", r#"regex:href=["']([^"']+)["']"#)
                .multiple()
                .optional(),
        );
        let html = r#"<a href="/a">a</a> <a href='/b'>b</a>"#;
        let value = selector.extract(html, None);
        assert_eq!(
            value,
            Some(FieldValue::List(vec!["/a".to_string(), "/b".to_string()]))
        );
    }

    #[test]
    fn test_regex_multiple_no_match_is_empty_list() {
        let selector = compile(
            SelectorConfig::new("links", r#"regex:href=["']([^"']+)["']"#)
                .multiple()
                .optional(),
        );
        assert_eq!(
            selector.extract("plain text", None),
            Some(FieldValue::List(vec![]))
        );
    }

    #[test]
    fn test_regex_is_case_insensitive() {
        let selector = compile(SelectorConfig::new("title", "regex:<title>(.*?)</title>"));
        let value = selector.extract("<TITLE>Caps</TITLE>", None);
        assert_eq!(value, Some(FieldValue::Text(Some("Caps".to_string()))));
    }

    #[test]
    fn test_whole_match_without_group() {
        let selector = compile(
            SelectorConfig::new("magnets", r#"regex:magnet:\?[^"'\s<>\]]+"#)
                .multiple()
                .optional(),
        );
        let html = r#"<a href="magnet:?xt=urn:btih:abc123">get</a>"#;
        let value = selector.extract(html, None);
        assert_eq!(
            value,
            Some(FieldValue::List(vec![
                "magnet:?xt=urn:btih:abc123".to_string()
            ]))
        );
    }

    #[test]
    fn test_post_process_trim() {
        let selector = compile(
            SelectorConfig::new("title", "regex:<title>(.*?)</title>").post_process("trim"),
        );
        let value = selector.extract("<title>  padded  </title>", None);
        assert_eq!(value, Some(FieldValue::Text(Some("padded".to_string()))));
    }

    #[test]
    fn test_unknown_post_process_fails_compile() {
        let config = SelectorConfig::new("title", "regex:x").post_process("uppercase");
        assert!(CompiledSelector::compile(&config).is_err());
    }

    #[test]
    fn test_invalid_regex_fails_compile() {
        let config = SelectorConfig::new("broken", "regex:(unclosed");
        assert!(CompiledSelector::compile(&config).is_err());
    }

    #[test]
    fn test_css_text_extraction() {
        let selector = compile(SelectorConfig::new("heading", "h1.name"));
        let document = Html::parse_document("<h1 class=\"name\">Widget</h1>");
        let value = selector.extract("", Some(&document));
        assert_eq!(value, Some(FieldValue::Text(Some("Widget".to_string()))));
    }

    #[test]
    fn test_css_attribute_extraction() {
        let selector = compile(
            SelectorConfig::new("links", "a")
                .attribute("href")
                .multiple()
                .optional(),
        );
        let document =
            Html::parse_document(r#"<a href="/one">1</a><span>x</span><a href="/two">2</a>"#);
        let value = selector.extract("", Some(&document));
        assert_eq!(
            value,
            Some(FieldValue::List(vec![
                "/one".to_string(),
                "/two".to_string()
            ]))
        );
    }

    #[test]
    fn test_invalid_css_fails_compile() {
        let config = SelectorConfig::new("broken", ":::nope");
        assert!(CompiledSelector::compile(&config).is_err());
    }
}

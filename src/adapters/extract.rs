//! Defensive, try-in-order extraction over untrusted markup.
//!
//! Every site changes its markup without notice, so adapters never commit
//! to a single selector: they declare a priority-ordered chain and take
//! the first strategy that matches anything at all. Per-item field reads
//! are equally defensive: a missing field degrades to empty text, never
//! to a dropped batch.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::text::collapse_ws;

/// Priority-ordered list of card selectors; the first selector that yields
/// any elements wins for the whole document.
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn new(selectors: &[&str]) -> Result<SelectorChain> {
        let selectors = selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(SelectorChain { selectors })
    }

    /// Elements from the first matching strategy, empty when none match.
    pub fn first_match<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let found: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

/// Same chain idea scoped to a single card: the first selector that finds
/// a child element wins.
pub struct FieldChain {
    selectors: Vec<Selector>,
}

impl FieldChain {
    pub fn new(selectors: &[&str]) -> Result<FieldChain> {
        let selectors = selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(FieldChain { selectors })
    }

    pub fn first<'a>(&self, scope: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// Flattened text of the first match, or empty.
    pub fn first_text(&self, scope: &ElementRef<'_>) -> String {
        self.first(scope).map(|el| element_text(&el)).unwrap_or_default()
    }
}

pub fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| ScrapeError::selector(raw, format!("{e:?}")))
}

/// Element text with whitespace runs collapsed, like the sources render it.
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_ws(&element.text().collect::<String>())
}

/// Resolve a possibly-relative href against the site base, keeping only
/// http(s) results. Empty/hash/javascript hrefs resolve to None.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}

/// First image URL from a card: src, then the lazy-loading attribute
/// variants, protocol-relative `//` normalized to https.
pub fn image_url(card: &ElementRef<'_>, img_selector: &Selector, lazy_attrs: bool) -> String {
    let Some(img) = card.select(img_selector).next() else {
        return String::new();
    };
    let mut src = img.value().attr("src").unwrap_or("");
    if src.is_empty() && lazy_attrs {
        src = img
            .value()
            .attr("data-src")
            .or_else(|| img.value().attr("data-original"))
            .unwrap_or("");
    }
    normalize_image_url(src)
}

pub fn normalize_image_url(src: &str) -> String {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        src.to_string()
    }
}

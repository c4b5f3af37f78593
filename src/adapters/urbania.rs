//! urbania.pe adapter: browser-driven with real pagination. Each page is
//! scrolled until its height stops growing, then the adapter advances by
//! clicking one of the known next/load-more controls, falling back to
//! rewriting a `page=N` query parameter. Keywords are native here: the
//! site's own search handles them, including bedroom/bathroom phrases.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;

use crate::adapters::browser::{BrowserConfig, BrowserSession};
use crate::adapters::extract::{self, FieldChain, SelectorChain};
use crate::adapters::SourceAdapter;
use crate::config::CONFIG;
use crate::data_models::{Listing, SearchQuery};
use crate::error::Result;
use crate::text::{slugify_zone, truncate_chars};

const BASE: &str = "https://urbania.pe";

const CARD_CHAIN: &[&str] = &[
    "div[data-qa='posting PROPERTY']",
    "article",
    "div.postingCard-module__posting",
    "div.postingCard",
    "div.posting-card",
    "div[class*='postingCard']",
];

const PRICE_CHAIN: &[&str] = &[
    "div.postingPrices-module__price",
    ".first-price",
    ".price",
];

/// Candidates for the "next page / load more" control, in preference order.
const NEXT_SELECTORS: &[&str] = &[
    "a[rel='next']",
    "a[aria-label='Siguiente']",
    "a[data-qa='pagination-next']",
    "button[data-qa='pagination-next']",
    "a.pagination__next",
    "a.next",
    "button.load-more",
    "a.load-more",
];

/// Element whose presence means the result grid rendered.
const GRID_READY: &str = "article, div[data-qa='posting PROPERTY'], div.postingCard";

/// The site folds numeric filters into its free-text search, so the
/// keyword value combines user keywords with "N dormitorios"/"N banos"
/// phrases when those are constrained.
fn keyword_value(query: &SearchQuery) -> String {
    let mut parts = Vec::new();
    if query.has_keywords() {
        parts.push(query.keywords.trim().to_string());
    }
    if query.bedrooms_filter().is_some() {
        parts.push(format!("{} dormitorios", query.bedrooms.trim()));
    }
    if query.bathrooms_filter().is_some() {
        parts.push(format!("{} banos", query.bathrooms.trim()));
    }
    parts.join(" ")
}

pub fn build_url(query: &SearchQuery) -> String {
    let zone = query.zone.trim();
    let keywords = keyword_value(query);
    // the slugged zone path only exists for plain zone browsing
    let path = if !zone.is_empty() && keywords.is_empty() {
        format!(
            "{BASE}/buscar/alquiler-de-departamentos-en-{}--lima--lima",
            slugify_zone(zone)
        )
    } else {
        format!("{BASE}/buscar/alquiler-de-departamentos")
    };
    let mut url = Url::parse(&path).expect("static urbania URL");
    {
        let mut pairs = url.query_pairs_mut();
        if !keywords.is_empty() {
            pairs.append_pair("keyword", &keywords);
        }
        if let Some(min) = query.price_min {
            pairs.append_pair("priceMin", &min.to_string());
        }
        if let Some(max) = query.price_max {
            pairs.append_pair("priceMax", &max.to_string());
        }
    }
    let rendered = url.to_string();
    rendered.strip_suffix('?').map(str::to_string).unwrap_or(rendered)
}

/// Rewrite an existing `page=N` parameter to N+1. None when the URL has no
/// page parameter to bump (the click path is the only way forward then).
fn bump_page_param(current: &str) -> Option<String> {
    let mut url = Url::parse(current).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let page: i64 = pairs.iter().find(|(k, _)| k == "page")?.1.parse().ok()?;
    {
        let mut editor = url.query_pairs_mut();
        editor.clear();
        for (key, value) in &pairs {
            if key == "page" {
                editor.append_pair("page", &(page + 1).to_string());
            } else {
                editor.append_pair(key, value);
            }
        }
    }
    Some(url.to_string())
}

/// Pull cards out of one rendered page, deduping by link across the whole
/// call (re-scrolls re-serve earlier cards).
fn collect_cards(html: &str, seen: &mut HashSet<String>, results: &mut Vec<Listing>) -> Result<()> {
    let document = Html::parse_document(html);
    let chain = SelectorChain::new(CARD_CHAIN)?;
    let anchor_chain = FieldChain::new(&["a[href]", "h2 a", "h3 a"])?;
    let price_chain = FieldChain::new(PRICE_CHAIN)?;
    let img_selector = extract::parse_selector("img")?;
    let base = Url::parse(BASE).expect("static urbania base URL");

    for card in chain.first_match(&document) {
        let anchor = anchor_chain.first(&card);
        let Some(link) = anchor
            .as_ref()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| extract::resolve_link(&base, href))
        else {
            continue; // a card without a link is not a listing
        };
        if !seen.insert(link.clone()) {
            continue;
        }
        let title = match &anchor {
            Some(a) => {
                let text = extract::element_text(a);
                if text.is_empty() {
                    truncate_chars(&extract::element_text(&card), 140)
                } else {
                    text
                }
            }
            None => truncate_chars(&extract::element_text(&card), 140),
        };
        let price = price_chain.first_text(&card);
        let description = truncate_chars(&extract::element_text(&card), 400);
        let image = extract::image_url(&card, &img_selector, true);

        results.push(Listing::new(title, price, description, link, image));
    }
    Ok(())
}

pub struct UrbaniaScraper;

impl UrbaniaScraper {
    pub fn new() -> UrbaniaScraper {
        UrbaniaScraper
    }
}

impl Default for UrbaniaScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for UrbaniaScraper {
    fn name(&self) -> &'static str {
        "urbania"
    }

    fn keyword_native(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        let url = build_url(query);
        let max_pages = CONFIG.max_browser_pages;
        let scroll_rounds = CONFIG.scroll_rounds;
        let wait = Duration::from_millis(CONFIG.page_wait_ms);

        let listings = tokio::task::spawn_blocking(move || -> Result<Vec<Listing>> {
            let session = BrowserSession::launch(&BrowserConfig::default())?;
            session.goto(&url)?;
            session.wait_for(GRID_READY, Duration::from_secs(12));

            let mut results = Vec::new();
            let mut seen = HashSet::new();
            let mut page_count = 0;
            while page_count < max_pages {
                page_count += 1;
                session.scroll_until_stable(scroll_rounds, wait);

                let before = results.len();
                let html = session.page_html()?;
                collect_cards(&html, &mut seen, &mut results)?;

                // a page that added nothing means we must advance or stop
                if results.len() == before {
                    let mut advanced = session.click_first(NEXT_SELECTORS);
                    if advanced {
                        thread::sleep(wait + Duration::from_millis(500));
                    } else if let Some(next_url) = bump_page_param(&session.current_url()) {
                        if session.goto(&next_url).is_ok() {
                            thread::sleep(wait + Duration::from_millis(800));
                            advanced = true;
                        }
                    }
                    if !advanced {
                        break;
                    }
                }
                thread::sleep(Duration::from_millis(400));
            }
            Ok(results)
        })
        .await??;
        Ok(listings)
    }
}

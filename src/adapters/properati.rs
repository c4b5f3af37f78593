//! properati.com.pe adapter: a single static fetch. The site accepts a
//! keyword parameter but its matching is loose, so results still go
//! through the shared post-hoc keyword filter.

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::Html;

use crate::adapters::extract::{self, FieldChain, SelectorChain};
use crate::adapters::{http_client, SourceAdapter};
use crate::data_models::{Listing, SearchQuery};
use crate::error::{Result, ScrapeError};
use crate::text::{slugify_zone, truncate_chars};

const BASE: &str = "https://www.properati.com.pe";

const CARD_CHAIN: &[&str] = &["article", "div.posting-card", "a[href]"];

pub fn build_url(query: &SearchQuery) -> String {
    let zone = query.zone.trim();
    let path = if zone.is_empty() {
        format!("{BASE}/s/alquiler")
    } else {
        format!("{BASE}/s/{}/alquiler", slugify_zone(zone))
    };
    let mut url = Url::parse(&path).expect("static properati URL");
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("propertyType", "apartment,house");
        if query.has_keywords() {
            pairs.append_pair("keyword", query.keywords.trim());
        }
    }
    url.to_string()
}

fn parse_document(html: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let chain = SelectorChain::new(CARD_CHAIN)?;
    let anchor_chain = FieldChain::new(&["a[href]", "a.title"])?;
    let img_selector = extract::parse_selector("img")?;
    let base = Url::parse(BASE).expect("static properati base URL");

    let mut results = Vec::new();
    for card in chain.first_match(&document) {
        let anchor = anchor_chain
            .first(&card)
            .or_else(|| card.value().attr("href").map(|_| card));
        let link = anchor
            .as_ref()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| extract::resolve_link(&base, href))
            .unwrap_or_default();
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
        // the card has no dedicated price block; the leading text carries it
        let price = truncate_chars(&extract::element_text(&card), 80);
        let description = title.clone();
        let image = extract::image_url(&card, &img_selector, false);

        results.push(Listing::new(title, price, description, link, image));
    }
    Ok(results)
}

pub struct ProperatiScraper {
    client: Client,
}

impl ProperatiScraper {
    pub fn new() -> ProperatiScraper {
        ProperatiScraper {
            client: http_client(),
        }
    }
}

impl Default for ProperatiScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ProperatiScraper {
    fn name(&self) -> &'static str {
        "properati"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        let url = build_url(query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::http(&url, e))?;
        if !response.status().is_success() {
            return Err(ScrapeError::status(&url, response.status().as_u16()));
        }
        let html = response.text().await.map_err(|e| ScrapeError::http(&url, e))?;
        parse_document(&html)
    }
}

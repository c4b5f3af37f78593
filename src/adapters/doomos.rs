//! doomos.com.pe adapter: the plainest of the five. One static fetch with
//! query-string filters, no scroll, no pagination. Zone and keywords are
//! passed verbatim as `loc_name`/`key`, and unset price bounds are the
//! literal strings "min"/"max" the site expects.

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::Html;

use crate::adapters::extract::{self, FieldChain, SelectorChain};
use crate::adapters::{http_client, SourceAdapter};
use crate::data_models::{Listing, SearchQuery};
use crate::error::{Result, ScrapeError};
use crate::text::truncate_chars;

const BASE: &str = "http://www.doomos.com.pe";

const CARD_CHAIN: &[&str] = &[".content_result", ".result", "article"];

pub fn build_url(query: &SearchQuery) -> String {
    let mut url = Url::parse(&format!("{BASE}/search/")).expect("static doomos URL");
    {
        let mut pairs = url.query_pairs_mut();
        // fixed site parameters: rentals (clase=1) in Lima (provincia=15)
        pairs.append_pair("clase", "1");
        pairs.append_pair("stipo", "16");
        pairs.append_pair("pagina", "1");
        pairs.append_pair("sort", "primeasc");
        pairs.append_pair("provincia", "15");
        if query.has_keywords() {
            pairs.append_pair("key", query.keywords.trim());
        }
        if !query.zone.trim().is_empty() {
            pairs.append_pair("loc_name", query.zone.trim());
        }
        pairs.append_pair(
            "preciomin",
            &query.price_min.map(|v| v.to_string()).unwrap_or_else(|| "min".into()),
        );
        pairs.append_pair(
            "preciomax",
            &query.price_max.map(|v| v.to_string()).unwrap_or_else(|| "max".into()),
        );
    }
    url.to_string()
}

fn parse_document(html: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let chain = SelectorChain::new(CARD_CHAIN)?;
    let title_chain = FieldChain::new(&[".content_result_titulo a", "a[href]"])?;
    let price_chain = FieldChain::new(&[".content_result_precio"])?;
    let img_selector = extract::parse_selector("img")?;
    let base = Url::parse(BASE).expect("static doomos base URL");

    let mut results = Vec::new();
    for card in chain.first_match(&document) {
        let anchor = title_chain.first(&card);
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
        let link = anchor
            .as_ref()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| extract::resolve_link(&base, href))
            .unwrap_or_default();
        let price = price_chain.first_text(&card);
        let description = title.clone();
        let image = extract::image_url(&card, &img_selector, false);

        results.push(Listing::new(title, price, description, link, image));
    }
    Ok(results)
}

pub struct DoomosScraper {
    client: Client,
}

impl DoomosScraper {
    pub fn new() -> DoomosScraper {
        DoomosScraper {
            client: http_client(),
        }
    }
}

impl Default for DoomosScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for DoomosScraper {
    fn name(&self) -> &'static str {
        "doomos"
    }

    fn keyword_native(&self) -> bool {
        true
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

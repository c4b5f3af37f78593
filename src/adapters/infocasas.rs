//! infocasas.com.pe adapter: the listing grid only exists after
//! client-side rendering plus infinite scroll, so this one drives a
//! headless browser. Keywords go through the site's `searchstring`
//! parameter but are NOT trusted; the shared post-hoc filter still runs.

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
use crate::text::truncate_chars;

const BASE: &str = "https://www.infocasas.com.pe";

const CARD_CHAIN: &[&str] = &["a.lc-data", "li.lc-item", "div.listingCard", "article"];

fn build_url(query: &SearchQuery) -> String {
    let mut url = Url::parse(&format!("{BASE}/alquiler/casas-y-departamentos"))
        .expect("static infocasas URL");
    if query.has_keywords() {
        url.query_pairs_mut()
            .append_pair("searchstring", query.keywords.trim());
    }
    url.to_string()
}

fn parse_document(html: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let chain = SelectorChain::new(CARD_CHAIN)?;
    let anchor_chain = FieldChain::new(&["a[href]"])?;
    let price_chain = FieldChain::new(&["p.main-price", ".main-price"])?;
    let img_selector = extract::parse_selector("img")?;
    let base = Url::parse(BASE).expect("static infocasas base URL");

    let mut results = Vec::new();
    for node in chain.first_match(&document) {
        // the winning strategy may select the anchor itself
        let anchor = anchor_chain
            .first(&node)
            .or_else(|| node.value().attr("href").map(|_| node));
        let link = anchor
            .as_ref()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| extract::resolve_link(&base, href))
            .unwrap_or_default();
        let title = anchor
            .as_ref()
            .and_then(|a| a.value().attr("title"))
            .map(str::to_string)
            .unwrap_or_else(|| extract::element_text(&node));
        let title = truncate_chars(&title, 250);
        let price = price_chain.first_text(&node);
        let description = truncate_chars(&extract::element_text(&node), 400);
        let image = extract::image_url(&node, &img_selector, true);

        results.push(Listing::new(title, price, description, link, image));
    }
    Ok(results)
}

pub struct InfocasasScraper;

impl InfocasasScraper {
    pub fn new() -> InfocasasScraper {
        InfocasasScraper
    }
}

impl Default for InfocasasScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for InfocasasScraper {
    fn name(&self) -> &'static str {
        "infocasas"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        let url = build_url(query);
        let rounds = CONFIG.scroll_rounds;
        let pause = Duration::from_millis(CONFIG.scroll_pause_ms);

        let listings = tokio::task::spawn_blocking(move || -> Result<Vec<Listing>> {
            let session = BrowserSession::launch(&BrowserConfig::default())?;
            session.goto(&url)?;
            session.scroll_rounds(rounds, pause);
            let html = session.page_html()?;
            parse_document(&html)
        })
        .await??;
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_searchstring_only_with_keywords() {
        assert_eq!(
            build_url(&SearchQuery::default()),
            "https://www.infocasas.com.pe/alquiler/casas-y-departamentos"
        );
        let query = SearchQuery {
            keywords: "piscina mascotas".into(),
            ..SearchQuery::default()
        };
        assert_eq!(
            build_url(&query),
            "https://www.infocasas.com.pe/alquiler/casas-y-departamentos?searchstring=piscina+mascotas"
        );
    }

    #[test]
    fn anchor_cards_use_their_own_href_and_title() {
        let html = r#"
            <a class="lc-data" href="/depto/9" title="Depto en Surco">
              <p class="main-price">S/ 1,800</p>
              <img src="//cdn.ic.pe/9.jpg">
              3 dormitorios 2 baños
            </a>"#;
        let listings = parse_document(html).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Depto en Surco");
        assert_eq!(listings[0].link, "https://www.infocasas.com.pe/depto/9");
        assert_eq!(listings[0].price, "S/ 1,800");
        assert_eq!(listings[0].image_url, "https://cdn.ic.pe/9.jpg");
    }

    #[test]
    fn container_cards_fall_back_to_text_title() {
        let html = r#"
            <article>
              <a href="https://www.infocasas.com.pe/depto/10">ver</a>
              <p class="main-price">S/ 950</p>
              Departamento de 2 dormitorios en Lince
            </article>"#;
        let listings = parse_document(html).unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings[0].title.contains("Lince"));
        assert_eq!(listings[0].price, "S/ 950");
    }
}

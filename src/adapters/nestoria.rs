//! nestoria.pe adapter: plain HTTP fetches against slug-based listing
//! paths. The site has server-side numeric filters and a small English
//! keyword vocabulary, but no zone-less keyword search; that case fans
//! out across the known Lima districts.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::Html;

use crate::adapters::extract::{self, FieldChain, SelectorChain};
use crate::adapters::{http_client, SourceAdapter};
use crate::config::CONFIG;
use crate::data_models::{Listing, SearchQuery};
use crate::error::{Result, ScrapeError};
use crate::text::{slugify_zone, truncate_chars};

const BASE: &str = "https://www.nestoria.pe";

const CARD_CHAIN: &[&str] = &[
    "ul#main_listing_res > li",
    "li.item",
    "div.listing",
    "div.property",
    "article",
    "div.ad",
    "div.result",
];

const PRICE_CHAIN: &[&str] = &[".result__details__price", ".price"];

/// Districts enumerated when the caller gives keywords but no zone.
pub const DISTRICTS: [&str; 23] = [
    "comas",
    "miraflores",
    "san_isidro",
    "barranco",
    "san_miguel",
    "surco",
    "santiago-de-surco",
    "jesus-maria",
    "la-molina",
    "san-borja",
    "pueblo-libre",
    "rimac",
    "la-victoria",
    "magdalena-del-mar",
    "los-olivos",
    "san-juan-de-lurigancho",
    "san-juan-de-miraflores",
    "callao",
    "ventanilla",
    "chorrillos",
    "puente-piedra",
    "lince",
    "san-luis",
];

static KEYWORD_SYNONYMS: OnceLock<HashMap<&'static str, (&'static str, &'static str)>> =
    OnceLock::new();

/// Spanish search terms mapped to the site's keyword vocabulary. The whole
/// trimmed keyword string is the lookup key; most terms land in
/// `keywords_features`, property types have their own parameter.
fn keyword_synonyms() -> &'static HashMap<&'static str, (&'static str, &'static str)> {
    KEYWORD_SYNONYMS.get_or_init(|| {
        HashMap::from([
            ("piscina", ("keywords_features", "pool")),
            ("piscinas", ("keywords_features", "pool")),
            ("jardin", ("keywords_features", "garden")),
            ("jardín", ("keywords_features", "garden")),
            ("gimnasio", ("keywords_features", "gym")),
            ("gym", ("keywords_features", "gym")),
            ("comercial", ("keywords_property_type", "commercial")),
            ("condominio", ("keywords_features", "condo")),
            ("ascensor", ("keywords_features", "lift")),
            ("ascensores", ("keywords_features", "lift")),
            ("balcon", ("keywords_features", "balcony")),
            ("balcón", ("keywords_features", "balcony")),
            ("cancha deportiva", ("keywords_features", "sport_facilities")),
            ("bodega", ("keywords_features", "storage_room")),
            ("terraza", ("keywords_features", "terrace")),
            ("mascotas", ("keywords_features", "pets")),
        ])
    })
}

/// Keyword query parameter for the site: mapped through the synonym table
/// when possible, passed through verbatim otherwise.
fn keyword_param(keywords: &str) -> Option<(String, String)> {
    let key = keywords.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    match keyword_synonyms().get(key.as_str()) {
        Some((param, value)) => Some((param.to_string(), value.to_string())),
        None => Some(("keywords_features".to_string(), keywords.trim().to_string())),
    }
}

fn build_url(zone_slug: Option<&str>, query: &SearchQuery) -> String {
    let path = match zone_slug {
        Some(slug) => format!("{BASE}/{slug}/inmuebles/alquiler"),
        None => format!("{BASE}/inmuebles/alquiler"),
    };
    // BASE is static; the slug is already sanitized, so this cannot fail
    let mut url = Url::parse(&path).expect("static nestoria URL");
    {
        let mut pairs = url.query_pairs_mut();
        if let Some((param, value)) = keyword_param(&query.keywords) {
            pairs.append_pair(&param, &value);
        }
        if let Some(n) = query.bedrooms_filter() {
            pairs.append_pair("bedrooms", &n.to_string());
        }
        if let Some(n) = query.bathrooms_filter() {
            pairs.append_pair("bathrooms", &n.to_string());
        }
        if let Some(min) = query.price_min {
            pairs.append_pair("price_min", &min.to_string());
        }
        if let Some(max) = query.price_max {
            pairs.append_pair("price_max", &max.to_string());
        }
    }
    let rendered = url.to_string();
    rendered.strip_suffix('?').map(str::to_string).unwrap_or(rendered)
}

/// The fetch plan for a query: one zone URL, one general URL, or one URL
/// per enumerated district (keywords without a zone).
pub fn planned_urls(query: &SearchQuery) -> Vec<String> {
    let zone = query.zone.trim();
    if !zone.is_empty() {
        return vec![build_url(Some(&slugify_zone(zone)), query)];
    }
    if keyword_param(&query.keywords).is_some() {
        return DISTRICTS
            .iter()
            .map(|district| {
                let slug = slugify_zone(&district.replace('_', " "));
                build_url(Some(&slug), query)
            })
            .collect();
    }
    vec![build_url(None, query)]
}

pub struct NestoriaScraper {
    client: Client,
}

impl NestoriaScraper {
    pub fn new() -> NestoriaScraper {
        NestoriaScraper {
            client: http_client(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::http(url, e))?;
        if !response.status().is_success() {
            return Err(ScrapeError::status(url, response.status().as_u16()));
        }
        response.text().await.map_err(|e| ScrapeError::http(url, e))
    }

    /// Extract listings from one result page, skipping links already seen
    /// in this call (the site repeats cards across zones and sections).
    fn parse_document(html: &str, seen: &mut HashSet<String>) -> Result<Vec<Listing>> {
        let document = Html::parse_document(html);
        let chain = SelectorChain::new(CARD_CHAIN)?;
        let price_chain = FieldChain::new(PRICE_CHAIN)?;
        let anchor_chain = FieldChain::new(&["a[href]", "a"])?;
        let li_selector = extract::parse_selector("li")?;
        let img_selector = extract::parse_selector("img")?;
        let base = Url::parse(BASE).expect("static nestoria base URL");

        let mut items = chain.first_match(&document);
        if items.is_empty() {
            // last resort: any list item that carries a price block
            items = document
                .select(&li_selector)
                .filter(|li| price_chain.first(li).is_some())
                .collect();
        }

        let mut results = Vec::new();
        for item in items {
            let anchor = anchor_chain.first(&item);
            let title = match &anchor {
                Some(a) => {
                    let text = extract::element_text(a);
                    if text.is_empty() {
                        truncate_chars(&extract::element_text(&item), 140)
                    } else {
                        text
                    }
                }
                None => truncate_chars(&extract::element_text(&item), 140),
            };
            let link = anchor
                .as_ref()
                .and_then(|a| {
                    a.value()
                        .attr("href")
                        .or_else(|| a.value().attr("data-href"))
                })
                .and_then(|href| extract::resolve_link(&base, href))
                .unwrap_or_default();
            if !link.is_empty() && seen.contains(&link) {
                continue;
            }
            let price = price_chain.first_text(&item);
            let description = truncate_chars(&extract::element_text(&item), 800);
            let image = extract::image_url(&item, &img_selector, true);

            results.push(Listing::new(title, price, description, link.clone(), image));
            if !link.is_empty() {
                seen.insert(link);
            }
        }
        Ok(results)
    }
}

impl Default for NestoriaScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for NestoriaScraper {
    fn name(&self) -> &'static str {
        "nestoria"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        let urls = planned_urls(query);
        let fan_out = urls.len() > 1;
        let cap = CONFIG.max_results_per_zone;
        let delay = Duration::from_millis(CONFIG.district_delay_ms);

        let mut seen = HashSet::new();
        let mut aggregated = Vec::new();
        for (idx, url) in urls.iter().enumerate() {
            match self.fetch(url).await {
                Ok(html) => {
                    let mut listings = Self::parse_document(&html, &mut seen)?;
                    listings.truncate(cap);
                    aggregated.extend(listings);
                }
                Err(error) if fan_out => {
                    // one blocked district must not sink the whole sweep
                    log::warn!("nestoria district fetch failed ({url}): {error}");
                }
                Err(error) => return Err(error),
            }
            if fan_out && idx + 1 < urls.len() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(aggregated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_query_plans_a_single_slugged_url() {
        let query = SearchQuery {
            zone: "San Isidro".into(),
            ..SearchQuery::default()
        };
        let urls = planned_urls(&query);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0], "https://www.nestoria.pe/san-isidro/inmuebles/alquiler");
    }

    #[test]
    fn default_query_plans_the_general_path_without_fan_out() {
        let urls = planned_urls(&SearchQuery::default());
        assert_eq!(urls, vec!["https://www.nestoria.pe/inmuebles/alquiler".to_string()]);
    }

    #[test]
    fn keywords_without_zone_fan_out_across_districts() {
        let query = SearchQuery {
            keywords: "piscina".into(),
            ..SearchQuery::default()
        };
        let urls = planned_urls(&query);
        assert_eq!(urls.len(), DISTRICTS.len());
        assert!(urls[0].starts_with("https://www.nestoria.pe/comas/inmuebles/alquiler"));
        assert!(urls.iter().all(|u| u.contains("keywords_features=pool")));
        assert!(urls.iter().any(|u| u.contains("/san-isidro/")));
    }

    #[test]
    fn filters_become_query_parameters() {
        let query = SearchQuery {
            zone: "comas".into(),
            bedrooms: "2".into(),
            bathrooms: "1".into(),
            price_min: Some(500),
            price_max: Some(1500),
            ..SearchQuery::default()
        };
        let url = &planned_urls(&query)[0];
        assert!(url.contains("bedrooms=2"));
        assert!(url.contains("bathrooms=1"));
        assert!(url.contains("price_min=500"));
        assert!(url.contains("price_max=1500"));
    }

    #[test]
    fn keyword_synonyms_map_to_site_vocabulary() {
        assert_eq!(
            keyword_param("Piscina"),
            Some(("keywords_features".into(), "pool".into()))
        );
        assert_eq!(
            keyword_param("comercial"),
            Some(("keywords_property_type".into(), "commercial".into()))
        );
        assert_eq!(
            keyword_param("azotea"),
            Some(("keywords_features".into(), "azotea".into()))
        );
        assert_eq!(keyword_param("  "), None);
    }

    #[test]
    fn parse_takes_first_matching_strategy_and_dedups_links() {
        let html = r#"
            <ul id="main_listing_res">
              <li><a href="/depto/1">Depto A</a>
                  <span class="price">S/ 1,200</span>
                  <img data-src="//cdn.pe/a.jpg"></li>
              <li><a href="/depto/1">Depto A repetido</a>
                  <span class="price">S/ 1,200</span></li>
              <li><a href="https://www.nestoria.pe/depto/2">Depto B</a>
                  <span class="result__details__price">S/ 900</span></li>
            </ul>"#;
        let mut seen = HashSet::new();
        let listings = NestoriaScraper::parse_document(html, &mut seen).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Depto A");
        assert_eq!(listings[0].link, "https://www.nestoria.pe/depto/1");
        assert_eq!(listings[0].image_url, "https://cdn.pe/a.jpg");
        assert_eq!(listings[1].price, "S/ 900");
    }

    #[test]
    fn parse_falls_back_to_priced_list_items() {
        let html = r#"
            <div><ul>
              <li>Sin precio, se ignora</li>
              <li>Depto barato <span class="price">S/ 700</span></li>
            </ul></div>"#;
        let mut seen = HashSet::new();
        let listings = NestoriaScraper::parse_document(html, &mut seen).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, "S/ 700");
        assert!(listings[0].link.is_empty());
    }
}

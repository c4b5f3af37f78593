use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use crate::text;

/// Registry order of the five source adapters; merge order follows it.
pub const SOURCES: [&str; 5] = ["nestoria", "infocasas", "urbania", "properati", "doomos"];

/// Currency marker parsed out of raw price text.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    /// Peruvian soles ("S/"), the local currency every price filter assumes.
    Soles,
    /// Dollar-marked ("$") or otherwise foreign.
    Usd,
}

/// One normalized property advertisement.
///
/// Scraped fields stay as trimmed display text (empty string = absent, the
/// shape the sources hand us); the numeric views are accessor methods so a
/// record is never dropped just because a field failed to parse.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Raw price text, source-native formatting ("S/ 1,200").
    pub price: String,
    /// Area text, usually "NN m²" when the source exposes it at all.
    pub area: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub description: String,
    /// Canonical absolute URL; empty for sources that yield none.
    pub link: String,
    /// Protocol-normalized image URL, may be empty.
    pub image_url: String,
    /// One of [`SOURCES`]; stamped by the aggregator.
    pub source: String,
    pub scraped_at: DateTime<Utc>,
    pub is_featured: bool,
}

impl Listing {
    pub fn new(
        title: String,
        price: String,
        description: String,
        link: String,
        image_url: String,
    ) -> Listing {
        Listing {
            id: nanoid!(),
            title,
            price,
            area: String::new(),
            bedrooms: String::new(),
            bathrooms: String::new(),
            description,
            link,
            image_url,
            source: String::new(), // stamped on merge
            scraped_at: Utc::now(),
            is_featured: false,
        }
    }

    pub fn currency(&self) -> Option<Currency> {
        text::parse_price(&self.price).0
    }

    /// Parsed numeric price, only when the raw text is marked as soles.
    pub fn price_soles(&self) -> Option<i64> {
        text::price_in_soles(&self.price)
    }

    pub fn bedrooms_count(&self) -> Option<i64> {
        text::extract_int(&self.bedrooms)
    }

    pub fn bathrooms_count(&self) -> Option<i64> {
        text::extract_int(&self.bathrooms)
    }

    /// Area in m²: "85 m²" style text first, bare numbers as a fallback.
    pub fn area_m2(&self) -> Option<i64> {
        text::extract_m2(&self.area).or_else(|| text::extract_int(&self.area))
    }

    /// Dedup identity: the link when present, else title+source.
    pub fn identity_key(&self) -> String {
        if self.link.is_empty() {
            format!("{}|{}", self.title, self.source)
        } else {
            self.link.clone()
        }
    }
}

/// Canonical search request flowing through the whole pipeline.
///
/// Every field is optional in spirit: empty zone means all zones, "0" (or
/// empty) counts mean unconstrained, missing bounds mean unbounded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchQuery {
    #[serde(default)]
    pub zone: String,
    #[serde(default = "unconstrained")]
    pub bedrooms: String,
    #[serde(default = "unconstrained")]
    pub bathrooms: String,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
    /// Space-separated keyword tokens, matched conjunctively.
    #[serde(default)]
    pub keywords: String,
}

fn unconstrained() -> String {
    "0".to_string()
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            zone: String::new(),
            bedrooms: unconstrained(),
            bathrooms: unconstrained(),
            price_min: None,
            price_max: None,
            keywords: String::new(),
        }
    }
}

impl SearchQuery {
    pub fn bedrooms_filter(&self) -> Option<i64> {
        text::requested_count(&self.bedrooms)
    }

    pub fn bathrooms_filter(&self) -> Option<i64> {
        text::requested_count(&self.bathrooms)
    }

    pub fn has_price_filter(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    pub fn has_keywords(&self) -> bool {
        !self.keywords.trim().is_empty()
    }

    /// Lower-cased whitespace tokens for the conjunctive keyword match.
    pub fn keyword_tokens(&self) -> Vec<String> {
        self.keywords
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.to_string())
            .collect()
    }
}

#[test]
fn test_listing_parsed_views() {
    let mut listing = Listing::new(
        "Depto en Miraflores".into(),
        "S/ 2,500".into(),
        "Lindo departamento".into(),
        "https://example.pe/d/1".into(),
        String::new(),
    );
    listing.area = "85 m²".into();
    listing.bedrooms = "3 dorm.".into();
    assert_eq!(listing.price_soles(), Some(2500));
    assert_eq!(listing.currency(), Some(Currency::Soles));
    assert_eq!(listing.area_m2(), Some(85));
    assert_eq!(listing.bedrooms_count(), Some(3));
    assert_eq!(listing.bathrooms_count(), None);
    assert_eq!(listing.identity_key(), "https://example.pe/d/1");
}

#[test]
fn test_identity_key_without_link() {
    let mut listing = Listing::new("Casa".into(), "".into(), "".into(), "".into(), "".into());
    listing.source = "doomos".into();
    assert_eq!(listing.identity_key(), "Casa|doomos");
}

#[test]
fn test_query_filters() {
    let query = SearchQuery {
        bedrooms: "2".into(),
        keywords: "Piscina  Mascotas".into(),
        price_min: Some(500),
        ..SearchQuery::default()
    };
    assert_eq!(query.bedrooms_filter(), Some(2));
    assert_eq!(query.bathrooms_filter(), None);
    assert!(query.has_price_filter());
    assert_eq!(query.keyword_tokens(), vec!["piscina", "mascotas"]);
}

use serde::{Deserialize, Serialize};

use crate::data_models::{Listing, SearchQuery};
use crate::pagination::{PaginationMeta, DEFAULT_PAGE_SIZE};

/// Search request, shared by the POST body and the GET query string.
/// Every field is optional; defaults mean "no constraint".
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub zone: String,
    #[serde(default = "default_count")]
    pub bedrooms: String,
    #[serde(default = "default_count")]
    pub bathrooms: String,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
    #[serde(default)]
    pub keywords: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_count() -> String {
    "0".to_string()
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl SearchRequest {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            zone: self.zone.clone(),
            bedrooms: self.bedrooms.clone(),
            bathrooms: self.bathrooms.clone(),
            price_min: self.price_min,
            price_max: self.price_max,
            keywords: self.keywords.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    /// Total listings after dedup, across all pages.
    pub count: usize,
    /// The requested page, featured flag set.
    pub properties: Vec<Listing>,
    pub pagination: PaginationMeta,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct TrendingEntry {
    pub zone: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub keywords: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub trending: Vec<TrendingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

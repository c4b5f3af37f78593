//! Query fan-out across all source adapters.
//!
//! Adapters run strictly sequentially within one search; each one's
//! failure is recorded as a typed outcome and substituted with an empty
//! contribution, so no source can sink another source's results or the
//! response itself.

use std::collections::HashSet;

use crate::adapters::{
    DoomosScraper, InfocasasScraper, NestoriaScraper, ProperatiScraper, SourceAdapter,
    UrbaniaScraper,
};
use crate::data_models::{Listing, SearchQuery};
use crate::filters;

/// What happened to one adapter during a search.
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub source: &'static str,
    /// Listings the adapter produced before any filtering.
    pub raw_count: usize,
    /// Listings surviving the strict and keyword filters.
    pub kept_count: usize,
    /// Present when the adapter failed; its contribution was empty.
    pub error: Option<String>,
}

/// Merged, filtered, deduplicated result of one search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub listings: Vec<Listing>,
    pub outcomes: Vec<AdapterOutcome>,
}

pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Aggregator {
        Aggregator { adapters }
    }

    /// The five production sources, in merge-priority order.
    pub fn with_default_sources() -> Aggregator {
        Aggregator::new(vec![
            Box::new(NestoriaScraper::new()),
            Box::new(InfocasasScraper::new()),
            Box::new(UrbaniaScraper::new()),
            Box::new(ProperatiScraper::new()),
            Box::new(DoomosScraper::new()),
        ])
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Run every adapter for the query and combine their contributions.
    pub async fn run(&self, query: &SearchQuery) -> SearchOutcome {
        let mut merged: Vec<Listing> = Vec::new();
        let mut outcomes = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let source = adapter.name();
            log::info!("running source adapter: {source}");

            let (mut listings, error) = match adapter.search(query).await {
                Ok(listings) => (listings, None),
                Err(error) => {
                    log::error!("adapter {source} failed: {error}");
                    (Vec::new(), Some(error.to_string()))
                }
            };
            let raw_count = listings.len();

            for listing in &mut listings {
                filters::normalize_listing(listing);
                listing.source = source.to_string();
            }
            let mut kept = filters::strict_filter(listings, query);
            if query.has_keywords() && !adapter.keyword_native() {
                kept = filters::keyword_filter(kept, &query.keywords);
            }
            log::info!(
                "source {source}: {raw_count} raw, {} after filters",
                kept.len()
            );

            outcomes.push(AdapterOutcome {
                source,
                raw_count,
                kept_count: kept.len(),
                error,
            });
            merged.extend(kept);
        }

        SearchOutcome {
            listings: dedup_listings(merged),
            outcomes,
        }
    }
}

/// Drop records whose identity key (link, else title+source) was already
/// seen; the first occurrence wins (earliest adapter in registry order).
pub fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.identity_key()))
        .collect()
}

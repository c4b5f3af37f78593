//! Cached landing-page view: the top trending searches re-run through the
//! full pipeline, sliced into display sections plus a cross-query
//! featured set.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::aggregator::{dedup_listings, Aggregator};
use crate::data_models::{Listing, SearchQuery};
use crate::scoring;
use crate::trending::TrendingStore;

/// How many trending queries feed the sections.
const SECTION_QUERIES: usize = 3;
/// Listings shown per section.
const SECTION_DISPLAY: usize = 6;
/// Per-query contribution to the cross-query featured pool.
const POOL_PER_QUERY: usize = 20;
/// Size of the featured set.
const FEATURED_COUNT: usize = 9;

/// Zones used before any trending data exists.
const FALLBACK_ZONES: [&str; 3] = ["miraflores", "san isidro", "barranco"];

#[derive(Serialize, Debug, Clone)]
pub struct HomeFeedSection {
    pub title: String,
    pub query: SearchQuery,
    /// Total pipeline results for the query, not just the displayed slice.
    pub count: usize,
    pub properties: Vec<Listing>,
}

#[derive(Serialize, Debug, Clone)]
pub struct HomeFeedPayload {
    pub featured: Vec<Listing>,
    pub sections: Vec<HomeFeedSection>,
    pub generated_at: DateTime<Utc>,
    pub cache_ttl_secs: u64,
}

struct CachedFeed {
    payload: HomeFeedPayload,
    expires_at: Instant,
}

/// Single shared cache slot. Rebuilding happens while the slot lock is
/// held, so concurrent misses collapse into one scrape run instead of a
/// stampede.
pub struct HomeFeedCache {
    ttl: Duration,
    slot: Mutex<Option<CachedFeed>>,
}

impl HomeFeedCache {
    pub fn new(ttl: Duration) -> HomeFeedCache {
        HomeFeedCache {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_or_rebuild(
        &self,
        aggregator: &Aggregator,
        trending: &TrendingStore,
    ) -> HomeFeedPayload {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() {
                return cached.payload.clone();
            }
        }

        let payload = build_feed(aggregator, trending, self.ttl).await;
        *slot = Some(CachedFeed {
            payload: payload.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        payload
    }
}

/// The queries the feed is built from: top trending, or the fixed zone
/// fallback while the counters are still empty.
fn feed_queries(trending: &TrendingStore) -> Vec<SearchQuery> {
    let top = trending.top(SECTION_QUERIES);
    if top.is_empty() {
        return FALLBACK_ZONES
            .iter()
            .map(|zone| SearchQuery {
                zone: zone.to_string(),
                ..SearchQuery::default()
            })
            .collect();
    }
    top.into_iter().map(|(key, _)| key.to_query()).collect()
}

fn section_title(query: &SearchQuery) -> String {
    let zone = query.zone.trim();
    if zone.is_empty() {
        "Alquileres destacados".to_string()
    } else {
        format!("Alquileres en {}", capitalize_words(zone))
    }
}

fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn build_feed(
    aggregator: &Aggregator,
    trending: &TrendingStore,
    ttl: Duration,
) -> HomeFeedPayload {
    let mut sections = Vec::new();
    let mut pool: Vec<Listing> = Vec::new();

    for query in feed_queries(trending) {
        let outcome = aggregator.run(&query).await;
        let count = outcome.listings.len();

        pool.extend(outcome.listings.iter().take(POOL_PER_QUERY).cloned());

        let properties: Vec<Listing> =
            outcome.listings.into_iter().take(SECTION_DISPLAY).collect();
        sections.push(HomeFeedSection {
            title: section_title(&query),
            query,
            count,
            properties,
        });
    }

    let pool = dedup_listings(pool);
    let featured = scoring::top_by_score(&pool, FEATURED_COUNT);

    HomeFeedPayload {
        featured,
        sections,
        generated_at: Utc::now(),
        cache_ttl_secs: ttl.as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_zones_cover_the_empty_store() {
        let trending = TrendingStore::new();
        let queries = feed_queries(&trending);
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].zone, "miraflores");
    }

    #[test]
    fn trending_queries_replace_the_fallback() {
        let trending = TrendingStore::new();
        trending.record(&SearchQuery {
            zone: "lince".into(),
            ..SearchQuery::default()
        });
        let queries = feed_queries(&trending);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].zone, "lince");
    }

    #[test]
    fn section_titles_read_like_headings() {
        let query = SearchQuery {
            zone: "san isidro".into(),
            ..SearchQuery::default()
        };
        assert_eq!(section_title(&query), "Alquileres en San Isidro");
        assert_eq!(section_title(&SearchQuery::default()), "Alquileres destacados");
    }
}

//! Query-popularity tracking.
//!
//! Every incoming search bumps a counter keyed by its normalized form,
//! independent of whether any source returned results. The store is shared
//! by all concurrent requests; DashMap's sharded locks keep the
//! read-modify-write atomic per key.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use crate::data_models::SearchQuery;
use crate::text::collapse_ws;

/// Normalized, order-preserving encoding of a search query. Queries that
/// differ only in letter case or whitespace collapse to the same key.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrendingKey {
    pub zone: String,
    pub bedrooms: String,
    pub bathrooms: String,
    /// Stringified bound, empty when the query had none.
    pub price_min: String,
    pub price_max: String,
    pub keywords: String,
}

impl TrendingKey {
    pub fn from_query(query: &SearchQuery) -> TrendingKey {
        TrendingKey {
            zone: collapse_ws(&query.zone.to_lowercase()),
            bedrooms: normalize_count(&query.bedrooms),
            bathrooms: normalize_count(&query.bathrooms),
            price_min: query.price_min.map(|v| v.to_string()).unwrap_or_default(),
            price_max: query.price_max.map(|v| v.to_string()).unwrap_or_default(),
            keywords: collapse_ws(&query.keywords.to_lowercase()),
        }
    }

    /// Decode back into the query the key stands for (used by the home
    /// feed to re-run popular searches).
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            zone: self.zone.clone(),
            bedrooms: self.bedrooms.clone(),
            bathrooms: self.bathrooms.clone(),
            price_min: self.price_min.parse().ok(),
            price_max: self.price_max.parse().ok(),
            keywords: self.keywords.clone(),
        }
    }
}

fn normalize_count(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

struct Entry {
    count: u64,
    /// Monotonic insertion sequence; breaks count ties deterministically.
    seq: u64,
}

/// Process-scoped popularity counters. Initialized empty at startup,
/// mutated by every query, read by the trending endpoint and the home
/// feed, never persisted.
pub struct TrendingStore {
    entries: DashMap<TrendingKey, Entry>,
    next_seq: AtomicU64,
}

impl TrendingStore {
    pub fn new() -> TrendingStore {
        TrendingStore {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn record(&self, query: &SearchQuery) {
        let key = TrendingKey::from_query(query);
        self.entries
            .entry(key)
            .and_modify(|entry| entry.count += 1)
            .or_insert_with(|| Entry {
                count: 1,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            });
    }

    pub fn count(&self, query: &SearchQuery) -> u64 {
        self.entries
            .get(&TrendingKey::from_query(query))
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Top `n` keys by count, descending; ties resolved by first-seen order.
    pub fn top(&self, n: usize) -> Vec<(TrendingKey, u64)> {
        let mut snapshot: Vec<(TrendingKey, u64, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().count, entry.value().seq))
            .collect();
        snapshot.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        snapshot
            .into_iter()
            .take(n)
            .map(|(key, count, _)| (key, count))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TrendingStore {
    fn default() -> Self {
        Self::new()
    }
}

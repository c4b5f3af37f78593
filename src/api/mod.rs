use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::Aggregator;
use crate::config::CONFIG;
use crate::home_feed::HomeFeedCache;
use crate::trending::TrendingStore;

pub mod handlers;
pub mod models;

/// Everything a request handler needs: the adapter registry plus the two
/// pieces of process-scoped state (trending counters, home-feed slot).
pub struct AppState {
    pub aggregator: Aggregator,
    pub trending: TrendingStore,
    pub home_feed: HomeFeedCache,
}

impl AppState {
    pub fn new() -> AppState {
        AppState::with_aggregator(Aggregator::with_default_sources())
    }

    pub fn with_aggregator(aggregator: Aggregator) -> AppState {
        AppState {
            aggregator,
            trending: TrendingStore::new(),
            home_feed: HomeFeedCache::new(Duration::from_secs(CONFIG.home_feed_ttl_secs)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration: the consuming frontends live on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/sources", get(handlers::sources))
        .route("/search", post(handlers::search_post).get(handlers::search_get))
        .route("/trending", get(handlers::trending))
        .route("/home-feed", get(handlers::home_feed))
        .with_state(state)
        .layer(cors)
}

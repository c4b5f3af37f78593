use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::CONFIG;
use crate::home_feed::HomeFeedPayload;
use crate::pagination;
use crate::scoring;

use super::models::{
    SearchRequest, SearchResponse, SourcesResponse, TrendingEntry, TrendingParams,
    TrendingResponse,
};
use super::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Rental listing aggregation API",
        "status": "active",
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.aggregator.source_names(),
    })
}

pub async fn search_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(state, request).await
}

pub async fn search_get(
    State(state): State<Arc<AppState>>,
    Query(request): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(state, request).await
}

async fn run_search(
    state: Arc<AppState>,
    request: SearchRequest,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = request.query();
    // every query counts toward trending, even ones that scrape nothing
    state.trending.record(&query);

    // run the pipeline on its own task so an orchestration panic surfaces
    // as a server error instead of tearing down the connection
    let pipeline_state = state.clone();
    let pipeline_query = query.clone();
    let outcome = tokio::spawn(async move { pipeline_state.aggregator.run(&pipeline_query).await })
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error interno del servidor: {e}"),
            )
        })?;

    let total = outcome.listings.len();
    let (mut properties, meta) = pagination::paginate(&outcome.listings, request.page, request.page_size);
    scoring::mark_featured(&mut properties);

    let message = if total == 0 {
        "No se encontraron propiedades que coincidan con los criterios".to_string()
    } else {
        format!("Se encontraron {total} propiedades")
    };

    Ok(Json(SearchResponse {
        success: true,
        count: total,
        properties,
        pagination: meta,
        message,
    }))
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Json<TrendingResponse> {
    let limit = params.limit.unwrap_or(CONFIG.trending_limit);
    let trending = state
        .trending
        .top(limit)
        .into_iter()
        .map(|(key, count)| TrendingEntry {
            zone: key.zone.clone(),
            bedrooms: key.bedrooms.clone(),
            bathrooms: key.bathrooms.clone(),
            price_min: key.price_min.parse().ok(),
            price_max: key.price_max.parse().ok(),
            keywords: key.keywords,
            count,
        })
        .collect();
    Json(TrendingResponse { trending })
}

pub async fn home_feed(State(state): State<Arc<AppState>>) -> Json<HomeFeedPayload> {
    Json(
        state
            .home_feed
            .get_or_rebuild(&state.aggregator, &state.trending)
            .await,
    )
}

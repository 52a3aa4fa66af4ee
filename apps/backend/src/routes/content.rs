//! Content pool and lookup endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use tutor_core::types::Fingerprint;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::lookup::LookupCache;
use crate::AppState;

fn fingerprint(kind: &str, level: u8, topic: Option<String>) -> Result<Fingerprint> {
    let kind: ContentKind = kind.parse()?;
    let level = Level::new(level)?;
    let fingerprint = Fingerprint::new(kind, level);
    Ok(match topic {
        Some(topic) => fingerprint.with_topic(topic),
        None => fingerprint,
    })
}

/// GET /api/content/:kind/:level/page
pub async fn page(
    State(state): State<AppState>,
    Path((kind, level)): Path<(String, u8)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse>> {
    let fingerprint = fingerprint(&kind, level, query.topic)?;
    let page = state
        .pools
        .get_page(&fingerprint, query.page, query.page_size)
        .await?;

    Ok(Json(PageResponse {
        empty: page.is_empty_pool(),
        items: page.items,
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

/// GET /api/content/:kind/:level/next
pub async fn next(
    State(state): State<AppState>,
    Path((kind, level)): Path<(String, u8)>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<NextResponse>> {
    let fingerprint = fingerprint(&kind, level, query.topic)?;
    let item = state.pools.get_next(&fingerprint).await?;
    Ok(Json(NextResponse {
        empty: item.is_none(),
        item,
    }))
}

/// GET /api/content/:kind/:level/status
pub async fn status(
    State(state): State<AppState>,
    Path((kind, level)): Path<(String, u8)>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<PoolStatus>> {
    let fingerprint = fingerprint(&kind, level, query.topic)?;
    Ok(Json(state.pools.status(&fingerprint)))
}

/// DELETE /api/content/:kind/:level
pub async fn invalidate(
    State(state): State<AppState>,
    Path((kind, level)): Path<(String, u8)>,
    Query(query): Query<TopicQuery>,
) -> Result<StatusCode> {
    let fingerprint = fingerprint(&kind, level, query.topic)?;
    state.pools.invalidate(&fingerprint).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/lookup/:kind/:term
pub async fn lookup(
    State(state): State<AppState>,
    Path((kind, term)): Path<(String, String)>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>> {
    let kind: ContentKind = kind.parse()?;
    if !LookupCache::supports(kind) {
        return Err(ApiError::BadRequest(format!("{} does not support lookup", kind)));
    }
    if term.trim().is_empty() {
        return Err(ApiError::BadRequest("term is empty".to_string()));
    }
    let level = Level::new(query.level)?;

    let item = state.lookups.lookup(kind, level, &term).await?;
    Ok(Json(LookupResponse {
        empty: item.is_none(),
        item,
    }))
}

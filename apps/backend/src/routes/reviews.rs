//! Review scheduling endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::date_utils;
use crate::AppState;

/// GET /api/reviews
pub async fn list(State(state): State<AppState>) -> Result<Json<CardListResponse>> {
    let cards = state.reviews.cards()?;
    Ok(Json(CardListResponse { cards }))
}

/// GET /api/reviews/due
pub async fn due(
    State(state): State<AppState>,
    Query(query): Query<DueQuery>,
) -> Result<Json<CardListResponse>> {
    let as_of = query
        .as_of
        .unwrap_or_else(|| date_utils::today(state.settings.daily_reset_hour));
    let cards = state.reviews.due_cards(as_of)?;
    Ok(Json(CardListResponse { cards }))
}

/// POST /api/reviews
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddCardRequest>,
) -> Result<(StatusCode, Json<AddCardResponse>)> {
    if request.item.key().trim().is_empty() {
        return Err(ApiError::BadRequest("item has no key".to_string()));
    }
    let today = date_utils::today(state.settings.daily_reset_hour);
    let (card, created) = state.reviews.add_card(request.item, today)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AddCardResponse { card, created })))
}

/// POST /api/reviews/reschedule
pub async fn reschedule(
    State(state): State<AppState>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>> {
    let today = date_utils::today(state.settings.daily_reset_hour);
    let card = state
        .reviews
        .reschedule_key(&request.key, request.outcome, today)?
        .ok_or_else(|| ApiError::NotFound(format!("card {}", request.key)))?;
    Ok(Json(RescheduleResponse { card }))
}

/// DELETE /api/reviews/:key
pub async fn remove(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    if state.reviews.remove_card(&key)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("card {}", key)))
    }
}

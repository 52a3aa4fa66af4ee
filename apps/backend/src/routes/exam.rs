//! Exam endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/exam
pub async fn snapshot(State(state): State<AppState>) -> Json<ExamSnapshot> {
    Json(state.exam.snapshot().await)
}

/// POST /api/exam/start
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartExamRequest>,
) -> Result<Json<ExamSnapshot>> {
    let level = Level::new(request.level)?;
    Ok(Json(state.exam.start(level).await?))
}

/// POST /api/exam/answer
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<ExamSnapshot>> {
    match request.choice {
        Some(choice) => state.exam.answer(request.index, &choice).await?,
        None => state.exam.clear_answer(request.index).await?,
    }
    Ok(Json(state.exam.snapshot().await))
}

/// POST /api/exam/navigate
pub async fn navigate(
    State(state): State<AppState>,
    Json(nav): Json<Navigation>,
) -> Result<Json<NavigateResponse>> {
    let cursor = state.exam.navigate(nav).await?;
    Ok(Json(NavigateResponse { cursor }))
}

/// POST /api/exam/submit
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitOutcome>> {
    Ok(Json(state.exam.submit(request.confirm).await?))
}

/// POST /api/exam/reset
pub async fn reset(State(state): State<AppState>) -> Result<StatusCode> {
    state.exam.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/exam/history
pub async fn history(State(state): State<AppState>) -> Result<Json<HistoryResponse>> {
    let results = state.exam.history()?;
    Ok(Json(HistoryResponse { results }))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    services::{
        presentation::{card_view, CardView},
        session::{Session, SessionStatus, SubmitOutcome},
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub query: String,
}

/// Snapshot of the session as the frontend renders it.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub query: String,
    pub submitted_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardView>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            status: session.status(),
            query: session.query().to_string(),
            submitted_query: session.submitted_query().to_string(),
            error_message: session.error_message().map(String::from),
            cards: session.cards().map(|cards| {
                cards
                    .iter()
                    .enumerate()
                    .map(|(index, card)| card_view(index, card))
                    .collect()
            }),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Current session snapshot
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.read().await;
    Json(SessionView::from(&*session))
}

/// Submits a query and runs the recommendation call to completion.
///
/// Blank queries are a silent no-op. While a call is in flight the session
/// lock is released so `GET /session` keeps observing the `loading` state;
/// a second submission in that window is refused with 409.
pub async fn submit_query(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<SessionView>> {
    let outcome = {
        let mut session = state.session.write().await;
        session.begin_submission(&request.query)
    };

    match outcome {
        SubmitOutcome::IgnoredEmpty => {
            let session = state.session.read().await;
            Ok(Json(SessionView::from(&*session)))
        }
        SubmitOutcome::AlreadyLoading => Err(AppError::Conflict(
            "a submission is already in flight".to_string(),
        )),
        SubmitOutcome::Started { prompt, generation } => {
            let result = state.provider.fetch_recommendations(&prompt).await;

            let mut session = state.session.write().await;
            session.complete(generation, result);
            Ok(Json(SessionView::from(&*session)))
        }
    }
}

/// Starts a fresh query: clears results, echo and error, back to idle.
pub async fn reset_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.write().await;
    session.reset();
    Json(SessionView::from(&*session))
}

/// Records that a card's primary image failed to load in the frontend.
/// Idempotent per card; unknown indices are 404.
pub async fn image_failure(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<SessionView>> {
    let mut session = state.session.write().await;
    session.mark_image_failed(index)?;
    Ok(Json(SessionView::from(&*session)))
}

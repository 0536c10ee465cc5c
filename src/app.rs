//! Game API of the math practice application.
//!
//! Serves problems built from the number service and records game results.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::client::NumberSource;
use crate::error::NumgenError;
use crate::problem::{self, MathProblem};
use crate::session::{GameSession, GameTotals, SessionRecorder};

/// Shared handles of the game API.
#[derive(Clone)]
pub struct AppState {
    /// Number service client.
    pub numbers: Arc<dyn NumberSource>,
    /// Game session store.
    pub sessions: Arc<dyn SessionRecorder>,
}

/// Failures of the game API, rendered as `{"error": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    /// The difficulty label was rejected
    #[error("{0}")]
    InvalidDifficulty(String),

    /// The number service could not be reached or answered badly
    #[error("failed to fetch numbers")]
    NumbersUnavailable,

    /// The session store refused the results
    #[error("Failed to submit game results")]
    SessionFailed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidDifficulty(_) => StatusCode::BAD_REQUEST,
            AppError::NumbersUnavailable | AppError::SessionFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<NumgenError> for AppError {
    fn from(e: NumgenError) -> Self {
        match e {
            NumgenError::InvalidDifficulty(_) | NumgenError::ServiceError(_) => {
                AppError::InvalidDifficulty(e.to_string())
            }
            e => {
                warn!("Number service unavailable: {e}");
                AppError::NumbersUnavailable
            }
        }
    }
}

#[derive(Deserialize)]
struct DifficultyParams {
    difficulty: Option<String>,
}

#[derive(Deserialize)]
struct SubmitGame {
    user_id: u64,
    #[serde(flatten)]
    totals: GameTotals,
}

#[derive(Serialize)]
struct Submitted {
    message: &'static str,
}

/// Router for the game API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/get_math_problem", get(get_math_problem))
        .route("/start_game", post(start_game))
        .route("/submit_game", post(submit_game))
        .route("/user/{user_id}/sessions", get(user_sessions))
        .with_state(state)
}

async fn fetch_problem(
    numbers: Arc<dyn NumberSource>,
    difficulty: Option<String>,
) -> Result<MathProblem, AppError> {
    let problem = tokio::task::spawn_blocking(move || {
        problem::solve(numbers.as_ref(), difficulty.as_deref())
    })
    .await
    .map_err(|e| {
        error!("Number fetch task failed: {e}");
        AppError::NumbersUnavailable
    })??;
    Ok(problem)
}

async fn get_math_problem(
    State(state): State<AppState>,
    Query(params): Query<DifficultyParams>,
) -> Result<Json<MathProblem>, AppError> {
    Ok(Json(fetch_problem(state.numbers, params.difficulty).await?))
}

async fn start_game(
    State(state): State<AppState>,
    Form(params): Form<DifficultyParams>,
) -> Result<Json<MathProblem>, AppError> {
    let problem = fetch_problem(state.numbers, params.difficulty).await?;
    info!("Game started at {} difficulty", problem.difficulty);
    Ok(Json(problem))
}

async fn submit_game(
    State(state): State<AppState>,
    Json(body): Json<SubmitGame>,
) -> Result<Json<Submitted>, AppError> {
    let session = state
        .sessions
        .record(body.user_id, body.totals, Utc::now())
        .map_err(|e| {
            error!("Error submitting game results: {e}");
            AppError::SessionFailed
        })?;
    info!(
        "Recorded game for user {} into session {}",
        session.user_id, session.id
    );
    Ok(Json(Submitted {
        message: "Game results submitted successfully!",
    }))
}

async fn user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<GameSession>>, AppError> {
    let sessions = state.sessions.sessions_for(user_id).map_err(|e| {
        error!("Error listing sessions of user {user_id}: {e}");
        AppError::SessionFailed
    })?;
    Ok(Json(sessions))
}

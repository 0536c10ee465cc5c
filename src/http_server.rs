//! HTTP adapter for the number service.

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    routing::get,
};
use log::{debug, info};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::policy;
use crate::protocol::Response;

/// Path of the generation endpoint.
pub const GENERATE_PATH: &str = "/api/generate_numbers";

#[derive(Deserialize)]
struct GenerateQuery {
    difficulty: Option<String>,
}

/// Router exposing [`GENERATE_PATH`].
pub fn router() -> Router {
    Router::new().route(GENERATE_PATH, get(generate_handler))
}

async fn generate_handler(Query(query): Query<GenerateQuery>) -> HttpResponse {
    let label = query.difficulty.unwrap_or_else(|| "easy".to_string());
    let response = policy::respond(&label, &mut rand::rng());
    debug!("Request {label:?} -> {response:?}");
    let status = match response {
        Response::Numbers(_) => StatusCode::OK,
        Response::Err { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(response)).into_response()
}

/// Serve `app` until ctrl-c.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler, run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

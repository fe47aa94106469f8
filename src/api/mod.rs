//! REST surface over the orchestrator.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    agent::{Orchestrator, TaskReport},
    error::Result,
    llm::LanguageModel,
    tools::ToolSpec,
};

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub task: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolsResponse {
    pub tools: Vec<String>,
    pub specs: Vec<ToolSpec>,
}

pub fn router<M>(orchestrator: Arc<Orchestrator<M>>) -> Router
where
    M: LanguageModel + 'static,
{
    Router::new()
        .route("/execute", post(execute::<M>))
        .route("/health", get(health))
        .route("/tools", get(list_tools::<M>))
        .with_state(orchestrator)
}

/// Binds `host:port` and serves until the process stops.
pub async fn serve<M>(orchestrator: Arc<Orchestrator<M>>, host: &str, port: u16) -> Result<()>
where
    M: LanguageModel + 'static,
{
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

pub async fn execute<M: LanguageModel>(
    State(orchestrator): State<Arc<Orchestrator<M>>>,
    Json(req): Json<ExecuteRequest>,
) -> std::result::Result<Json<TaskReport>, (StatusCode, Json<Value>)> {
    if req.task.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "task must not be empty" })),
        ));
    }
    Ok(Json(orchestrator.run(&req.task).await))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn list_tools<M: LanguageModel>(
    State(orchestrator): State<Arc<Orchestrator<M>>>,
) -> Json<ToolsResponse> {
    let registry = orchestrator.registry();
    Json(ToolsResponse {
        tools: registry.names(),
        specs: registry.list(),
    })
}

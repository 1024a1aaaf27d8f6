//! HTTP API server for course question answering.
//!
//! Provides REST endpoints for queries, course analytics and session resets.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{CourseAnalytics, Orchestrator};
use crate::tools::Source;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Coursemate API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Query", "POST   /api/query");
    Output::kv("Courses", "GET    /api/courses");
    Output::kv("Clear Session", "DELETE /api/sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/sessions/{session_id}", delete(clear_session))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<Source>,
    session_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    warn!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    let session_id = match req.session_id {
        Some(id) => id,
        None => match state.orchestrator.sessions().create_session() {
            Ok(id) => id,
            Err(e) => return internal_error(e),
        },
    };

    match state.orchestrator.query(&req.query, Some(&session_id)).await {
        Ok(result) => Json(QueryResponse {
            answer: result.answer,
            sources: result.sources,
            session_id,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.course_analytics().await {
        Ok(analytics) => Json::<CourseAnalytics>(analytics).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.orchestrator.sessions().clear_session(&session_id) {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::index::SearchMatch;
    use crate::llm::ModelResponse;
    use crate::session::{ConversationHistory, SessionManager};
    use crate::testing::{tool_use, ScriptedModel, StaticIndex};

    fn state(responses: Vec<ModelResponse>, index: StaticIndex) -> (Arc<AppState>, Arc<SessionManager>) {
        let sessions = Arc::new(SessionManager::new(2));
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(ScriptedModel::new(responses)),
            Arc::new(index),
            sessions.clone(),
        )
        .unwrap();
        (Arc::new(AppState { orchestrator }), sessions)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_creates_session_when_absent() {
        let (state, sessions) = state(
            vec![
                tool_use(&[("t1", "MCP")]),
                ModelResponse::answer("MCP is a protocol."),
            ],
            StaticIndex::with_matches(vec![SearchMatch {
                text: "MCP text".to_string(),
                course_title: "MCP Course".to_string(),
                lesson_number: Some(1),
            }]),
        );

        let response = query(
            State(state),
            Json(QueryRequest {
                query: "What is MCP?".to_string(),
                session_id: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "MCP is a protocol.");
        assert_eq!(body["sources"][0]["label"], "MCP Course - Lesson 1");

        let session_id = body["session_id"].as_str().unwrap();
        assert_eq!(sessions.exchanges(session_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_uses_provided_session() {
        let (state, sessions) = state(vec![ModelResponse::answer("ok")], StaticIndex::empty());

        let response = query(
            State(state),
            Json(QueryRequest {
                query: "hello".to_string(),
                session_id: Some("existing-session".to_string()),
            }),
        )
        .await;

        let body = body_json(response).await;
        assert_eq!(body["session_id"], "existing-session");
        assert_eq!(sessions.exchanges("existing-session").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_model_failure_returns_500() {
        let (state, _) = state(vec![], StaticIndex::empty());

        let response = query(
            State(state),
            Json(QueryRequest {
                query: "hello".to_string(),
                session_id: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_courses_returns_analytics() {
        let (state, _) = state(vec![], StaticIndex::empty());

        let response = courses(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_courses"], 0);
        assert_eq!(body["course_titles"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_clear_session_returns_ok() {
        let (state, sessions) = state(vec![], StaticIndex::empty());
        sessions.add_exchange("my-session-42", "q", "a").unwrap();

        let response = clear_session(State(state), Path("my-session-42".to_string())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok" }));
        assert!(sessions.history("my-session-42").unwrap().is_none());
    }
}

//! HTTP API for chat front-ends.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version and corpus size) |
//! | `GET`  | `/profile` | Owner name, links, picture, greeting, project names |
//! | `GET`  | `/tools/list` | Tools a turn would expose, with schemas |
//! | `POST` | `/tools/{name}` | Run one tool directly |
//! | `POST` | `/chat` | One conversation turn |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unknown_tool` (404),
//! `tool_unavailable` (404), `tool_error` (500), `model_error` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser chat page can
//! be served from anywhere.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use folio_core::models::{Message, Role, ToolCall};
use folio_core::tools::{ToolDescriptor, ToolError};

use crate::assistant::{Assistant, Profile};

/// Build the application router around a shared assistant.
pub fn app(assistant: Arc<Assistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/profile", get(handle_profile))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/chat", post(handle_chat))
        .layer(cors)
        .with_state(assistant)
}

/// Serve the API on `bind` until the process is terminated.
pub async fn run_server(assistant: Arc<Assistant>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(bind, "HTTP server listening");
    println!("folio listening on http://{}", bind);
    axum::serve(listener, app(assistant)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        let status = match &err {
            ToolError::UnknownTool(_) | ToolError::Unavailable(_) => StatusCode::NOT_FOUND,
            ToolError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
            ToolError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    retriever: bool,
}

async fn handle_health(State(assistant): State<Arc<Assistant>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: assistant.corpus().len(),
        retriever: assistant.index().is_some(),
    })
}

// ============ GET /profile ============

async fn handle_profile(State(assistant): State<Arc<Assistant>>) -> Json<Profile> {
    Json(assistant.profile().clone())
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolDescriptor>,
}

async fn handle_list_tools(State(assistant): State<Arc<Assistant>>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: assistant.tool_descriptors(),
    })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(assistant): State<Arc<Assistant>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    // An empty body means no arguments.
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| bad_request(format!("invalid JSON body: {}", e)))?
    };
    let call = ToolCall {
        id: format!("http_{}", uuid::Uuid::new_v4().simple()),
        name,
        arguments: params,
    };
    let result = assistant.tools().execute(&call).await?;
    Ok(Json(serde_json::json!({ "result": result })))
}

// ============ POST /chat ============

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// A prior exchange as the front-end keeps it.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub tools_used: Vec<String>,
    pub exhausted: bool,
}

/// Only user and assistant turns are accepted from clients.
fn history_to_messages(history: Vec<HistoryEntry>) -> Result<Vec<Message>, AppError> {
    history
        .into_iter()
        .map(|entry| match entry.role {
            Role::User => Ok(Message::user(entry.content)),
            Role::Assistant => Ok(Message::assistant(entry.content)),
            other => Err(bad_request(format!(
                "history role must be 'user' or 'assistant', got '{}'",
                serde_json::to_value(other)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default()
            ))),
        })
        .collect()
}

async fn handle_chat(
    State(assistant): State<Arc<Assistant>>,
    req: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = req?;
    let question = req.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let history = history_to_messages(req.history)?;

    match assistant.turn(question, &history).await {
        Ok(outcome) => Ok(Json(ChatResponse {
            answer: outcome.answer,
            tools_used: outcome.tools_used,
            exhausted: outcome.exhausted,
        })),
        Err(e) => {
            error!(error = ?e, "chat turn failed");
            Err(AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "model_error".to_string(),
                message: "Sorry, I ran into an error. Please try again.".to_string(),
            })
        }
    }
}

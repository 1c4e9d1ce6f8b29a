use crate::LoopFactory;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use pal_core::{AgentLoop, ServerConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

type Session = Arc<Mutex<AgentLoop>>;

/// Shared across handlers. Each session owns its own loop; requests to the
/// same session queue on its mutex.
#[derive(Clone)]
pub struct AppState {
    factory: LoopFactory,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl AppState {
    pub fn new(factory: LoopFactory) -> Self {
        Self {
            factory,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn session(&self, id: Uuid) -> Result<Session, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    async fn insert_session(&self, agent_loop: AgentLoop) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(agent_loop)));
        info!("Created session {}", id);
        id
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Request body must be JSON: {}", rejection.body_text()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    message: String,
    session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    response: String,
    session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ClearBody {
    session_id: Uuid,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/clear", post(clear_history))
        .route("/api/sessions/:id", delete(close_session))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /api/chat - send a message, creating a session when none is given
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(body) = body?;

    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest(
            "Message is required and cannot be empty".into(),
        ));
    }

    let internal = |e: pal_core::ProviderError| AppError::Internal(format!("An error occurred: {e}"));

    // a new session is only stored once its first exchange succeeds
    let (response, session_id) = match body.session_id {
        Some(id) => {
            let session = state.session(id).await?;
            let mut agent_loop = session.lock().await;
            (agent_loop.send_message(message).await.map_err(internal)?, id)
        }
        None => {
            let mut agent_loop = state.factory.create();
            let response = agent_loop.send_message(message).await.map_err(internal)?;
            (response, state.insert_session(agent_loop).await)
        }
    };

    Ok(Json(ChatReply {
        response,
        session_id,
    }))
}

/// POST /api/chat/clear - reset a session's history
async fn clear_history(
    State(state): State<AppState>,
    body: Result<Json<ClearBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = body?;
    let session = state.session(body.session_id).await?;
    session.lock().await.clear_history();

    Ok(Json(json!({ "message": "Conversation history cleared" })))
}

/// DELETE /api/sessions/:id - drop a session and its loop
async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    info!("Closed session {}", id);

    Ok(Json(json!({ "message": "Session closed" })))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.read().await.len();
    Json(json!({ "status": "healthy", "sessions": sessions }))
}

pub async fn serve(config: &ServerConfig, factory: LoopFactory) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, create_router(AppState::new(factory)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

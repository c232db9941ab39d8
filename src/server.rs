//! HTTP front-end: `POST /chat`, the static chat widget, and CORS.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;

use crate::chat::ChatService;

/// Detail returned to the client when a chat turn fails.
pub const GENERIC_FAILURE: &str = "the assistant is unavailable right now, please try again";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub mensaje: String,
}

/// Successful `POST /chat` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Sanitized assistant reply.
    pub respuesta: String,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error detail.
    pub detail: String,
}

/// Build the application router.
///
/// `static_dir` must contain `index.html`, served at `/`; the whole
/// directory is served under `/static`.
pub fn router(chat: Arc<ChatService>, static_dir: &Path) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(chat)
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn chat_handler(
    State(chat): State<Arc<ChatService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    match chat.respond(&request.mensaje).await {
        Ok(processed) => Ok(Json(ChatResponse {
            respuesta: processed.text,
        })),
        Err(e) => {
            error!(error = %e, "chat turn failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: GENERIC_FAILURE.to_owned(),
                }),
            ))
        }
    }
}

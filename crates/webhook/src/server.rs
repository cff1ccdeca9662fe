//! HTTP endpoint receiving Telegram updates

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use telegram::Conversation;
use tower_http::trace::TraceLayer;

use crate::update::WebhookUpdate;

/// Header Telegram uses to echo the secret token given to `setWebhook`
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// How long a webhook request may wait on its update before answering anyway
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 2;

/// Shared state of the webhook routes
#[derive(Clone)]
pub struct WebhookState {
    conversation: Arc<Conversation>,
    secret_token: Option<Arc<str>>,
    response_timeout: Duration,
}

/// Webhook receiver feeding updates to the conversation
#[derive(Clone)]
pub struct WebhookServer {
    state: WebhookState,
}

impl WebhookServer {
    /// Create a webhook server
    ///
    /// # Arguments
    /// * `conversation` - Engine every update is handed to
    /// * `secret_token` - When set, requests must carry it in the
    ///   `X-Telegram-Bot-Api-Secret-Token` header
    pub fn new(conversation: Arc<Conversation>, secret_token: Option<String>) -> Self {
        Self {
            state: WebhookState {
                conversation,
                secret_token: secret_token.map(Arc::from),
                response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
            },
        }
    }

    /// Upper bound on the time between receiving an update and answering
    ///
    /// Handling that outlives it keeps running in the background.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.state.response_timeout = timeout;
        self
    }

    /// Create the axum router with all routes configured
    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(receive_update))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the webhook server
    ///
    /// # Arguments
    /// * `host` - Host to bind to (e.g., "0.0.0.0")
    /// * `port` - Port to bind to (e.g., 4000)
    pub async fn serve(self, host: &str, port: u16) -> std::io::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Webhook receiver listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

/// Health check endpoint
async fn health_check(State(state): State<WebhookState>) -> impl IntoResponse {
    let pending = state.conversation.store().len();
    (
        StatusCode::OK,
        format!("Webhook receiver running. Pending registrations: {}", pending),
    )
}

/// Accept one Telegram update
async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(expected) = &state.secret_token {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        let matches = provided
            .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
            .unwrap_or(false);
        if !matches {
            return Err(AppError::Unauthorized("Invalid secret token".to_string()));
        }
    }

    let update: WebhookUpdate = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed update: {}", e)))?;
    let update_id = update.update_id;

    let inbound = update.into_inbound().map_err(|e| {
        tracing::warn!("Rejected update {}: {}", update_id, e);
        AppError::BadRequest(e.to_string())
    })?;

    let inbound = match inbound {
        Some(inbound) => inbound,
        None => {
            tracing::debug!("Update {} has no text, ignoring", update_id);
            return Ok(StatusCode::OK);
        }
    };

    let conversation = state.conversation.clone();
    let task = tokio::spawn(async move { conversation.handle(inbound).await });
    match tokio::time::timeout(state.response_timeout, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Handling update {} failed: {}", update_id, e),
        Err(_) => tracing::warn!(
            "Update {} still in progress after {:?}, answering now",
            update_id,
            state.response_timeout
        ),
    }

    Ok(StatusCode::OK)
}

/// Application error types
#[derive(Debug)]
enum AppError {
    Unauthorized(String),
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, message).into_response()
    }
}

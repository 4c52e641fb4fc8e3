use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use invoker_otel::{extract_context, Extractor, ScopedExt};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handler::{InvocationHandler, InvocationRequest, InvocationResponse, SharedAgent};
use crate::health::{HealthTracker, PingResponse};

/// Fallback source for the session id when the body carries none.
pub const SESSION_ID_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-session-id";

#[derive(Clone, Debug)]
pub struct AppState {
    handler: Arc<InvocationHandler>,
    health: Arc<HealthTracker>,
}

impl AppState {
    pub fn new(agent: SharedAgent) -> Self {
        Self {
            handler: Arc::new(InvocationHandler::new(agent)),
            health: Arc::new(HealthTracker::new()),
        }
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/invocations", post(invocations))
        .route("/ping", get(ping))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn invocations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<InvocationRequest>,
) -> Result<Json<InvocationResponse>, ApiError> {
    if request.session_id().is_none() {
        request.session_id = headers
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
    }

    let parent = extract_context(&HeaderExtractor(&headers));
    let _busy = state.health.begin();
    let response = state.handler.handle(request).scoped(parent).await?;
    Ok(Json(response))
}

async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.health.status())
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

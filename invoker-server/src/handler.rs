use std::sync::Arc;

use invoker_agent::AgentResult;
use invoker_core::{InvokerError, Runnable};
use invoker_otel::{session_context, ScopedExt};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROMPT: &str = "Hello";

pub type SharedAgent = Arc<dyn Runnable<String, AgentResult> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl InvocationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            session_id: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The prompt, or [`DEFAULT_PROMPT`] when it is missing or empty.
    pub fn prompt(&self) -> &str {
        self.prompt
            .as_deref()
            .filter(|prompt| !prompt.is_empty())
            .unwrap_or(DEFAULT_PROMPT)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvocationResponse {
    pub result: String,
}

#[derive(Clone)]
pub struct InvocationHandler {
    agent: SharedAgent,
}

impl std::fmt::Debug for InvocationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationHandler").finish_non_exhaustive()
    }
}

impl InvocationHandler {
    pub fn new(agent: SharedAgent) -> Self {
        Self { agent }
    }

    /// Runs the prompt through the agent.
    ///
    /// With a session id, `session.id` baggage is layered on the current
    /// context and attached only while the agent future is being polled. The
    /// caller's context is back in place before this returns, on success and
    /// on failure alike.
    pub async fn handle(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResponse, InvokerError> {
        let prompt = request.prompt().to_string();
        let session_id = request.session_id();

        tracing::info!(
            session.id = session_id.unwrap_or(""),
            prompt_len = prompt.len(),
            "invocation received"
        );

        let invocation = self.agent.invoke(prompt);
        let outcome = match session_id {
            Some(session_id) => invocation.scoped(session_context(session_id)).await,
            None => invocation.await,
        };

        match outcome {
            Ok(result) => Ok(InvocationResponse {
                result: result.message.to_string(),
            }),
            Err(err) => {
                tracing::error!(
                    session.id = session_id.unwrap_or(""),
                    error = %err,
                    "invocation failed"
                );
                Err(err)
            }
        }
    }
}

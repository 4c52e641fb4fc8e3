use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use invoker_core::{
    InvokerError, LlmRequest, LlmResponse, Message, Runnable, TokenUsage, ToolCallingLlm,
};
use tracing::Instrument;

use crate::{ToolCallEnvelope, ToolContext, ToolSet};

pub const DEFAULT_MAX_STEPS: usize = 10;

/// What the loop does when a tool call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolFailurePolicy {
    /// Hand the error text back to the model as an error tool result and keep
    /// going. The model decides whether to retry or explain the failure.
    #[default]
    ReportToModel,
    FailFast,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentResult {
    pub message: Message,
    pub stop_reason: Option<String>,
    /// Model round trips taken, including the final one.
    pub steps: u32,
    pub usage: TokenUsage,
}

impl fmt::Display for AgentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message, f)
    }
}

/// Tool-calling loop over a single model.
pub struct Agent {
    model: Arc<dyn ToolCallingLlm>,
    tools: ToolSet,
    system_prompt: Option<String>,
    max_steps: usize,
    tool_failure_policy: ToolFailurePolicy,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("tools", &self.tools)
            .field("system_prompt", &self.system_prompt)
            .field("max_steps", &self.max_steps)
            .field("tool_failure_policy", &self.tool_failure_policy)
            .finish()
    }
}

pub struct AgentBuilder {
    model: Arc<dyn ToolCallingLlm>,
    tools: ToolSet,
    system_prompt: Option<String>,
    max_steps: usize,
    tool_failure_policy: ToolFailurePolicy,
}

impl AgentBuilder {
    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn tool_failure_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.tool_failure_policy = policy;
        self
    }

    pub fn build(self) -> Result<Agent, InvokerError> {
        if self.max_steps == 0 {
            return Err(InvokerError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(Agent {
            model: self.model,
            tools: self.tools,
            system_prompt: self.system_prompt,
            max_steps: self.max_steps,
            tool_failure_policy: self.tool_failure_policy,
        })
    }
}

impl Agent {
    pub fn builder(model: Arc<dyn ToolCallingLlm>) -> AgentBuilder {
        AgentBuilder {
            model,
            tools: ToolSet::default(),
            system_prompt: None,
            max_steps: DEFAULT_MAX_STEPS,
            tool_failure_policy: ToolFailurePolicy::default(),
        }
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub async fn run(&self, prompt: impl Into<String>) -> Result<AgentResult, InvokerError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let session_id = invoker_otel::current_session_id();
        let span = tracing::info_span!(
            "agent.invoke",
            correlation_id = %correlation_id,
            session.id = session_id.as_deref().unwrap_or(""),
        );
        self.run_loop(prompt.into(), correlation_id, session_id)
            .instrument(span)
            .await
    }

    async fn run_loop(
        &self,
        prompt: String,
        correlation_id: String,
        session_id: Option<String>,
    ) -> Result<AgentResult, InvokerError> {
        let mut messages = vec![Message::user(prompt)];
        let mut usage = TokenUsage::default();

        for step in 1..=self.max_steps {
            let step_id = step as u32;
            let request = LlmRequest {
                model: String::new(),
                system: self.system_prompt.clone(),
                messages: messages.clone(),
                tools: self.tools.specs().to_vec(),
            };

            let LlmResponse {
                content,
                tool_calls,
                stop_reason,
                usage: step_usage,
            } = self.model.invoke(request).await.map_err(|err| {
                tracing::warn!(step = step_id, error = %err, "model call failed");
                err
            })?;
            if let Some(step_usage) = &step_usage {
                usage.accumulate(step_usage);
            }

            if tool_calls.is_empty() {
                tracing::debug!(step = step_id, "model returned final answer");
                return Ok(AgentResult {
                    message: Message::assistant(content, Vec::new()),
                    stop_reason,
                    steps: step_id,
                    usage,
                });
            }

            messages.push(Message::assistant(content, tool_calls.clone()));

            for call in tool_calls {
                let ctx = ToolContext {
                    correlation_id: correlation_id.clone(),
                    step_id,
                    session_id: session_id.clone(),
                };
                let envelope = ToolCallEnvelope {
                    name: call.name.clone(),
                    args: call.args,
                    call_id: call.id.clone(),
                };
                let span = tracing::debug_span!("agent.tool", tool = %call.name, step = step_id);

                match self.tools.dispatch(envelope, ctx).instrument(span).await {
                    Ok(output) => {
                        tracing::debug!(tool = %call.name, step = step_id, "tool completed");
                        messages.push(Message::tool_result(call.id, output.to_string(), false));
                    }
                    Err(err) => {
                        tracing::warn!(tool = %call.name, step = step_id, error = %err, "tool failed");
                        match self.tool_failure_policy {
                            ToolFailurePolicy::FailFast => {
                                return Err(InvokerError::ToolCallFailed {
                                    tool_name: err.tool_name().to_string(),
                                    reason: err.to_string(),
                                });
                            }
                            ToolFailurePolicy::ReportToModel => {
                                messages.push(Message::tool_result(
                                    call.id,
                                    format!("Error: {err}"),
                                    true,
                                ));
                            }
                        }
                    }
                }
            }
        }

        Err(InvokerError::MaxStepsExceeded {
            max: self.max_steps,
        })
    }
}

#[async_trait]
impl Runnable<String, AgentResult> for Agent {
    async fn invoke(&self, input: String) -> Result<AgentResult, InvokerError> {
        self.run(input).await
    }
}

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use invoker_agent::{Agent, AgentResult};
use invoker_core::{
    InvokerError, LlmRequest, LlmResponse, Message, Role, Runnable, TokenUsage, ToolCall,
    ToolCallingLlm,
};
use invoker_otel::{
    attach, current_baggage_value, current_session_id, set_baggage, Context,
};
use invoker_server::{InvocationHandler, InvocationRequest, DEFAULT_PROMPT};
use invoker_tools::{builtin_toolset, CurrentTime};
use serde_json::json;

/// Echoes the prompt and records what the ambient context looked like.
#[derive(Default)]
struct RecordingAgent {
    seen: Mutex<Vec<(String, Option<String>)>>,
    fail: bool,
}

impl RecordingAgent {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Runnable<String, AgentResult> for RecordingAgent {
    async fn invoke(&self, prompt: String) -> Result<AgentResult, InvokerError> {
        self.seen
            .lock()
            .unwrap()
            .push((prompt.clone(), current_session_id()));
        tokio::task::yield_now().await;
        if self.fail {
            return Err(InvokerError::LlmProvider("backend unreachable".to_string()));
        }
        Ok(AgentResult {
            message: Message::assistant(format!("echo: {prompt}"), Vec::new()),
            stop_reason: Some("end_turn".to_string()),
            steps: 1,
            usage: TokenUsage::default(),
        })
    }
}

fn request(value: serde_json::Value) -> InvocationRequest {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn empty_payload_uses_default_prompt() {
    let agent = Arc::new(RecordingAgent::default());
    let handler = InvocationHandler::new(agent.clone());

    let response = handler.handle(request(json!({}))).await.unwrap();

    assert_eq!(response.result, format!("echo: {DEFAULT_PROMPT}"));
    assert_eq!(agent.seen(), vec![(DEFAULT_PROMPT.to_string(), None)]);
}

#[tokio::test]
async fn null_or_empty_prompt_uses_default_prompt() {
    let agent = Arc::new(RecordingAgent::default());
    let handler = InvocationHandler::new(agent.clone());

    handler
        .handle(request(json!({"prompt": null})))
        .await
        .unwrap();
    handler.handle(request(json!({"prompt": ""}))).await.unwrap();

    let prompts: Vec<String> = agent.seen().into_iter().map(|(prompt, _)| prompt).collect();
    assert_eq!(prompts, vec!["Hello", "Hello"]);
}

#[tokio::test]
async fn session_baggage_does_not_leak_into_next_request() {
    let agent = Arc::new(RecordingAgent::default());
    let handler = InvocationHandler::new(agent.clone());

    handler
        .handle(request(json!({"prompt": "hi", "session_id": "s1"})))
        .await
        .unwrap();
    assert_eq!(current_session_id(), None);

    handler
        .handle(request(json!({"prompt": "hi"})))
        .await
        .unwrap();

    assert_eq!(
        agent.seen(),
        vec![
            ("hi".to_string(), Some("s1".to_string())),
            ("hi".to_string(), None),
        ]
    );
}

#[tokio::test]
async fn empty_session_id_binds_nothing() {
    let agent = Arc::new(RecordingAgent::default());
    let handler = InvocationHandler::new(agent.clone());

    handler
        .handle(request(json!({"prompt": "hi", "session_id": ""})))
        .await
        .unwrap();

    assert_eq!(agent.seen(), vec![("hi".to_string(), None)]);
}

#[tokio::test]
async fn failing_agent_restores_context_before_error_is_seen() {
    let agent = Arc::new(RecordingAgent::failing());
    let handler = InvocationHandler::new(agent.clone());

    let err = handler
        .handle(request(json!({"prompt": "hi", "session_id": "s-fail"})))
        .await
        .unwrap_err();

    assert_eq!(current_session_id(), None);
    assert!(matches!(err, InvokerError::LlmProvider(ref msg) if msg == "backend unreachable"));
    assert_eq!(
        agent.seen(),
        vec![("hi".to_string(), Some("s-fail".to_string()))]
    );
}

#[tokio::test]
async fn session_is_layered_on_the_callers_context() {
    let agent = Arc::new(RecordingAgent::default());
    let handler = InvocationHandler::new(agent.clone());

    let _outer = attach(set_baggage(&Context::current(), "tenant", "acme"));

    handler
        .handle(InvocationRequest::new("hi").with_session_id("s2"))
        .await
        .unwrap();

    assert_eq!(current_baggage_value("tenant").as_deref(), Some("acme"));
    assert_eq!(current_session_id(), None);
    assert_eq!(agent.seen()[0].1.as_deref(), Some("s2"));
}

/// Calls the calculator once, then reports the formatted result.
struct CalculatorScript {
    requests: Mutex<Vec<LlmRequest>>,
}

#[async_trait]
impl ToolCallingLlm for CalculatorScript {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, InvokerError> {
        self.requests.lock().unwrap().push(request.clone());
        let last = request
            .messages
            .last()
            .ok_or_else(|| InvokerError::Custom("empty conversation".to_string()))?;

        if last.role == Role::Tool {
            let output: serde_json::Value = serde_json::from_str(&last.content)?;
            let formatted = output["formatted"].as_str().unwrap_or_default();
            return Ok(LlmResponse {
                content: format!("2 + 2 = {formatted}"),
                stop_reason: Some("end_turn".to_string()),
                ..LlmResponse::default()
            });
        }

        Ok(LlmResponse {
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "calculator".to_string(),
                args: json!({"expression": "2+2"}),
            }],
            stop_reason: Some("tool_use".to_string()),
            ..LlmResponse::default()
        })
    }
}

#[tokio::test]
async fn arithmetic_prompt_goes_through_calculator() {
    let model = Arc::new(CalculatorScript {
        requests: Mutex::new(Vec::new()),
    });
    let agent = Agent::builder(model.clone())
        .tools(builtin_toolset(CurrentTime::new()).unwrap())
        .build()
        .unwrap();
    let handler = InvocationHandler::new(Arc::new(agent));

    let response = handler
        .handle(request(json!({"prompt": "What is 2+2?"})))
        .await
        .unwrap();

    assert!(response.result.contains('4'), "{}", response.result);
    let requests = model.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages[0].content, "What is 2+2?");
    assert!(requests[0].tools.iter().any(|tool| tool.name == "calculator"));
}

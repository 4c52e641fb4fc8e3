use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use invoker_agent::{Agent, ToolContext, ToolError, ToolFailurePolicy, ToolSet, TypedTool};
use invoker_core::{
    InvokerError, LlmRequest, LlmResponse, Role, Runnable, TokenUsage, ToolCall, ToolCallingLlm,
};
use invoker_otel::{session_context, ScopedExt};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

/// Replays canned responses and records every request it saw.
struct ScriptedLlm {
    responses: Mutex<Vec<LlmResponse>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    fn new(mut responses: Vec<LlmResponse>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolCallingLlm for ScriptedLlm {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, InvokerError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| InvokerError::LlmProvider("script exhausted".to_string()))
    }
}

fn call(name: &str, args: serde_json::Value) -> LlmResponse {
    LlmResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: format!("call-{name}"),
            name: name.to_string(),
            args,
        }],
        stop_reason: Some("tool_use".to_string()),
        usage: Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        }),
    }
}

fn answer(text: &str) -> LlmResponse {
    LlmResponse {
        content: text.to_string(),
        tool_calls: Vec::new(),
        stop_reason: Some("end_turn".to_string()),
        usage: Some(TokenUsage {
            input_tokens: 20,
            output_tokens: 3,
            total_tokens: 23,
        }),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ShoutArgs {
    text: String,
}

struct Shout;

impl TypedTool for Shout {
    type Args = ShoutArgs;
    type Output = String;

    const NAME: &'static str = "shout";
    const DESCRIPTION: &'static str = "Uppercase the text.";

    async fn run(&self, args: ShoutArgs, _ctx: ToolContext) -> Result<String, ToolError> {
        if args.text.is_empty() {
            return Err(ToolError::InvalidArgument("nothing to shout".to_string()));
        }
        Ok(args.text.to_uppercase())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NoArgs {}

struct WhoAmI;

impl TypedTool for WhoAmI {
    type Args = NoArgs;
    type Output = Option<String>;

    const NAME: &'static str = "whoami";
    const DESCRIPTION: &'static str = "Report the session id.";

    async fn run(&self, _args: NoArgs, ctx: ToolContext) -> Result<Option<String>, ToolError> {
        Ok(ctx.session_id)
    }
}

fn tools() -> ToolSet {
    ToolSet::new()
        .register_with(Shout)
        .register_with(WhoAmI)
        .build()
        .unwrap()
}

#[tokio::test]
async fn agent_calls_tool_then_finishes() {
    let llm = ScriptedLlm::new(vec![call("shout", json!({"text": "hi"})), answer("HI")]);
    let agent = Agent::builder(llm.clone())
        .tools(tools())
        .system_prompt("be loud")
        .build()
        .unwrap();

    let result = agent.run("shout hi").await.unwrap();
    assert_eq!(result.to_string(), "HI");
    assert_eq!(result.message.role, Role::Assistant);
    assert_eq!(result.steps, 2);
    assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
    assert_eq!(result.usage.total_tokens, 38);

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].system.as_deref(), Some("be loud"));
    assert_eq!(requests[0].tools.len(), 2);

    let second = &requests[1].messages;
    assert_eq!(second.len(), 3);
    assert_eq!(second[1].role, Role::Assistant);
    assert_eq!(second[1].tool_calls[0].name, "shout");
    assert_eq!(second[2].role, Role::Tool);
    assert_eq!(second[2].tool_call_id.as_deref(), Some("call-shout"));
    assert_eq!(second[2].content, "\"HI\"");
    assert!(!second[2].is_error);
}

#[tokio::test]
async fn tool_error_is_reported_back_to_model() {
    let llm = ScriptedLlm::new(vec![
        call("shout", json!({"text": ""})),
        answer("I could not shout that."),
    ]);
    let agent = Agent::builder(llm.clone()).tools(tools()).build().unwrap();

    let result = agent.run("shout nothing").await.unwrap();
    assert_eq!(result.to_string(), "I could not shout that.");

    let tool_message = &llm.requests()[1].messages[2];
    assert!(tool_message.is_error);
    assert!(tool_message.content.contains("nothing to shout"));
}

#[tokio::test]
async fn unknown_tool_is_reported_back_to_model() {
    let llm = ScriptedLlm::new(vec![call("missing", json!({})), answer("ok")]);
    let agent = Agent::builder(llm.clone()).tools(tools()).build().unwrap();

    agent.run("go").await.unwrap();
    let tool_message = &llm.requests()[1].messages[2];
    assert!(tool_message.is_error);
    assert!(tool_message.content.contains("unknown tool 'missing'"));
}

#[tokio::test]
async fn fail_fast_policy_surfaces_tool_error() {
    let llm = ScriptedLlm::new(vec![call("shout", json!({"text": ""}))]);
    let agent = Agent::builder(llm)
        .tools(tools())
        .tool_failure_policy(ToolFailurePolicy::FailFast)
        .build()
        .unwrap();

    let err = agent.run("shout nothing").await.unwrap_err();
    assert!(matches!(
        err,
        InvokerError::ToolCallFailed { ref tool_name, .. } if tool_name == "shout"
    ));
}

#[tokio::test]
async fn agent_stops_after_max_steps() {
    let llm = ScriptedLlm::new(vec![
        call("shout", json!({"text": "a"})),
        call("shout", json!({"text": "b"})),
        call("shout", json!({"text": "c"})),
    ]);
    let agent = Agent::builder(llm).tools(tools()).max_steps(2).build().unwrap();

    let err = agent.run("loop").await.unwrap_err();
    assert!(matches!(err, InvokerError::MaxStepsExceeded { max: 2 }));
}

#[tokio::test]
async fn model_error_propagates() {
    let llm = ScriptedLlm::new(Vec::new());
    let agent = Agent::builder(llm).build().unwrap();

    let err = agent.run("hello").await.unwrap_err();
    assert!(matches!(err, InvokerError::LlmProvider(_)));
}

#[test]
fn zero_max_steps_is_rejected() {
    let llm = ScriptedLlm::new(Vec::new());
    let err = Agent::builder(llm).max_steps(0).build().unwrap_err();
    assert!(matches!(err, InvokerError::InvalidConfig(_)));
}

#[tokio::test]
async fn tools_observe_session_baggage() {
    let llm = ScriptedLlm::new(vec![call("whoami", json!({})), answer("done")]);
    let agent = Agent::builder(llm.clone()).tools(tools()).build().unwrap();

    agent
        .invoke("who am i".to_string())
        .scoped(session_context("s-42"))
        .await
        .unwrap();

    assert_eq!(llm.requests()[1].messages[2].content, "\"s-42\"");
}

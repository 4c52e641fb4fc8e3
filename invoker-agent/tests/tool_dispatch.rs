use invoker_agent::{ToolCallEnvelope, ToolContext, ToolDispatchError, ToolError, ToolSet, TypedTool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoArgs {
    text: String,
}

#[derive(Debug, Serialize)]
struct EchoOutput {
    echoed: String,
}

struct EchoTool;

impl TypedTool for EchoTool {
    type Args = EchoArgs;
    type Output = EchoOutput;

    const NAME: &'static str = "echo";
    const DESCRIPTION: &'static str = "Echo the text back.";

    async fn run(&self, args: Self::Args, _ctx: ToolContext) -> Result<Self::Output, ToolError> {
        if args.text.is_empty() {
            return Err(ToolError::InvalidArgument("text must not be empty".to_string()));
        }
        Ok(EchoOutput { echoed: args.text })
    }
}

fn ctx() -> ToolContext {
    ToolContext {
        correlation_id: "corr-1".to_string(),
        step_id: 1,
        session_id: None,
    }
}

fn envelope(name: &str, args: serde_json::Value, call_id: &str) -> ToolCallEnvelope {
    ToolCallEnvelope {
        name: name.to_string(),
        args,
        call_id: call_id.to_string(),
    }
}

#[tokio::test]
async fn unknown_tool_maps_to_unknown_tool_error() {
    let toolset = ToolSet::new().register_with(EchoTool).build().unwrap();

    let err = toolset
        .dispatch(envelope("missing", json!({"text": "hi"}), "call-1"), ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolDispatchError::UnknownTool {
            name,
            call_id
        } if name == "missing" && call_id == "call-1"
    ));
}

#[tokio::test]
async fn invalid_args_map_to_invalid_args_error() {
    let toolset = ToolSet::new().register_with(EchoTool).build().unwrap();

    let err = toolset
        .dispatch(envelope("echo", json!({"text": 42}), "call-2"), ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolDispatchError::InvalidArgs {
            name,
            call_id,
            ..
        } if name == "echo" && call_id == "call-2"
    ));
}

#[tokio::test]
async fn tool_error_maps_to_execution_error() {
    let toolset = ToolSet::new().register_with(EchoTool).build().unwrap();

    let err = toolset
        .dispatch(envelope("echo", json!({"text": ""}), "call-3"), ctx())
        .await
        .unwrap_err();
    assert_eq!(err.tool_name(), "echo");
    assert!(matches!(
        err,
        ToolDispatchError::Execution {
            source: ToolError::InvalidArgument(_),
            ..
        }
    ));
}

#[tokio::test]
async fn dispatch_runs_typed_tool_and_serializes_output() {
    let toolset = ToolSet::new().register_with(EchoTool).build().unwrap();

    let value = toolset
        .dispatch(envelope("echo", json!({"text": "hello"}), "call-4"), ctx())
        .await
        .unwrap();
    assert_eq!(value, json!({"echoed": "hello"}));
}

//! Wire types for `POST /model/{modelId}/converse`.

use invoker_core::{
    InvokerError, LlmRequest, LlmResponse, Message, Role, TokenUsage, ToolCall, ToolSpec, Value,
};
use serde::{Deserialize, Serialize};

use crate::BedrockConfig;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    pub messages: Vec<ConverseMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemBlock>,
    pub inference_config: InferenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConverseMessage {
    pub role: ConverseRole,
    pub content: Vec<ContentBlock>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConverseRole {
    User,
    Assistant,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SystemBlock {
    pub text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub tools: Vec<ToolEntry>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolEntry {
    pub tool_spec: ConverseToolSpec,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConverseToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InputSchema {
    pub json: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlock {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: Vec<ToolResultContent>,
    pub status: ToolResultStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ToolResultContent {
    Text(String),
    Json(Value),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

impl ConverseRequest {
    pub fn from_llm(request: &LlmRequest, config: &BedrockConfig) -> Self {
        let mut system: Vec<SystemBlock> = request
            .system
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| SystemBlock { text: text.clone() })
            .collect();
        let mut messages: Vec<ConverseMessage> = Vec::new();

        for message in &request.messages {
            let (role, blocks) = match message.role {
                Role::System => {
                    system.push(SystemBlock {
                        text: message.content.clone(),
                    });
                    continue;
                }
                Role::User => (ConverseRole::User, text_block(&message.content)),
                Role::Assistant => {
                    let mut blocks = text_block(&message.content);
                    blocks.extend(message.tool_calls.iter().map(|call| {
                        ContentBlock::ToolUse(ToolUseBlock {
                            tool_use_id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.args.clone(),
                        })
                    }));
                    (ConverseRole::Assistant, blocks)
                }
                Role::Tool => (ConverseRole::User, vec![tool_result_block(message)]),
            };

            if blocks.is_empty() {
                continue;
            }

            // Converse wants strictly alternating turns; tool results that
            // follow one another share a single user turn.
            match messages.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => messages.push(ConverseMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        let tool_config = if request.tools.is_empty() {
            None
        } else {
            Some(ToolConfig {
                tools: request.tools.iter().map(tool_entry).collect(),
            })
        };

        Self {
            messages,
            system,
            inference_config: InferenceConfig {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            tool_config,
        }
    }
}

fn text_block(content: &str) -> Vec<ContentBlock> {
    if content.is_empty() {
        Vec::new()
    } else {
        vec![ContentBlock::Text(content.to_string())]
    }
}

fn tool_result_block(message: &Message) -> ContentBlock {
    let content = match serde_json::from_str::<Value>(&message.content) {
        Ok(value @ Value::Object(_)) => ToolResultContent::Json(value),
        _ => ToolResultContent::Text(message.content.clone()),
    };
    ContentBlock::ToolResult(ToolResultBlock {
        tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
        content: vec![content],
        status: if message.is_error {
            ToolResultStatus::Error
        } else {
            ToolResultStatus::Success
        },
    })
}

fn tool_entry(spec: &ToolSpec) -> ToolEntry {
    ToolEntry {
        tool_spec: ConverseToolSpec {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: InputSchema {
                json: spec.parameters.clone(),
            },
        },
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: ConverseOutput,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<ConverseUsage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConverseOutput {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

/// Content is kept raw so block types we do not model (reasoning, images)
/// are skipped instead of failing the whole response.
#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConverseUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl ConverseResponse {
    pub fn into_llm_response(self) -> Result<LlmResponse, InvokerError> {
        let message = self.output.message.ok_or_else(|| InvokerError::ParseFailed {
            output: String::new(),
            reason: "converse response has no output message".to_string(),
        })?;

        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();
        for block in message.content {
            if let Some(text) = block.get("text").and_then(Value::as_str) {
                texts.push(text.to_string());
            } else if let Some(tool_use) = block.get("toolUse") {
                let tool_use: ToolUseBlock =
                    serde_json::from_value(tool_use.clone()).map_err(|err| {
                        InvokerError::ParseFailed {
                            output: tool_use.to_string(),
                            reason: err.to_string(),
                        }
                    })?;
                tool_calls.push(ToolCall {
                    id: tool_use.tool_use_id,
                    name: tool_use.name,
                    args: tool_use.input,
                });
            }
        }

        Ok(LlmResponse {
            content: texts.join("\n"),
            tool_calls,
            stop_reason: self.stop_reason,
            usage: self.usage.map(|usage| TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }
}

/// Pulls the human-readable message out of an AWS JSON error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("Message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

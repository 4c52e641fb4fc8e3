mod error;
mod llm;
mod runnable;
mod tool;
mod value;

pub use error::InvokerError;
pub use llm::{LlmRequest, LlmResponse, Message, Role, TokenUsage, ToolCall, ToolCallingLlm, ToolSpec};
pub use runnable::Runnable;
pub use tool::ToolError;
pub use value::Value;

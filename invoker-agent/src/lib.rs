mod agent;
mod error;
mod tooling;

pub use agent::{Agent, AgentBuilder, AgentResult, ToolFailurePolicy, DEFAULT_MAX_STEPS};
pub use error::ToolDispatchError;
pub use tooling::{
    ToolCallEnvelope, ToolContext, ToolError, ToolSet, ToolSetBuildError, ToolSetBuilder,
    TypedTool,
};

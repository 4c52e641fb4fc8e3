use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use invoker_core::{ToolSpec, Value};
use schemars::{schema::RootSchema, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ToolDispatchError;

pub type ToolError = invoker_core::ToolError;

#[derive(Clone, Debug)]
pub struct ToolContext {
    pub correlation_id: String,
    pub step_id: u32,
    /// `session.id` baggage active when the agent dispatched the call.
    pub session_id: Option<String>,
}

/// A tool with typed, schema-described arguments and a serializable output.
///
/// Implementations may write `async fn run`; the returned future must be
/// `Send` so agents can be driven from a multi-threaded runtime.
pub trait TypedTool: Send + Sync + 'static {
    type Args: DeserializeOwned + JsonSchema + Send;
    type Output: serde::Serialize + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn run(
        &self,
        args: Self::Args,
        ctx: ToolContext,
    ) -> impl Future<Output = Result<Self::Output, ToolError>> + Send;
}

#[derive(Clone, Debug, Deserialize)]
pub struct ToolCallEnvelope {
    pub name: String,
    pub args: Value,
    pub call_id: String,
}

#[derive(Clone)]
pub struct ToolSet {
    specs: Vec<ToolSpec>,
    dispatchers: BTreeMap<String, Arc<dyn ErasedToolRunner>>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("names", &self.names())
            .field("dispatchers_len", &self.dispatchers.len())
            .finish()
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            dispatchers: BTreeMap::new(),
        }
    }
}

impl ToolSet {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> ToolSetBuilder {
        ToolSetBuilder::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in name order, ready to advertise to a model.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub async fn dispatch(
        &self,
        envelope: ToolCallEnvelope,
        ctx: ToolContext,
    ) -> Result<Value, ToolDispatchError> {
        let Some(dispatcher) = self.dispatchers.get(&envelope.name) else {
            return Err(ToolDispatchError::UnknownTool {
                name: envelope.name,
                call_id: envelope.call_id,
            });
        };

        dispatcher
            .dispatch(&envelope.name, envelope.args, envelope.call_id, ctx)
            .await
    }
}

#[derive(Clone, Default)]
pub struct ToolSetBuilder {
    entries: Vec<ToolEntry>,
}

impl ToolSetBuilder {
    pub fn register_with<T>(mut self, tool: T) -> Self
    where
        T: TypedTool,
    {
        self.entries.push(ToolEntry {
            name: T::NAME.to_string(),
            description: T::DESCRIPTION.to_string(),
            args_schema: schemars::schema_for!(T::Args),
            runner: Arc::new(TypedToolRunner { tool }),
        });
        self
    }

    pub fn build(self) -> Result<ToolSet, ToolSetBuildError> {
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.entries.len());
        let mut dispatchers = BTreeMap::new();

        for entry in self.entries {
            if entry.name.trim().is_empty() {
                return Err(ToolSetBuildError::InvalidName { name: entry.name });
            }

            if !seen.insert(entry.name.clone()) {
                return Err(ToolSetBuildError::DuplicateName { name: entry.name });
            }

            let parameters = serde_json::to_value(&entry.args_schema).map_err(|err| {
                ToolSetBuildError::InvalidSchema {
                    name: entry.name.clone(),
                    reason: err.to_string(),
                }
            })?;

            specs.push(ToolSpec {
                name: entry.name.clone(),
                description: entry.description,
                parameters,
            });
            dispatchers.insert(entry.name, entry.runner);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ToolSet {
            specs,
            dispatchers,
        })
    }
}

#[derive(Clone)]
struct ToolEntry {
    name: String,
    description: String,
    args_schema: RootSchema,
    runner: Arc<dyn ErasedToolRunner>,
}

#[async_trait::async_trait]
trait ErasedToolRunner: Send + Sync {
    async fn dispatch(
        &self,
        name: &str,
        args: Value,
        call_id: String,
        ctx: ToolContext,
    ) -> Result<Value, ToolDispatchError>;
}

struct TypedToolRunner<T> {
    tool: T,
}

#[async_trait::async_trait]
impl<T> ErasedToolRunner for TypedToolRunner<T>
where
    T: TypedTool,
{
    async fn dispatch(
        &self,
        name: &str,
        args: Value,
        call_id: String,
        ctx: ToolContext,
    ) -> Result<Value, ToolDispatchError> {
        let typed_args = serde_json::from_value::<T::Args>(args).map_err(|source| {
            ToolDispatchError::InvalidArgs {
                name: name.to_string(),
                call_id: call_id.clone(),
                source,
            }
        })?;

        let output = self.tool.run(typed_args, ctx).await.map_err(|source| {
            ToolDispatchError::Execution {
                name: name.to_string(),
                call_id: call_id.clone(),
                source,
            }
        })?;

        serde_json::to_value(output).map_err(|source| ToolDispatchError::Serialization {
            name: name.to_string(),
            call_id,
            source,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolSetBuildError {
    InvalidName { name: String },
    DuplicateName { name: String },
    InvalidSchema { name: String, reason: String },
}

impl std::fmt::Display for ToolSetBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolSetBuildError::InvalidName { name } => {
                write!(f, "tool name must not be empty or whitespace: {name:?}")
            }
            ToolSetBuildError::DuplicateName { name } => {
                write!(f, "duplicate tool name: {name}")
            }
            ToolSetBuildError::InvalidSchema { name, reason } => {
                write!(f, "schema for tool {name} is not valid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolSetBuildError {}

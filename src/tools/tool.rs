//! Capabilities the reasoning model can invoke during a turn.
//!
//! A tool is resolved from the catalog by the exact name the model emits,
//! receives its arguments after schema validation, and answers with a JSON
//! value that becomes the tool result message. Tools that need user consent
//! answer with an authorization-required payload instead of failing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::{AgentToolParameters, ToolDefinition};
use crate::error::ParleyError;
use crate::types::AgentIdentity;

/// Per-call context handed to a tool.
///
/// `agent` is always the identity of the agent running this process, never
/// the identity asserted on a message. Tools that build consent links or
/// report "who am I" use its `did`, so a peer cannot make a local tool act
/// under its name.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Id of the model's tool call; the result message is paired with it.
    pub tool_call_id: String,
    /// The local agent, taken from configuration.
    pub agent: AgentIdentity,
}

/// A named capability registered in the [`ToolCatalog`](super::ToolCatalog).
///
/// Implementations must be cheap to share: the catalog holds them behind
/// `Arc` and calls from one reasoning pass run concurrently.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call this tool; unique within a catalog.
    fn name(&self) -> &str;

    /// Description shown to the model when deciding which tool to call.
    fn description(&self) -> &str;

    /// Argument schema, checked before every invocation.
    fn parameters(&self) -> &AgentToolParameters;

    /// Run the tool. An `Err` becomes an error tool result; the turn goes on.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ParleyError>;

    /// Definition advertised to the reasoning capability.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
        }
    }
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ParleyError>> + Send>>
    + Send
    + Sync;

/// A tool backed by an async closure, used by the built-in toolkit.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ParleyError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ParleyError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

//! Per-process tool catalog.
//!
//! The catalog is resolved once at startup from the configured subset of a
//! toolkit and is read-only afterwards. Every configured key must resolve;
//! an unknown key is a configuration error, not a skipped tool.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolDefinition;
use super::validation::validate_arguments;
use crate::error::ParleyError;
use crate::types::{AgentIdentity, Message, ToolCall};
use crate::util::timeout::with_timeout;

/// Tools available for selection, keyed by the name used in configuration.
pub type Toolkit = BTreeMap<String, Arc<dyn Tool>>;

/// Fixed registry from tool name to invocable capability.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}

impl ToolCatalog {
    /// Build a catalog from tools, rejecting duplicate names.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, ParleyError> {
        let mut by_name = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            if by_name.insert(tool.name().to_string(), idx).is_some() {
                return Err(ParleyError::Configuration(format!(
                    "tool '{}' registered twice",
                    tool.name()
                )));
            }
        }
        Ok(Self { tools, by_name })
    }

    /// Pick the configured subset out of a toolkit, in configuration order.
    pub fn from_toolkit<S: AsRef<str>>(selected: &[S], toolkit: &Toolkit) -> Result<Self, ParleyError> {
        let tools = selected
            .iter()
            .map(AsRef::as_ref)
            .map(|key| {
                toolkit.get(key).cloned().ok_or_else(|| {
                    let known = toolkit.keys().cloned().collect::<Vec<_>>().join(", ");
                    ParleyError::Configuration(format!(
                        "unknown tool '{key}' in TOOLS (available: {known})"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tools)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Look up a tool by its exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| &self.tools[idx])
    }

    /// Definitions advertised to the reasoning capability.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Invoke one tool call and turn the outcome into a tool result message.
    ///
    /// Validation failures, tool errors, and timeouts become an error result
    /// (`is_error = true`); only an unknown tool name fails the call.
    pub async fn invoke(
        &self,
        call: &ToolCall,
        agent: &AgentIdentity,
        timeout: Duration,
    ) -> Result<Message, ParleyError> {
        let tool = self.get(&call.name).ok_or_else(|| {
            ParleyError::Configuration(format!(
                "model requested tool '{}' which is not in the catalog",
                call.name
            ))
        })?;

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: call.id.clone(),
            agent: agent.clone(),
        };

        let outcome = match validate_arguments(&call.name, args.raw(), &tool.parameters().schema) {
            Ok(()) => with_timeout(timeout, tool.execute(&args, &ctx)).await,
            Err(err) => Err(err),
        };

        Ok(match outcome {
            Ok(value) => Message::tool_result(&call.id, value, false),
            Err(err) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %err, "tool invocation failed");
                Message::tool_result(&call.id, serde_json::json!({ "error": err.to_string() }), true)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool::AgentTool;
    use crate::tools::types::AgentToolParameters;
    use crate::types::ToolMessage;

    fn counter_tool(name: &str) -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            name,
            "Count things",
            AgentToolParameters::object()
                .integer("n", "How many", true)
                .build(),
            |args, _ctx| async move { Ok(serde_json::json!({ "n": args.get_i64("n")? })) },
        ))
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ToolCatalog::new(vec![counter_tool("count"), counter_tool("count")]).unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(_)));
    }

    #[test]
    fn unknown_toolkit_key_fails_fast() {
        let mut toolkit = Toolkit::new();
        toolkit.insert("counter".into(), counter_tool("count"));

        let catalog = ToolCatalog::from_toolkit(&["counter"], &toolkit).unwrap();
        assert_eq!(catalog.names(), vec!["count"]);

        let err = ToolCatalog::from_toolkit(&["counter", "shopify"], &toolkit).unwrap_err();
        assert!(err.to_string().contains("unknown tool 'shopify'"));
    }

    #[tokio::test]
    async fn invalid_arguments_become_error_results() {
        let catalog = ToolCatalog::new(vec![counter_tool("count")]).unwrap();

        let msg = catalog
            .invoke(&call("count", serde_json::json!({})), &AgentIdentity::default(), Duration::from_secs(1))
            .await
            .unwrap();

        let Message::Tool(ToolMessage { is_error, content, tool_call_id, .. }) = msg else {
            panic!("expected tool message");
        };
        assert!(is_error);
        assert_eq!(tool_call_id, "call_1");
        assert!(content["error"].as_str().unwrap().contains("missing required field 'n'"));
    }

    #[tokio::test]
    async fn unknown_tool_name_is_a_configuration_error() {
        let catalog = ToolCatalog::new(vec![counter_tool("count")]).unwrap();
        let err = catalog
            .invoke(&call("delete_everything", serde_json::json!({})), &AgentIdentity::default(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(_)));
    }

    #[tokio::test]
    async fn slow_tools_time_out_into_error_results() {
        let slow: Arc<dyn Tool> = Arc::new(AgentTool::new(
            "slow",
            "Never finishes in time",
            AgentToolParameters::empty(),
            |_args, _ctx| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(serde_json::json!({}))
            },
        ));
        let catalog = ToolCatalog::new(vec![slow]).unwrap();

        let msg = catalog
            .invoke(&call("slow", serde_json::json!({})), &AgentIdentity::default(), Duration::from_millis(20))
            .await
            .unwrap();

        let Message::Tool(result) = msg else { panic!("expected tool message") };
        assert!(result.is_error);
        assert!(result.content["error"].as_str().unwrap().contains("Timeout after 20ms"));
    }
}

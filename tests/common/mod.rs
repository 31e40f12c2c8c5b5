//! Shared test helpers and scripted provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use wiremock::MockServer;

use parley::config::TurnSettings;
use parley::delegation::DelegationClient;
use parley::engine::{AgentContext, Delegation, Router};
use parley::error::ParleyError;
use parley::provider::{ProviderRequest, ProviderResponse, ReasoningProvider};
use parley::tools::{AgentTool, AgentToolParameters, Tool, ToolCatalog};
use parley::types::{AgentIdentity, Message, ToolCall};

pub const AGENT_NAME: &str = "Parley";
pub const AGENT_DID: &str = "did:web:parley.test";

pub const SENTINEL_REPLY: &str =
    "<agent_discovery>\nI am not able to answer this question.\n</agent_discovery>";

pub fn local_identity() -> AgentIdentity {
    AgentIdentity::local(AGENT_NAME, AGENT_DID)
}

/// A provider that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ProviderResponse, ParleyError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a plain text reply.
    pub fn queue_text(&self, text: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ProviderResponse::text(text)));
        self
    }

    /// Queue a reply that requests tool calls, given as `(id, name, args)`.
    pub fn queue_tool_calls(&self, calls: &[(&str, &str, serde_json::Value)]) -> &Self {
        let tool_calls = calls
            .iter()
            .map(|(id, name, args)| ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args.clone(),
            })
            .collect();
        self.replies.lock().unwrap().push_back(Ok(ProviderResponse {
            text: String::new(),
            tool_calls,
        }));
        self
    }

    pub fn queue_error(&self, err: ParleyError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ParleyError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderResponse::text("Mock response")))
    }
}

/// A tool that echoes its `value` argument after `delay`.
pub fn echo_tool(name: &str, delay: Duration) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "Echo the given value",
        AgentToolParameters::object()
            .string("value", "Value to echo", true)
            .build(),
        move |args, _ctx| async move {
            tokio::time::sleep(delay).await;
            Ok(serde_json::json!({ "echo": args.get_str("value")? }))
        },
    ))
}

pub fn catalog(tools: Vec<Arc<dyn Tool>>) -> ToolCatalog {
    ToolCatalog::new(tools).unwrap()
}

pub fn router(provider: Arc<ScriptedProvider>, catalog: ToolCatalog) -> Router {
    let context = AgentContext::builder()
        .identity(local_identity())
        .catalog(catalog)
        .build();
    Router::new(provider, context)
}

/// A router delegating to `peer` with the given context window.
pub fn delegating_router(
    provider: Arc<ScriptedProvider>,
    peer: &MockServer,
    context_window: usize,
) -> Router {
    let endpoint = Url::parse(&format!("{}/api/chat/agents", peer.uri())).unwrap();
    let client = DelegationClient::new(endpoint, Duration::from_secs(5)).unwrap();
    let context = AgentContext::builder()
        .identity(local_identity())
        .delegation(Delegation {
            client,
            context_window,
        })
        .turn(TurnSettings::default())
        .build();
    Router::new(provider, context)
}

pub fn texts(messages: &[Message]) -> Vec<String> {
    messages.iter().map(Message::text).collect()
}

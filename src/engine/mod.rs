//! Turn orchestration.
//!
//! A turn moves through INIT → REASON → ROUTE_DECISION and then either
//! dispatches tools and reasons again, delegates to a peer once, or finishes.
//! Every path ends in PROVENANCE, which stamps untagged messages with the
//! local identity before the list is handed back.
//!
//! ```no_run
//! use parley::config::ParleyConfig;
//! use parley::engine::Router;
//! use parley::types::Message;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = ParleyConfig::from_env()?;
//! let router = Router::from_config(&config)?;
//! let outcome = router.run_turn(vec![Message::user("What's my balance?")]).await?;
//! for message in outcome.messages {
//!     println!("{}: {}", message.role(), message.text());
//! }
//! # Ok(())
//! # }
//! ```

pub mod routing;
pub mod state;

pub use routing::{decide, delegation_window, requests_discovery, Decision, DISCOVERY_SENTINEL};
pub use state::{reduce, ConversationState};

use std::sync::Arc;

use bon::Builder;
use futures::future::join_all;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn, Instrument};

use crate::config::{ParleyConfig, TurnSettings};
use crate::delegation::DelegationClient;
use crate::error::ParleyError;
use crate::provenance::{mark_remote, ProvenanceTagger};
use crate::provider::{create_provider, ProviderRequest, ReasoningProvider};
use crate::tools::{builtin, ToolCatalog};
use crate::types::{AgentIdentity, GenerationSettings, Message, ToolCall};

/// System preamble prepended to every turn.
pub const DEFAULT_PREAMBLE: &str = "You are an AI agent with access to various tools.
You should always respond with the following message when you can not complete a task or answer a question:

<agent_discovery>
I am not able to answer this question.
</agent_discovery>";

pub const DELEGATION_APOLOGY: &str =
    "I apologize, but I encountered an error while trying to connect with other agents.";
pub const NO_REQUEST_TO_FORWARD: &str =
    "I couldn't find the original request to forward to other agents.";

/// A configured peer plus how much history it receives.
#[derive(Debug, Clone)]
pub struct Delegation {
    pub client: DelegationClient,
    pub context_window: usize,
}

/// Everything a turn needs besides the reasoning capability.
///
/// Built once per process and shared read-only between turns.
#[derive(Debug, Clone, Builder)]
pub struct AgentContext {
    /// Local identity stamped on locally produced messages.
    pub identity: AgentIdentity,
    #[builder(default)]
    pub catalog: ToolCatalog,
    pub delegation: Option<Delegation>,
    #[builder(default)]
    pub turn: TurnSettings,
    #[builder(default)]
    pub generation: GenerationSettings,
}

/// How a turn ended up being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Route {
    /// Answered from the first reasoning pass.
    Direct,
    /// At least one round of tool calls.
    Tools,
    /// A peer answered.
    Delegated,
    /// Delegation was attempted and replaced by a fallback message.
    DelegationFailed,
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Inbound history followed by everything the turn appended, all tagged.
    /// The system preamble is not included.
    pub messages: Vec<Message>,
    pub route: Route,
    /// Number of reasoning calls made.
    pub passes: usize,
}

impl TurnOutcome {
    /// Messages to show a client.
    ///
    /// Without intermediate steps, tool results and assistant messages that
    /// only carry tool calls are dropped.
    pub fn visible_messages(&self, show_intermediate_steps: bool) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| show_intermediate_steps || !is_intermediate_step(m))
            .cloned()
            .collect()
    }
}

fn is_intermediate_step(message: &Message) -> bool {
    match message {
        Message::Tool(_) => true,
        Message::Assistant(m) => !m.tool_calls.is_empty() && m.content.trim().is_empty(),
        _ => false,
    }
}

/// Keep only user and assistant messages from a client-supplied history.
///
/// Tool results are not replayed, so assistant tool calls are stripped too:
/// a call without its result is rejected by chat-completion backends. An
/// assistant message left with no text is dropped.
pub fn inbound_history(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .filter_map(|m| match m {
            Message::User(_) => Some(m),
            Message::Assistant(mut assistant) => {
                if assistant.tool_calls.is_empty() {
                    return Some(Message::Assistant(assistant));
                }
                assistant.tool_calls.clear();
                (!assistant.content.trim().is_empty()).then_some(Message::Assistant(assistant))
            }
            _ => None,
        })
        .collect()
}

/// Drives turns through reasoning, tools, delegation, and provenance.
pub struct Router {
    provider: Arc<dyn ReasoningProvider>,
    context: AgentContext,
    tagger: ProvenanceTagger,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("context", &self.context)
            .finish()
    }
}

impl Router {
    pub fn new(provider: Arc<dyn ReasoningProvider>, context: AgentContext) -> Self {
        let tagger = ProvenanceTagger::new(context.identity.clone());
        Self {
            provider,
            context,
            tagger,
        }
    }

    /// Wire up provider, tool catalog, and peer from process configuration.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let provider = create_provider(&config.reasoning)?;
        let toolkit = builtin::toolkit(&config.builtin)?;
        let catalog = ToolCatalog::from_toolkit(&config.tools, &toolkit)?;
        let delegation = config
            .multi_agent
            .active_endpoint()
            .map(|endpoint| {
                DelegationClient::new(endpoint.clone(), config.multi_agent.timeout).map(|client| {
                    Delegation {
                        client,
                        context_window: config.multi_agent.context_window,
                    }
                })
            })
            .transpose()?;

        info!(
            agent = config.identity.name.as_deref().unwrap_or_default(),
            model = provider.model_id(),
            tools = ?catalog.names(),
            delegation = delegation.as_ref().map(|d| d.client.endpoint().as_str()),
            "router ready"
        );

        let context = AgentContext::builder()
            .identity(config.identity.clone())
            .catalog(catalog)
            .maybe_delegation(delegation)
            .turn(config.turn.clone())
            .generation(config.reasoning.generation.clone())
            .build();
        Ok(Self::new(provider, context))
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    /// Run one turn over `history`.
    ///
    /// Only configuration errors and reasoning failures fail the turn. Tool
    /// failures become error results and delegation failures become a single
    /// apology message.
    pub async fn run_turn(&self, history: Vec<Message>) -> Result<TurnOutcome, ParleyError> {
        let span = tracing::info_span!("turn", turn_id = %uuid::Uuid::new_v4());
        self.run_turn_inner(history).instrument(span).await
    }

    async fn run_turn_inner(&self, history: Vec<Message>) -> Result<TurnOutcome, ParleyError> {
        // INIT
        let history = inbound_history(history);
        debug!(inbound = history.len(), "turn started");
        let mut state = reduce(
            ConversationState::new(vec![Message::system(&self.context.turn.preamble)]),
            history,
        );

        let mut route = Route::Direct;
        let mut passes = 0usize;
        loop {
            if passes >= self.context.turn.max_passes {
                warn!(passes, "reasoning pass limit reached");
                return Err(ParleyError::InvalidState(format!(
                    "turn exceeded {} reasoning passes",
                    self.context.turn.max_passes
                )));
            }
            passes += 1;

            // REASON
            let reply = self.reason(&state).await?;

            // ROUTE_DECISION
            let decision = decide(&reply, passes == 1, self.context.delegation.is_some());
            debug!(pass = passes, decision = decision_name(&decision), "routing");
            state = reduce(state, vec![reply]);

            match decision {
                Decision::Tools(calls) => {
                    // TOOL_DISPATCH, then TOOL_RESUME on the next iteration
                    route = Route::Tools;
                    let results = self.dispatch(&calls).await?;
                    state = reduce(state, results);
                }
                Decision::Discovery => {
                    let (appended, outcome) = self.discover(state.messages()).await;
                    route = outcome;
                    state = reduce(state, appended);
                    break;
                }
                Decision::Finish => break,
            }
        }

        // PROVENANCE
        let tagged = self.tagger.tag_all(state.into_messages());
        // TERMINAL: drop the preamble
        let messages: Vec<Message> = tagged.into_iter().skip(1).collect();

        info!(%route, passes, messages = messages.len(), "turn finished");
        Ok(TurnOutcome {
            messages,
            route,
            passes,
        })
    }

    async fn reason(&self, state: &ConversationState) -> Result<Message, ParleyError> {
        let request = ProviderRequest {
            messages: state.messages().to_vec(),
            tools: self.context.catalog.definitions(),
            settings: self.context.generation.clone(),
        };
        let response = self.provider.generate(&request).await.map_err(|err| {
            warn!(provider = self.provider.provider_name(), error = %err, "reasoning failed");
            ParleyError::reasoning(err)
        })?;
        Ok(response.into_message())
    }

    /// Invoke every call concurrently; results come back in request order.
    async fn dispatch(&self, calls: &[ToolCall]) -> Result<Vec<Message>, ParleyError> {
        if let Some(unknown) = calls.iter().find(|c| self.context.catalog.get(&c.name).is_none()) {
            return Err(ParleyError::Configuration(format!(
                "model requested tool '{}' which is not in the catalog",
                unknown.name
            )));
        }

        debug!(count = calls.len(), tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), "dispatching tools");
        let agent = self.tagger.local_identity();
        let timeout = self.context.turn.tool_timeout;
        join_all(
            calls
                .iter()
                .map(|call| self.context.catalog.invoke(call, agent, timeout)),
        )
        .await
        .into_iter()
        .collect()
    }

    /// Forward the trailing user messages to the peer.
    ///
    /// Never fails: problems are turned into one fallback assistant message.
    async fn discover(&self, history: &[Message]) -> (Vec<Message>, Route) {
        let Some(delegation) = &self.context.delegation else {
            return (Vec::new(), Route::Direct);
        };

        let window = delegation_window(history, delegation.context_window);
        if window.is_empty() {
            warn!("no user message to forward to peer");
            return (
                vec![Message::assistant(NO_REQUEST_TO_FORWARD)],
                Route::DelegationFailed,
            );
        }

        match delegation.client.delegate(&window).await {
            Ok(reply) => {
                info!(endpoint = %delegation.client.endpoint(), received = reply.len(), "peer answered");
                (reply.into_iter().map(mark_remote).collect(), Route::Delegated)
            }
            Err(err) => {
                warn!(endpoint = %delegation.client.endpoint(), error = %err, "delegation failed");
                (
                    vec![Message::assistant(DELEGATION_APOLOGY)],
                    Route::DelegationFailed,
                )
            }
        }
    }
}

fn decision_name(decision: &Decision) -> &'static str {
    match decision {
        Decision::Tools(_) => "tools",
        Decision::Discovery => "discovery",
        Decision::Finish => "finish",
    }
}

//! Convenience re-exports for common use.

pub use crate::adapter::{from_wire, to_wire, WireMessage};
pub use crate::config::{MultiAgentConfig, ParleyConfig};
pub use crate::delegation::{DelegationClient, DelegationError};
pub use crate::engine::{AgentContext, Route, Router, TurnOutcome};
pub use crate::error::{ParleyError, Result};
pub use crate::provenance::ProvenanceTagger;
pub use crate::provider::{ProviderRequest, ProviderResponse, ReasoningProvider};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolCatalog};
pub use crate::types::{AgentIdentity, GenerationSettings, Message, Role, ToolCall};

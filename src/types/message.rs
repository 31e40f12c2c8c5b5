//! Conversation message types.
//!
//! Each role is its own variant so a value can only carry the fields that
//! make sense for it: only assistant messages hold tool calls, only tool
//! messages hold a result payload.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Which agent produced a message.
///
/// Remote peers may assert only part of their identity, so `name` and `did`
/// are optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AgentIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(default)]
    pub remote: bool,
}

impl AgentIdentity {
    /// Identity of the agent running this process.
    pub fn local(name: impl Into<String>, did: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            did: Some(did.into()),
            remote: false,
        }
    }

    /// Same asserted name and did, flagged as produced by a peer.
    pub fn into_remote(self) -> Self {
        Self {
            remote: true,
            ..self
        }
    }
}

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the reasoning capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemMessage {
    pub id: String,
    pub content: String,
    pub provenance: Option<AgentIdentity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    pub provenance: Option<AgentIdentity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantMessage {
    pub id: String,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub provenance: Option<AgentIdentity>,
}

/// Output of one tool invocation, paired with the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolMessage {
    pub id: String,
    pub tool_call_id: String,
    pub content: serde_json::Value,
    pub is_error: bool,
    pub provenance: Option<AgentIdentity>,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

pub(crate) fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(SystemMessage {
            id: new_message_id(),
            content: text.into(),
            provenance: None,
        })
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(UserMessage {
            id: new_message_id(),
            content: text.into(),
            provenance: None,
        })
    }

    /// Create an assistant message without tool calls.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::assistant_with_tool_calls(text, Vec::new())
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant(AssistantMessage {
            id: new_message_id(),
            content: text.into(),
            tool_calls,
            provenance: None,
        })
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        content: serde_json::Value,
        is_error: bool,
    ) -> Self {
        Self::Tool(ToolMessage {
            id: new_message_id(),
            tool_call_id: tool_call_id.into(),
            content,
            is_error,
            provenance: None,
        })
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::System(m) => &m.id,
            Self::User(m) => &m.id,
            Self::Assistant(m) => &m.id,
            Self::Tool(m) => &m.id,
        }
    }

    /// Text content. Tool results are rendered as compact JSON.
    pub fn text(&self) -> String {
        match self {
            Self::System(m) => m.content.clone(),
            Self::User(m) => m.content.clone(),
            Self::Assistant(m) => m.content.clone(),
            Self::Tool(m) => match &m.content {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Tool calls carried by this message (empty unless assistant).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant(m) => m.tool_calls.as_slice(),
            _ => &[],
        }
    }

    pub fn provenance(&self) -> Option<&AgentIdentity> {
        match self {
            Self::System(m) => m.provenance.as_ref(),
            Self::User(m) => m.provenance.as_ref(),
            Self::Assistant(m) => m.provenance.as_ref(),
            Self::Tool(m) => m.provenance.as_ref(),
        }
    }

    /// Return this message with its provenance replaced.
    pub fn with_provenance(mut self, identity: AgentIdentity) -> Self {
        let slot = match &mut self {
            Self::System(m) => &mut m.provenance,
            Self::User(m) => &mut m.provenance,
            Self::Assistant(m) => &mut m.provenance,
            Self::Tool(m) => &mut m.provenance,
        };
        *slot = Some(identity);
        self
    }

    /// Return this message with a specific id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        match &mut self {
            Self::System(m) => m.id = id,
            Self::User(m) => m.id = id,
            Self::Assistant(m) => m.id = id,
            Self::Tool(m) => m.id = id,
        }
        self
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

//! Mapping between the client wire shape and internal [`Message`]s.
//!
//! The same shape is used on the inbound turn endpoint, in turn responses,
//! and on the delegation protocol between peers:
//!
//! ```json
//! {
//!   "id": "…",
//!   "role": "assistant",
//!   "content": "…",
//!   "tool_calls": [{ "id": "call_1", "name": "wallet", "args": {} }],
//!   "annotations": [{ "agent": { "name": "…", "did": "…", "remote": false } }]
//! }
//! ```

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParleyError;
use crate::types::message::new_message_id;
use crate::types::{
    AgentIdentity, AssistantMessage, Message, Role, SystemMessage, ToolCall, ToolMessage,
    UserMessage,
};

/// A message as exchanged with clients and peers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub annotations: Vec<WireAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireToolCall {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "arguments")]
    pub args: serde_json::Value,
}

/// One provenance annotation. Only the first annotation of a message is read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WireAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentIdentity>,
}

impl WireMessage {
    /// Convenience constructor for a plain text message.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: role.to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            annotations: Vec::new(),
        }
    }

    /// The asserted identity, if the message carries one.
    pub fn agent(&self) -> Option<&AgentIdentity> {
        self.annotations.first().and_then(|a| a.agent.as_ref())
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert a wire message into the internal representation.
///
/// A missing id is replaced with a fresh UUID and a missing `tool_call_id`
/// with an empty one. Unknown roles are rejected.
pub fn from_wire(wire: WireMessage) -> Result<Message, ParleyError> {
    let role = Role::from_str(&wire.role)
        .map_err(|_| ParleyError::InvalidArgument(format!("unknown message role '{}'", wire.role)))?;
    let provenance = wire.annotations.into_iter().next().and_then(|a| a.agent);
    let id = wire.id.filter(|id| !id.is_empty()).unwrap_or_else(new_message_id);

    if role != Role::Assistant && !wire.tool_calls.is_empty() {
        tracing::debug!(%role, "dropping tool_calls on non-assistant message");
    }

    Ok(match role {
        Role::System => Message::System(SystemMessage {
            id,
            content: wire.content,
            provenance,
        }),
        Role::User => Message::User(UserMessage {
            id,
            content: wire.content,
            provenance,
        }),
        Role::Assistant => Message::Assistant(AssistantMessage {
            id,
            content: wire.content,
            tool_calls: wire
                .tool_calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.name,
                    arguments: tc.args,
                })
                .collect(),
            provenance,
        }),
        Role::Tool => {
            // Peers may relay tool results without the call id.
            let tool_call_id = wire.tool_call_id.unwrap_or_else(|| {
                tracing::debug!(%id, "tool message without tool_call_id");
                String::new()
            });
            let content = serde_json::from_str(&wire.content)
                .unwrap_or(serde_json::Value::String(wire.content));
            Message::Tool(ToolMessage {
                id,
                tool_call_id,
                content,
                // The wire shape has no error flag; an `error` key is the convention.
                is_error: false,
                provenance,
            })
        }
    })
}

/// Convert an internal message into the wire shape.
pub fn to_wire(message: &Message) -> WireMessage {
    let tool_calls = message
        .tool_calls()
        .iter()
        .map(|tc| WireToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            args: tc.arguments.clone(),
        })
        .collect();
    let tool_call_id = match message {
        Message::Tool(m) => Some(m.tool_call_id.clone()),
        _ => None,
    };
    let annotations = message
        .provenance()
        .map(|agent| {
            vec![WireAnnotation {
                agent: Some(agent.clone()),
            }]
        })
        .unwrap_or_default();

    WireMessage {
        id: Some(message.id().to_string()),
        role: message.role().to_string(),
        content: message.text(),
        tool_calls,
        tool_call_id,
        annotations,
    }
}

/// Convert a batch of wire messages, failing on the first invalid one.
pub fn from_wire_all(wire: Vec<WireMessage>) -> Result<Vec<Message>, ParleyError> {
    wire.into_iter().map(from_wire).collect()
}

pub fn to_wire_all(messages: &[Message]) -> Vec<WireMessage> {
    messages.iter().map(to_wire).collect()
}

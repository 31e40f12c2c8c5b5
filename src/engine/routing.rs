//! Routing decisions and delegation window selection.

use crate::types::{Message, ToolCall};

/// Tag the reasoning capability emits when it cannot complete a request.
pub const DISCOVERY_SENTINEL: &str = "<agent_discovery>";

/// Where the router goes after a reasoning pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Dispatch these calls, then reason again.
    Tools(Vec<ToolCall>),
    /// Forward the request to a peer agent.
    Discovery,
    /// Tag and return.
    Finish,
}

/// Whether assistant text asks for delegation.
pub fn requests_discovery(text: &str) -> bool {
    text.contains(DISCOVERY_SENTINEL)
}

/// Decide the next stage from the latest assistant reply.
///
/// Tool calls always win. Delegation is only considered on the first pass
/// and only when a peer is configured.
pub fn decide(reply: &Message, first_pass: bool, delegation_available: bool) -> Decision {
    let calls = reply.tool_calls();
    if !calls.is_empty() {
        return Decision::Tools(calls.to_vec());
    }
    if first_pass && delegation_available && requests_discovery(&reply.text()) {
        return Decision::Discovery;
    }
    Decision::Finish
}

/// The trailing `k` user messages of `history`, oldest first.
pub fn delegation_window(history: &[Message], k: usize) -> Vec<Message> {
    let users: Vec<&Message> = history.iter().filter(|m| m.is_user()).collect();
    let start = users.len().saturating_sub(k);
    users[start..].iter().map(|m| (*m).clone()).collect()
}

//! Delegation failures.

use thiserror::Error;

/// Why a call to a peer agent failed.
///
/// Never leaves the router: every variant is recovered by appending a single
/// apology message to the conversation.
#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("peer unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("peer did not answer within {0}ms")]
    Timeout(u64),

    #[error("peer answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("peer reply contained no messages")]
    EmptyReply,

    #[error("peer reply is malformed: {0}")]
    Malformed(String),
}

impl DelegationError {
    /// Classify a transport error, separating timeouts from other failures.
    pub fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else {
            Self::Network(err)
        }
    }
}

//! Remote delegation client.
//!
//! Forwards a window of the conversation to a peer agent's turn endpoint and
//! converts the peer's reply back into messages. The peer speaks the same
//! wire shape as [`crate::adapter`], so two parley processes can delegate to
//! each other.

pub mod error;

pub use error::DelegationError;

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{from_wire, to_wire_all, WireMessage};
use crate::error::ParleyError;
use crate::provider::http::build_client;
use crate::types::Message;
use crate::util::timeout::millis;

/// Payload exchanged with a peer in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DelegationPayload {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// HTTP client bound to one peer endpoint.
#[derive(Debug, Clone)]
pub struct DelegationClient {
    endpoint: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl DelegationClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ParleyError> {
        Ok(Self {
            endpoint,
            client: build_client(timeout)?,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `window` to the peer and return its reply, in order.
    ///
    /// A non-2xx status, an unparseable body, an empty message array, or a
    /// reply message the adapter rejects are all errors.
    pub async fn delegate(&self, window: &[Message]) -> Result<Vec<Message>, DelegationError> {
        let timeout_ms = millis(self.timeout);
        let payload = DelegationPayload {
            messages: to_wire_all(window),
        };

        debug!(endpoint = %self.endpoint, forwarded = window.len(), "delegating to peer");

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DelegationError::from_transport(e, timeout_ms))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DelegationError::from_transport(e, timeout_ms))?;
        if !status.is_success() {
            return Err(DelegationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: DelegationPayload =
            serde_json::from_str(&body).map_err(|e| DelegationError::Malformed(e.to_string()))?;
        if reply.messages.is_empty() {
            return Err(DelegationError::EmptyReply);
        }

        let messages = reply
            .messages
            .into_iter()
            .map(|wire| from_wire(wire).map_err(|e| DelegationError::Malformed(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(endpoint = %self.endpoint, received = messages.len(), "peer replied");
        Ok(messages)
    }
}

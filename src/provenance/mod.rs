//! Provenance tagging.
//!
//! Every message that leaves a turn says which agent produced it. Messages
//! with no identity are stamped with the local agent; messages relayed from
//! a peer keep whatever identity the peer asserted and are flagged remote.

use crate::types::{AgentIdentity, Message};

/// Stamps messages with the local agent identity.
///
/// Built once from process configuration and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceTagger {
    local: AgentIdentity,
}

impl ProvenanceTagger {
    pub fn new(local: AgentIdentity) -> Self {
        Self {
            local: AgentIdentity {
                remote: false,
                ..local
            },
        }
    }

    pub fn local_identity(&self) -> &AgentIdentity {
        &self.local
    }

    /// Attach the local identity unless the message already has one.
    ///
    /// Idempotent: tagging an already-tagged message returns it unchanged.
    pub fn tag(&self, message: Message) -> Message {
        if message.provenance().is_some() {
            return message;
        }
        message.with_provenance(self.local.clone())
    }

    /// Tag every message lacking identity metadata.
    pub fn tag_all(&self, messages: Vec<Message>) -> Vec<Message> {
        messages.into_iter().map(|m| self.tag(m)).collect()
    }
}

/// Flag a message received from a peer as remote.
///
/// Only the `remote` flag changes; an asserted name and did are kept as-is.
/// A peer message without identity gets an identity carrying only the flag.
pub fn mark_remote(message: Message) -> Message {
    let identity = message.provenance().cloned().unwrap_or_default().into_remote();
    message.with_provenance(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tagger() -> ProvenanceTagger {
        ProvenanceTagger::new(AgentIdentity::local("Parley", "did:web:local"))
    }

    #[test]
    fn untagged_messages_get_local_identity() {
        let tagged = tagger().tag(Message::assistant("hello"));
        assert_eq!(
            tagged.provenance(),
            Some(&AgentIdentity::local("Parley", "did:web:local"))
        );
    }

    #[test]
    fn tagging_twice_equals_tagging_once() {
        let t = tagger();
        let once = t.tag(Message::user("hi"));
        let twice = t.tag(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_identity_is_never_overwritten_by_tag() {
        let peer = AgentIdentity {
            name: Some("peer".into()),
            did: Some("did:web:peer".into()),
            remote: true,
        };
        let msg = Message::assistant("from afar").with_provenance(peer.clone());
        assert_eq!(tagger().tag(msg).provenance(), Some(&peer));
    }

    #[test]
    fn mark_remote_keeps_asserted_name_and_did() {
        let asserted = AgentIdentity::local("peer", "did:web:peer");
        let msg = mark_remote(Message::assistant("x").with_provenance(asserted));
        let identity = msg.provenance().unwrap();
        assert!(identity.remote);
        assert_eq!(identity.name.as_deref(), Some("peer"));
        assert_eq!(identity.did.as_deref(), Some("did:web:peer"));
    }

    #[test]
    fn mark_remote_without_identity_sets_only_flag() {
        let msg = mark_remote(Message::assistant("x"));
        assert_eq!(
            msg.provenance(),
            Some(&AgentIdentity {
                name: None,
                did: None,
                remote: true
            })
        );
        // A remote-marked message is not re-stamped as local afterwards.
        assert!(tagger().tag(msg).provenance().unwrap().remote);
    }

    #[test]
    fn tagger_forces_local_flag_off() {
        let t = ProvenanceTagger::new(AgentIdentity::local("a", "b").into_remote());
        assert!(!t.local_identity().remote);
    }
}

//! Delegation to a peer agent, with the peer played by a mock HTTP server.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use parley::engine::{Route, DELEGATION_APOLOGY, NO_REQUEST_TO_FORWARD};
use parley::types::{AgentIdentity, Message};

fn peer_reply() -> Value {
    json!({
        "messages": [
            { "id": "p1", "role": "assistant", "content": "It is sunny.",
              "annotations": [{ "agent": { "name": "Weather", "did": "did:web:weather", "remote": false } }] },
            { "id": "p2", "role": "assistant", "content": "Anything else?" },
        ]
    })
}

async fn peer_answering(template: ResponseTemplate, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/agents"))
        .respond_with(template)
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn peer_is_not_called_without_sentinel() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 0).await;
    let provider = ScriptedProvider::new();
    provider.queue_text("I can answer that myself.");
    let router = delegating_router(provider, &peer, 3);

    let outcome = router.run_turn(vec![Message::user("hi")]).await.unwrap();

    assert_eq!(outcome.route, Route::Direct);
    assert_eq!(outcome.messages.len(), 2);
}

#[tokio::test]
async fn peer_reply_is_appended_in_order_and_marked_remote() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 1).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider.clone(), &peer, 3);

    let outcome = router.run_turn(vec![Message::user("weather?")]).await.unwrap();

    assert_eq!(outcome.route, Route::Delegated);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(
        texts(&outcome.messages),
        vec!["weather?", SENTINEL_REPLY, "It is sunny.", "Anything else?"]
    );

    assert_eq!(
        outcome.messages[2].provenance(),
        Some(&AgentIdentity {
            name: Some("Weather".into()),
            did: Some("did:web:weather".into()),
            remote: true,
        })
    );
    assert_eq!(
        outcome.messages[3].provenance(),
        Some(&AgentIdentity {
            name: None,
            did: None,
            remote: true,
        })
    );
    // Local messages stay local.
    assert_eq!(outcome.messages[1].provenance(), Some(&local_identity()));
}

#[tokio::test]
async fn peer_tool_results_without_call_id_are_kept() {
    let reply = json!({
        "messages": [
            { "role": "user", "content": "balance?", "annotations": [] },
            { "role": "assistant", "content": "",
              "tool_calls": [{ "id": "call_1", "name": "wallet", "args": {} }],
              "annotations": [{ "agent": { "name": "Wallet", "did": "did:web:wallet" } }] },
            { "role": "tool", "content": "{\"balance\":\"10 usdc\"}",
              "annotations": [{ "agent": { "name": "Wallet", "did": "did:web:wallet" } }] },
            { "role": "assistant", "content": "10 usdc" },
        ]
    });
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(reply), 1).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider, &peer, 3);

    let outcome = router.run_turn(vec![Message::user("balance?")]).await.unwrap();

    assert_eq!(outcome.route, Route::Delegated);
    assert_eq!(outcome.messages.len(), 6);
    let Message::Tool(result) = &outcome.messages[4] else { panic!("expected tool result") };
    assert_eq!(result.tool_call_id, "");
    assert_eq!(result.content["balance"], "10 usdc");
    assert!(outcome.messages[2..].iter().all(|m| m.provenance().unwrap().remote));
    assert_eq!(outcome.messages.last().unwrap().text(), "10 usdc");
}

#[tokio::test]
async fn peer_failure_becomes_single_local_apology() {
    let peer = peer_answering(ResponseTemplate::new(502).set_body_string("bad gateway"), 1).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider, &peer, 3);

    let outcome = router.run_turn(vec![Message::user("weather?")]).await.unwrap();

    assert_eq!(outcome.route, Route::DelegationFailed);
    assert_eq!(outcome.messages.len(), 3);
    let apology = outcome.messages.last().unwrap();
    assert_eq!(apology.text(), DELEGATION_APOLOGY);
    assert_eq!(apology.provenance(), Some(&local_identity()));
    assert!(outcome.messages.iter().all(|m| !m.provenance().unwrap().remote));
}

#[tokio::test]
async fn empty_peer_reply_is_a_failure() {
    let peer = peer_answering(
        ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })),
        1,
    )
    .await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider, &peer, 3);

    let outcome = router.run_turn(vec![Message::user("weather?")]).await.unwrap();
    assert_eq!(outcome.messages.last().unwrap().text(), DELEGATION_APOLOGY);
}

#[tokio::test]
async fn only_trailing_user_messages_are_forwarded() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 1).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider, &peer, 2);

    let history = vec![
        Message::user("one").with_id("u1"),
        Message::assistant("reply one"),
        Message::user("two").with_id("u2"),
        Message::assistant("reply two"),
        Message::user("three").with_id("u3"),
    ];
    router.run_turn(history).await.unwrap();

    let received = peer.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let forwarded = body["messages"].as_array().unwrap();
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded[0]["id"], "u2");
    assert_eq!(forwarded[1]["id"], "u3");
    assert!(forwarded.iter().all(|m| m["role"] == "user"));
}

#[tokio::test]
async fn no_user_message_means_no_peer_call() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 0).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY);
    let router = delegating_router(provider, &peer, 3);

    let outcome = router
        .run_turn(vec![Message::assistant("How can I help?")])
        .await
        .unwrap();

    assert_eq!(outcome.route, Route::DelegationFailed);
    assert_eq!(outcome.messages.last().unwrap().text(), NO_REQUEST_TO_FORWARD);
}

#[tokio::test]
async fn delegation_is_not_reachable_after_tools() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 0).await;
    let provider = ScriptedProvider::new();
    provider
        .queue_tool_calls(&[("c1", "fast_echo", json!({ "value": "v" }))])
        .queue_text(SENTINEL_REPLY);

    let endpoint = reqwest::Url::parse(&format!("{}/api/chat/agents", peer.uri())).unwrap();
    let context = parley::engine::AgentContext::builder()
        .identity(local_identity())
        .catalog(catalog(vec![echo_tool("fast_echo", Duration::ZERO)]))
        .delegation(parley::engine::Delegation {
            client: parley::delegation::DelegationClient::new(endpoint, Duration::from_secs(5))
                .unwrap(),
            context_window: 3,
        })
        .build();
    let router = parley::engine::Router::new(provider, context);

    let outcome = router.run_turn(vec![Message::user("go")]).await.unwrap();

    assert_eq!(outcome.route, Route::Tools);
    assert_eq!(outcome.messages.last().unwrap().text(), SENTINEL_REPLY);
}

#[tokio::test]
async fn retagging_a_finished_turn_changes_nothing() {
    let peer = peer_answering(ResponseTemplate::new(200).set_body_json(peer_reply()), 1).await;
    let provider = ScriptedProvider::new();
    provider.queue_text(SENTINEL_REPLY).queue_text("follow-up");
    let router = delegating_router(provider, &peer, 3);

    let first = router.run_turn(vec![Message::user("weather?")]).await.unwrap();
    let second = router.run_turn(first.messages.clone()).await.unwrap();

    assert_eq!(&second.messages[..first.messages.len()], first.messages.as_slice());
}

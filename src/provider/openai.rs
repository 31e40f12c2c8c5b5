//! OpenAI Chat Completions API provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ParleyError;
use crate::types::{Message, ToolCall};

use super::http::{bearer_headers, build_client, status_to_error};
use super::{ProviderRequest, ProviderResponse, ReasoningProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, ParleyError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(REQUEST_TIMEOUT)?,
        })
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_openai).collect();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert("messages".into(), messages.into());

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = settings.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = settings.user {
            body.insert("user".into(), user.clone().into());
        }

        if !request.tools.is_empty() {
            let tool_defs: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body.insert("tools".into(), tool_defs.into());
        }

        Value::Object(body)
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ParleyError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, messages = request.messages.len(), tools = request.tools.len(), "OpenAI generate");

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ParleyError::api(status, "No choices in OpenAI response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(Value::String(tc.function.arguments)),
            })
            .collect();

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

fn message_to_openai(msg: &Message) -> Value {
    match msg {
        Message::System(m) => json!({ "role": "system", "content": m.content }),
        Message::User(m) => json!({ "role": "user", "content": m.content }),
        Message::Assistant(m) if m.tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": m.content })
        }
        Message::Assistant(m) => {
            let tool_calls: Vec<Value> = m
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            let content = if m.content.is_empty() {
                Value::Null
            } else {
                Value::String(m.content.clone())
            };
            json!({ "role": "assistant", "content": content, "tool_calls": tool_calls })
        }
        Message::Tool(m) => json!({
            "role": "tool",
            "tool_call_id": m.tool_call_id,
            "content": msg.text(),
        }),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDefinition;
    use crate::types::GenerationSettings;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new("gpt-4o", "sk-test", Some(format!("{}/v1/", server.uri()))).unwrap()
    }

    #[test]
    fn assistant_tool_calls_are_sent_as_function_calls() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".into(),
                name: "wallet".into(),
                arguments: json!({ "limit": 2 }),
            }],
        );
        assert_eq!(
            message_to_openai(&msg),
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "wallet", "arguments": "{\"limit\":2}" },
                }],
            })
        );
    }

    #[test]
    fn tool_results_are_sent_as_json_text() {
        let msg = Message::tool_result("call_1", json!({ "ok": true }), false);
        assert_eq!(
            message_to_openai(&msg),
            json!({ "role": "tool", "tool_call_id": "call_1", "content": "{\"ok\":true}" })
        );
    }

    #[tokio::test]
    async fn generate_parses_text_and_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 0.0,
                "tools": [{ "type": "function", "function": { "name": "wallet" } }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            { "id": "call_a", "type": "function", "function": { "name": "wallet", "arguments": "{}" } },
                            { "id": "call_b", "type": "function", "function": { "name": "wallet", "arguments": "not json" } },
                        ],
                    },
                    "finish_reason": "tool_calls",
                }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ProviderRequest {
            messages: vec![Message::user("what's my balance?")],
            tools: vec![ToolDefinition {
                name: "wallet".into(),
                description: "Wallet".into(),
                parameters: json!({ "type": "object", "properties": {} }),
            }],
            settings: GenerationSettings::builder().temperature(0.0).build(),
        };
        let response = provider(&server).generate(&request).await.unwrap();

        assert_eq!(response.text, "");
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments, json!({}));
        assert_eq!(response.tool_calls[1].arguments, json!("not json"));
    }

    #[tokio::test]
    async fn error_status_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": { "message": "bad key" } })),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&ProviderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Authentication(ref m) if m == "bad key"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&ProviderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Api { status: 200, .. }));
    }
}

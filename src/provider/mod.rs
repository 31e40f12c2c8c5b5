//! Reasoning capability seam and its HTTP implementation.
//!
//! The engine only orchestrates calls to a [`ReasoningProvider`]; it never
//! prompts or samples itself. Tests swap in scripted providers.

pub mod http;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ReasoningSettings;
use crate::error::ParleyError;
use crate::tools::ToolDefinition;
use crate::types::{GenerationSettings, Message, ToolCall};

/// One reasoning call: the ordered history plus the active tool catalog.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub settings: GenerationSettings,
}

/// The single assistant turn produced by a reasoning call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Convert into the assistant message appended to the conversation.
    pub fn into_message(self) -> Message {
        Message::assistant_with_tool_calls(self.text, self.tool_calls)
    }
}

/// Core trait implemented by reasoning backends.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Produce exactly one assistant turn for `request`.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ParleyError>;
}

/// Create the configured reasoning backend.
pub fn create_provider(
    settings: &ReasoningSettings,
) -> Result<Arc<dyn ReasoningProvider>, ParleyError> {
    if settings.api_key.is_empty() {
        return Err(ParleyError::Configuration("Missing OPENAI_API_KEY".into()));
    }
    Ok(Arc::new(openai::OpenAiProvider::new(
        settings.model.clone(),
        settings.api_key.clone(),
        settings.base_url.clone(),
    )?))
}

//! `TextGenerator` backed by an OpenAI-compatible chat completions endpoint.
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use tutor_core::config::GenerationSettings;
use tutor_core::traits::TextGenerator;
use tutor_core::types::{ChatMessage, CompletionRequest, Role};
use tutor_core::{Error, Result};

pub struct ChatClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatClient {
    /// Reads the API key from the environment variable named in `settings`.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| Error::InvalidConfig(format!("{} must be set to call the generation service", settings.api_key_env)))?;
        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(&settings.api_base);
        Ok(Self::new(Client::with_config(config), &settings.model))
    }

    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }

    fn build_request(&self, request: &CompletionRequest) -> std::result::Result<CreateChatCompletionRequest, OpenAIError> {
        let messages = request.messages.iter().map(to_openai_message).collect::<std::result::Result<Vec<_>, _>>()?;
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
    }
}

fn to_openai_message(message: &ChatMessage) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessage::from(message.content.clone()).into(),
        Role::User => ChatCompletionRequestUserMessage::from(message.content.clone()).into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()?
            .into(),
    })
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self
            .build_request(request)
            .map_err(|e| Error::Collaborator(format!("building chat request: {e}")))?;
        debug!(model = %self.model, messages = request.messages.len(), "sending chat completion");
        let response = self.client.chat().create(body).await.map_err(|e| {
            warn!(error = %e, "chat completion failed");
            Error::Collaborator(e.to_string())
        })?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::MalformedGenerationOutput("completion has no content".into()))
    }
}

use anyhow::Result;
use async_openai::{
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageArgs,
        CreateChatCompletionRequestArgs, CreateCompletionRequestArgs, CreateEmbeddingRequestArgs,
        Role as OpenAIRole,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use futures::future;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    config::{Endpoint, OpenAIConfig},
    llm::{LanguageModel, Message, Role},
    vector::Embedder,
};

pub struct OpenAI {
    client: Arc<Client>,
    config: OpenAIConfig,
}

impl OpenAI {
    #[must_use]
    pub fn new(config: OpenAIConfig) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(60)))
            .build();

        let mut client = Client::new()
            .with_api_key(config.api_key.clone())
            .with_backoff(backoff);
        if let Some(api_base) = &config.api_base {
            client = client.with_api_base(api_base.clone());
        }

        Self {
            client: Arc::new(client),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Sends a conversation to the Chat Completions API.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Chat API returns an error or no choices.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let messages = messages
            .iter()
            .map(|message| {
                ChatCompletionRequestMessageArgs::default()
                    .role(to_openai_role(message.role))
                    .content(message.content.clone())
                    .build()
            })
            .collect::<Result<Vec<ChatCompletionRequestMessage>, _>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(self.config.model.clone())
            .temperature(self.config.temperature)
            .messages(messages);
        if let Some(max_tokens) = self.config.max_tokens {
            request.max_tokens(max_tokens);
        }

        let response = self.client.chat().create(request.build()?).await?;
        debug!(model = %self.config.model, usage = ?response.usage, "chat completion");

        Ok(response
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("Could not find chat completion"))?
            .message
            .content
            .clone())
    }

    /// Sends a raw prompt to the legacy Completions API.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Completions API returns an error or no choices.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CreateCompletionRequestArgs::default()
            .model(self.config.model.clone())
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens.unwrap_or(700))
            .prompt(prompt)
            .build()?;

        let response = self.client.completions().create(request).await?;
        debug!(model = %self.config.model, "completion");

        Ok(response
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("Could not find completion"))?
            .text
            .clone())
    }

    /// Embeds a string into a vector.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Embeddings API returns an error.
    pub async fn raw_embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.config.embedding_model.clone())
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        Ok(response
            .data
            .first()
            .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))?
            .embedding
            .clone())
    }

    /// Embeds every text concurrently, preserving order.
    ///
    /// # Errors
    ///
    /// This function will return an error if any Embeddings API call fails.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut responses = Vec::with_capacity(texts.len());

        for text in texts {
            let client = self.client.clone();
            let request = CreateEmbeddingRequestArgs::default()
                .model(self.config.embedding_model.clone())
                .input(text.as_str())
                .build()?;

            responses.push(tokio::spawn(async move {
                client.embeddings().create(request).await
            }));
        }

        let responses = future::join_all(responses).await;

        let mut vectors = Vec::with_capacity(texts.len());
        for response in responses {
            let response = response??;

            vectors.push(
                response
                    .data
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))?
                    .embedding
                    .clone(),
            );
        }

        debug!("Embedded {} texts", vectors.len());

        Ok(vectors)
    }
}

const fn to_openai_role(role: Role) -> OpenAIRole {
    match role {
        Role::System => OpenAIRole::System,
        Role::User => OpenAIRole::User,
        Role::Assistant => OpenAIRole::Assistant,
    }
}

#[async_trait]
impl LanguageModel for OpenAI {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        match self.config.endpoint {
            Endpoint::Chat => self.chat(messages).await,
            Endpoint::Completion => {
                let prompt = messages
                    .iter()
                    .map(|message| message.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");

                self.complete(&prompt).await
            }
        }
    }
}

#[async_trait]
impl Embedder for OpenAI {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.raw_embed(text).await
    }
}

use std::fmt;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_COMPLETION_MODEL: &str = "text-davinci-003";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Which OpenAI API a model is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    #[default]
    Chat,
    Completion,
}

/// Everything needed to talk to OpenAI. Nothing is read from the environment here.
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u16>,
    pub endpoint: Endpoint,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
            model: DEFAULT_CHAT_MODEL.to_owned(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
            temperature: 0.0,
            max_tokens: None,
            endpoint: Endpoint::Chat,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u16) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Switches to the legacy completions API, defaulting the model to match.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        if endpoint == Endpoint::Completion && self.model == DEFAULT_CHAT_MODEL {
            self.model = DEFAULT_COMPLETION_MODEL.to_owned();
        }

        self.endpoint = endpoint;
        self
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_owned(),
            collection: collection.into(),
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Anything that turns a conversation into a single text reply.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a reply to the given conversation.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the backing service fails.
    async fn generate(&self, messages: &[Message]) -> Result<String>;

    /// Generates a reply to a single user prompt.
    ///
    /// # Errors
    ///
    /// Same as [`LanguageModel::generate`].
    async fn predict(&self, prompt: &str) -> Result<String> {
        self.generate(&[Message::user(prompt)]).await
    }
}

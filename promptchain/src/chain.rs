use anyhow::{anyhow, Result};
use map_macro::map;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::{
    llm::LanguageModel,
    parser::OutputParser,
    pipeline::{Step, Values},
    prompt::{render_value, ChatPromptTemplate},
};

const DEFAULT_OUTPUT_KEY: &str = "text";

/// A prompt template bound to a model: render, generate, name the reply.
#[derive(Clone)]
pub struct LlmChain {
    model: Arc<dyn LanguageModel>,
    prompt: ChatPromptTemplate,
    output_key: String,
}

impl LlmChain {
    pub fn new(model: Arc<dyn LanguageModel>, prompt: impl Into<ChatPromptTemplate>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            output_key: DEFAULT_OUTPUT_KEY.to_owned(),
        }
    }

    #[must_use]
    pub fn with_output_key(mut self, output_key: impl Into<String>) -> Self {
        self.output_key = output_key.into();
        self
    }

    #[must_use]
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    #[must_use]
    pub fn input_variables(&self) -> Vec<String> {
        self.prompt.input_variables()
    }

    /// Renders the prompt and returns the model's reply, trimmed.
    ///
    /// # Errors
    ///
    /// Fails if a template variable is missing or the model call fails.
    pub async fn run(&self, values: &Values) -> Result<String> {
        let messages = self.prompt.format_messages(values)?;
        let reply = self.model.generate(&messages).await?;

        debug!(output_key = %self.output_key, "llm chain replied with {} chars", reply.len());

        Ok(reply.trim().to_owned())
    }

    /// Like [`LlmChain::run`], but returns the reply under the chain's output key.
    ///
    /// # Errors
    ///
    /// Same as [`LlmChain::run`].
    pub async fn call(&self, values: &Values) -> Result<Values> {
        let reply = self.run(values).await?;

        Ok(map! { self.output_key.clone() => Value::String(reply) })
    }

    /// Wraps the chain as a pipeline step reading its template variables.
    #[must_use]
    pub fn into_step(self, name: impl Into<String>) -> Step {
        let inputs = self.input_variables();
        let outputs = [self.output_key.clone()];
        let chain = Arc::new(self);

        Step::new(name, inputs, outputs, move |values| {
            let chain = chain.clone();
            async move { chain.call(&values).await }
        })
    }
}

/// A step that parses the text under `input_key` and stores the record under `output_key`.
pub fn parse_step<P>(
    name: impl Into<String>,
    parser: P,
    input_key: impl Into<String>,
    output_key: impl Into<String>,
) -> Step
where
    P: OutputParser + 'static,
    P::Output: Serialize,
{
    let input_key = input_key.into();
    let output_key = output_key.into();
    let parser = Arc::new(parser);

    Step::new(
        name,
        [input_key.clone()],
        [output_key.clone()],
        move |values| {
            let result = values
                .get(&input_key)
                .ok_or_else(|| anyhow!("No \"{input_key}\" to parse"))
                .and_then(|text| Ok(parser.parse(&render_value(text))?))
                .and_then(|record| Ok(serde_json::to_value(record)?))
                .map(|record| map! { output_key.clone() => record });

            async move { result }
        },
    )
}

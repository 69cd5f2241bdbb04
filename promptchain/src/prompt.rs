use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::{
    error::PromptError,
    llm::{Message, Role},
    pipeline::Values,
};

lazy_static! {
    static ref VARIABLE_RE: Regex = Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// A text template with `{name}` placeholders. `{{` and `}}` render as literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();

        let mut variables: Vec<String> = Vec::new();
        for captures in VARIABLE_RE.captures_iter(&template) {
            if let Some(name) = captures.get(1) {
                if !variables.iter().any(|v| v == name.as_str()) {
                    variables.push(name.as_str().to_owned());
                }
            }
        }

        Self {
            template,
            variables,
            partials: HashMap::new(),
        }
    }

    /// Pre-fills a variable, removing it from [`PromptTemplate::input_variables`].
    #[must_use]
    pub fn with_partial(mut self, name: &str, value: impl Into<String>) -> Self {
        self.partials.insert(name.to_owned(), value.into());
        self
    }

    /// Variables that must be supplied to [`PromptTemplate::format`], in order of appearance.
    #[must_use]
    pub fn input_variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|name| !self.partials.contains_key(*name))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the template. Values that aren't strings are rendered as JSON.
    ///
    /// # Errors
    ///
    /// Fails with [`PromptError::MissingVariable`] if a placeholder has no value.
    pub fn format(&self, values: &Values) -> Result<String, PromptError> {
        if let Some(missing) = self
            .input_variables()
            .into_iter()
            .find(|name| !values.contains_key(name))
        {
            return Err(PromptError::MissingVariable(missing));
        }

        let rendered = VARIABLE_RE.replace_all(&self.template, |captures: &Captures<'_>| {
            let Some(name) = captures.get(1) else {
                return captures[0][..1].to_owned();
            };

            if let Some(partial) = self.partials.get(name.as_str()) {
                return partial.clone();
            }

            values.get(name.as_str()).map_or_else(String::new, render_value)
        });

        Ok(rendered.into_owned())
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// A list of message templates rendered into a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    messages: Vec<(Role, PromptTemplate)>,
}

impl ChatPromptTemplate {
    /// A conversation made of a single user message.
    #[must_use]
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            messages: vec![(Role::User, PromptTemplate::new(template))],
        }
    }

    #[must_use]
    pub fn from_messages(messages: Vec<(Role, PromptTemplate)>) -> Self {
        Self { messages }
    }

    /// Pre-fills a variable in every message template.
    #[must_use]
    pub fn with_partial(self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();

        Self {
            messages: self
                .messages
                .into_iter()
                .map(|(role, template)| (role, template.with_partial(name, value.clone())))
                .collect(),
        }
    }

    #[must_use]
    pub fn input_variables(&self) -> Vec<String> {
        let mut variables: Vec<String> = Vec::new();

        for (_, template) in &self.messages {
            for name in template.input_variables() {
                if !variables.contains(&name) {
                    variables.push(name);
                }
            }
        }

        variables
    }

    /// Renders every message template.
    ///
    /// # Errors
    ///
    /// Fails with [`PromptError::MissingVariable`] if a placeholder has no value.
    pub fn format_messages(&self, values: &Values) -> Result<Vec<Message>, PromptError> {
        self.messages
            .iter()
            .map(|(role, template)| {
                Ok(Message {
                    role: *role,
                    content: template.format(values)?,
                })
            })
            .collect()
    }
}

impl From<PromptTemplate> for ChatPromptTemplate {
    fn from(template: PromptTemplate) -> Self {
        Self {
            messages: vec![(Role::User, template)],
        }
    }
}

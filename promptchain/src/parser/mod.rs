mod fence;

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{any::type_name, marker::PhantomData};
use validator::Validate;

use crate::{error::SchemaValidationError, pipeline::Values};

pub use fence::extract_json;

/// Turns raw model text into a typed value.
pub trait OutputParser: Send + Sync {
    type Output;

    /// Instructions to append to a prompt so the model replies in a parseable shape.
    fn format_instructions(&self) -> String;

    /// Parses a model reply.
    ///
    /// # Errors
    ///
    /// Fails with a [`SchemaValidationError`] if the reply doesn't match the expected shape.
    fn parse(&self, text: &str) -> Result<Self::Output, SchemaValidationError>;
}

fn parse_object(text: &str) -> Result<Map<String, Value>, SchemaValidationError> {
    let json = extract_json(text).ok_or(SchemaValidationError::NoJson)?;

    match serde_json::from_str(json)? {
        Value::Object(object) => Ok(object),
        _ => Err(SchemaValidationError::NoJson),
    }
}

fn record_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// One named field the model is asked to fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    pub name: String,
    pub description: String,
    pub kind: String,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: "string".to_owned(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Asks for a flat JSON object with the given keys and checks they are all present.
#[derive(Debug, Clone)]
pub struct StructuredOutputParser {
    schemas: Vec<ResponseSchema>,
}

impl StructuredOutputParser {
    #[must_use]
    pub fn from_response_schemas(schemas: Vec<ResponseSchema>) -> Self {
        Self { schemas }
    }

    /// Parses the reply and deserializes it into a record.
    ///
    /// # Errors
    ///
    /// Fails if a key is missing or the values don't fit `T`.
    pub fn parse_into<T: DeserializeOwned>(&self, text: &str) -> Result<T, SchemaValidationError> {
        let values = self.parse(text)?;

        serde_json::from_value(Value::Object(values.into_iter().collect())).map_err(|err| {
            SchemaValidationError::InvalidRecord {
                record: record_name::<T>(),
                message: err.to_string(),
            }
        })
    }
}

impl OutputParser for StructuredOutputParser {
    type Output = Values;

    fn format_instructions(&self) -> String {
        let fields = self
            .schemas
            .iter()
            .map(|schema| {
                format!(
                    "\t\"{}\": {}  // {}",
                    schema.name, schema.kind, schema.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "The output should be a markdown code snippet formatted in the following schema, including the leading and trailing \"```json\" and \"```\":\n\n```json\n{{\n{fields}\n}}\n```"
        )
    }

    fn parse(&self, text: &str) -> Result<Values, SchemaValidationError> {
        let mut object = parse_object(text)?;

        self.schemas
            .iter()
            .map(|schema| {
                object
                    .remove(&schema.name)
                    .map(|value| (schema.name.clone(), value))
                    .ok_or_else(|| SchemaValidationError::MissingKey(schema.name.clone()))
            })
            .collect()
    }
}

/// Parses a reply into `T`, describing `T` to the model through its JSON schema
/// and enforcing its `validator` rules.
pub struct JsonOutputParser<T> {
    record: PhantomData<fn() -> T>,
}

impl<T> JsonOutputParser<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            record: PhantomData,
        }
    }
}

impl<T> Default for JsonOutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonOutputParser<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> OutputParser for JsonOutputParser<T>
where
    T: JsonSchema + DeserializeOwned + Validate,
{
    type Output = T;

    fn format_instructions(&self) -> String {
        let mut schema = serde_json::to_value(schema_for!(T)).unwrap_or_default();
        if let Value::Object(object) = &mut schema {
            object.remove("$schema");
            object.remove("title");
        }

        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n\
            As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
            the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\n\
            Here is the output schema:\n```\n{schema}\n```"
        )
    }

    fn parse(&self, text: &str) -> Result<T, SchemaValidationError> {
        let object = parse_object(text)?;

        let record: T = serde_json::from_value(Value::Object(object)).map_err(|err| {
            SchemaValidationError::InvalidRecord {
                record: record_name::<T>(),
                message: err.to_string(),
            }
        })?;
        record.validate()?;

        Ok(record)
    }
}

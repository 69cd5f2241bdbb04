use thiserror::Error;

/// Step name reported when a declared initial input is missing and no step reads it.
pub const INPUTS: &str = "<inputs>";
/// Step name reported when a declared final output is never produced.
pub const OUTPUTS: &str = "<outputs>";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing input \"{key}\" required by step \"{step}\".")]
    MissingInput { key: String, step: String },

    #[error("Step \"{step}\" broke its output contract (missing: {missing:?}, unexpected: {unexpected:?}).")]
    ContractViolation {
        step: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Step \"{step}\" failed: {source}")]
    StepExecution {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Output \"{key}\" of step \"{step}\" would overwrite an existing value.")]
    DuplicateOutput { key: String, step: String },
}

impl PipelineError {
    /// The step the error is attributed to.
    #[must_use]
    pub fn step(&self) -> &str {
        match self {
            Self::MissingInput { step, .. }
            | Self::ContractViolation { step, .. }
            | Self::StepExecution { step, .. }
            | Self::DuplicateOutput { step, .. } => step,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaValidationError {
    #[error("No JSON object found in model output.")]
    NoJson,

    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Model output is missing the \"{0}\" key.")]
    MissingKey(String),

    #[error("Model output does not match the {record} schema: {message}")]
    InvalidRecord { record: &'static str, message: String },

    #[error("Model output failed validation: {0}")]
    Rule(#[from] validator::ValidationErrors),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing value for prompt variable \"{0}\".")]
    MissingVariable(String),
}

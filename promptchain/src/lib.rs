#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod chain;
pub mod config;
pub mod error;
pub mod llm;
pub mod openai;
pub mod parser;
mod pipeline;
pub mod pipelines;
mod prompt;
pub mod prompts;
pub mod qdrant;
pub mod records;
pub mod vector;

pub use chain::{parse_step, LlmChain};
pub use config::{Endpoint, OpenAIConfig, QdrantConfig};
pub use error::{PipelineError, PromptError, SchemaValidationError};
pub use llm::{LanguageModel, Message, Role};
pub use openai::OpenAI;
pub use parser::{JsonOutputParser, OutputParser, ResponseSchema, StructuredOutputParser};
pub use pipeline::{Pipeline, PipelineBuilder, RunState, Step, StepEvent, Values};
pub use prompt::{ChatPromptTemplate, PromptTemplate};
pub use qdrant::{Qdrant, QdrantIndex};
pub use records::{ClaimDetails, EmailInfo, VacationInfo};
pub use vector::{Distance, Document, Embedder, InMemoryIndex, ScoredDocument, VectorStore};

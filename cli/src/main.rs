#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod samples;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use futures::StreamExt;
use serde_json::{json, Value};
use std::{fs, path::PathBuf, process, sync::Arc};
use tracing::{debug, info};
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use promptchain::{
    config::DEFAULT_CHAT_MODEL, pipelines, prompts, ClaimDetails, Document, EmailInfo, Endpoint,
    InMemoryIndex, LanguageModel, LlmChain, OpenAI, OpenAIConfig, Pipeline, PromptTemplate,
    QdrantConfig, QdrantIndex, Qdrant, VacationInfo, Values, VectorStore,
};

const EMBEDDING_SIZE: usize = 1536;
const EMAIL_SEPARATOR: &str = "\n---\n";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Alternative OpenAI-compatible base URL
    #[arg(long, env = "OPENAI_API_BASE", global = true)]
    api_base: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_CHAT_MODEL, global = true)]
    model: String,

    /// Sampling temperature, defaults to a per-command value
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Print every intermediate step output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ask the model a single question
    Chat {
        prompt: String,
        /// Use the legacy completions API
        #[arg(long)]
        legacy: bool,
    },
    /// Say good morning in another language
    Greet {
        #[arg(default_value = "German")]
        language: String,
    },
    /// Rewrite a review in another tone and translate it
    Rewrite {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "Proper British English in a nice, warm, respectful tone")]
        tone: String,
        #[arg(long, default_value = "Turkish")]
        language: String,
    },
    /// Extract claim details from an email as CSV
    CsvClaim {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Summarize a claim email, classify it and draft a reply
    Claim {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Summarize a product review, list key points and categories, and draft a reply
    Review {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Write a product description and a tagline
    Market {
        #[arg(long, default_value = "smart water bottle")]
        product: String,
        #[arg(long, default_value = "fitness enthusiasts")]
        audience: String,
    },
    /// Extract storm date, location and policy number from a claim email
    ExtractClaim {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Extract trip details from an itinerary email
    Vacation {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Extract sender, subject, date and topics from emails separated by `---` lines
    Emails {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Index extracted emails in memory and search them
    SearchEmails {
        #[arg(default_value = "fire damage in house")]
        query: String,
        #[arg(short, default_value_t = 2)]
        k: usize,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Extract emails and store them in a Qdrant collection
    Index {
        collection: String,
        #[arg(long, env = "QDRANT_URL")]
        qdrant_url: String,
        /// Create the collection first
        #[arg(long)]
        create: bool,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Search a Qdrant collection
    Query {
        collection: String,
        query: String,
        #[arg(long, env = "QDRANT_URL")]
        qdrant_url: String,
        #[arg(short, default_value_t = 2)]
        k: usize,
    },
}

impl Commands {
    /// Temperature used when `--temperature` is not given.
    const fn default_temperature(&self) -> f32 {
        match self {
            Self::Greet { .. } => 0.9,
            Self::Market { .. } => 0.7,
            Self::Review { .. } => 0.3,
            _ => 0.0,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "cli=debug,promptchain=debug"
    } else {
        "cli=info,promptchain=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:?}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = openai_config(&cli)?;
    let verbose = cli.verbose;
    let openai = Arc::new(OpenAI::new(config.clone()));
    let model: Arc<dyn LanguageModel> = openai.clone();

    match cli.command {
        Commands::Chat { prompt, legacy } => {
            let reply = if legacy {
                OpenAI::new(config.with_endpoint(Endpoint::Completion))
                    .predict(&prompt)
                    .await?
            } else {
                model.predict(&prompt).await?
            };

            println!("{}", reply.trim());
        }
        Commands::Greet { language } => {
            let chain = LlmChain::new(model, PromptTemplate::new(prompts::GREETING));
            let reply = chain.run(&values([("language", json!(language))])).await?;

            println!("{reply}");
        }
        Commands::Rewrite {
            input,
            tone,
            language,
        } => {
            let review = read_input(input, samples::CUSTOMER_REVIEW)?;
            let chain = LlmChain::new(model, PromptTemplate::new(prompts::REWRITE_REVIEW));
            let reply = chain
                .run(&values([
                    ("tone", json!(tone)),
                    ("language", json!(language)),
                    ("review", json!(review)),
                ]))
                .await?;

            println!("{reply}");
        }
        Commands::CsvClaim { input } => {
            let email = read_input(input, samples::HAILSTORM_EMAIL)?;
            let chain = LlmChain::new(model, PromptTemplate::new(prompts::CSV_CLAIM));
            let reply = chain.run(&values([("email", json!(email))])).await?;

            println!("{reply}");
        }
        Commands::Claim { input } => {
            let email = read_input(input, samples::FLOOD_EMAIL)?;
            let pipeline = pipelines::insurance_claim(&model)?;
            let result = execute(&pipeline, values([("email", json!(email))]), verbose).await?;

            println!("\n=== Output ===");
            println!("Summary: {}", text(&result, "summary"));
            println!("Claim Type: {}", text(&result, "claim_type"));
            println!("Response:\n{}", text(&result, "final_response"));
        }
        Commands::Review { input } => {
            let review = read_input(input, samples::PHONE_REVIEW)?;
            let pipeline = pipelines::product_review(&model)?;
            let result = execute(&pipeline, values([("review", json!(review))]), verbose).await?;

            println!("\nSummary:\n{}", text(&result, "summary"));
            println!("\nKey Points:\n{}", text(&result, "key_points"));
            println!("\nCategories:\n{}", text(&result, "categories"));
            println!("\nResponse:\n{}", text(&result, "response"));
        }
        Commands::Market { product, audience } => {
            let pipeline = pipelines::product_marketing(&model)?;
            let result = execute(
                &pipeline,
                values([("product", json!(product)), ("audience", json!(audience))]),
                verbose,
            )
            .await?;

            println!("Product Description:\n{}", text(&result, "description"));
            println!("\nTagline:\n{}", text(&result, "tagline"));
        }
        Commands::ExtractClaim { input } => {
            let email = read_input(input, samples::STORM_EMAIL)?;
            let pipeline = pipelines::claim_extraction(&model)?;
            let mut result = execute(&pipeline, values([("email", json!(email))]), verbose).await?;
            let claim: ClaimDetails = record(&mut result, "claim")?;

            println!("{}", serde_json::to_string_pretty(&claim)?);
        }
        Commands::Vacation { input } => {
            let email = read_input(input, samples::VACATION_EMAIL)?;
            let pipeline = pipelines::vacation_extraction(&model)?;
            let mut result = execute(&pipeline, values([("email", json!(email))]), verbose).await?;
            let vacation: VacationInfo = record(&mut result, "vacation")?;

            println!("Leave Time: {}", vacation.leave_time);
            println!("Leave From: {}", vacation.leave_from);
            println!("Num People: {}", vacation.num_people);
            println!("Cities to Visit:");
            for city in &vacation.cities_to_visit {
                println!("  - {city}");
            }
        }
        Commands::Emails { input } => {
            let emails = extract_emails(&model, read_emails(input)?, verbose).await?;

            for (i, email) in emails.iter().enumerate() {
                println!("\nEmail {}", i + 1);
                println!("Sender: {}", email.sender);
                println!("Subject: {}", email.subject);
                println!("Date: {}", email.date);
                println!("Topics: {:?}", email.key_topics);
            }
        }
        Commands::SearchEmails { query, k, input } => {
            let emails = extract_emails(&model, read_emails(input)?, verbose).await?;
            let documents = emails.iter().map(EmailInfo::to_document).collect::<Vec<Document>>();
            let index = InMemoryIndex::from_documents(documents, openai).await?;

            println!("\nTop Matches:");
            for hit in index.search(&query, k).await? {
                println!("{}\n", hit.document.page_content);
            }
        }
        Commands::Index {
            collection,
            qdrant_url,
            create,
            input,
        } => {
            if create {
                Qdrant::new(&qdrant_url)
                    .create_collection(&collection, EMBEDDING_SIZE)
                    .await?;
            }

            let emails = extract_emails(&model, read_emails(input)?, verbose).await?;
            let index = QdrantIndex::new(&QdrantConfig::new(qdrant_url, &collection), openai);
            index
                .add_documents(emails.iter().map(EmailInfo::to_document).collect())
                .await?;

            info!("Indexed {} emails into {collection}", emails.len());
        }
        Commands::Query {
            collection,
            query,
            qdrant_url,
            k,
        } => {
            let index = QdrantIndex::new(&QdrantConfig::new(qdrant_url, collection), openai);

            for hit in index.search(&query, k).await? {
                println!("[{:.3}] {}\n", hit.score, hit.document.page_content);
            }
        }
    }

    Ok(())
}

fn openai_config(cli: &Cli) -> Result<OpenAIConfig> {
    let api_key = cli
        .api_key
        .clone()
        .context("No OpenAI API key; set OPENAI_API_KEY or pass --api-key")?;

    let mut config = OpenAIConfig::new(api_key)
        .with_model(cli.model.clone())
        .with_temperature(cli.temperature.unwrap_or_else(|| cli.command.default_temperature()));
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base(api_base.clone());
    }

    Ok(config)
}

/// Runs a pipeline; in verbose mode every step's outputs are printed as it finishes.
async fn execute(pipeline: &Pipeline, inputs: Values, verbose: bool) -> Result<Values> {
    if !verbose {
        return Ok(pipeline.run(inputs).await?);
    }

    let mut context = inputs.clone();
    let mut events = Box::pin(pipeline.stream(inputs));
    while let Some(event) = events.next().await {
        let event = event?;
        println!("\n> Finished step {} ({})", event.index + 1, event.step);
        for (key, value) in &event.outputs {
            println!("{key}: {}", display(value));
        }
        context.extend(event.outputs);
    }

    Ok(pipeline.select_outputs(context))
}

async fn extract_emails(
    model: &Arc<dyn LanguageModel>,
    emails: Vec<String>,
    verbose: bool,
) -> Result<Vec<EmailInfo>> {
    let pipeline = pipelines::email_extraction(model)?;
    let mut parsed = Vec::with_capacity(emails.len());

    for email in emails {
        let mut result = execute(&pipeline, values([("email", json!(email))]), verbose).await?;
        parsed.push(record(&mut result, "email_info")?);
    }

    debug!("Extracted {} emails", parsed.len());

    Ok(parsed)
}

fn values<const N: usize>(entries: [(&str, Value); N]) -> Values {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn record<T: serde::de::DeserializeOwned>(result: &mut Values, key: &str) -> Result<T> {
    let value = result
        .remove(key)
        .with_context(|| format!("Pipeline produced no \"{key}\""))?;

    Ok(serde_json::from_value(value)?)
}

fn text<'a>(result: &'a Values, key: &str) -> &'a str {
    result.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn display(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToOwned::to_owned)
}

fn read_input(path: Option<PathBuf>, sample: &str) -> Result<String> {
    path.map_or_else(
        || Ok(sample.to_owned()),
        |path| {
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
        },
    )
}

fn read_emails(path: Option<PathBuf>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(samples::EMAILS.iter().map(ToString::to_string).collect());
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(content
        .split(EMAIL_SEPARATOR)
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}

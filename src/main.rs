use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use devclassify::{
    ClassificationPipeline, Config, MissingPolicy, OpenAIProvider, PipelineConfig, Storage,
};

#[derive(Parser, Debug)]
#[command(name = "devclassify")]
#[command(version = "0.1.0")]
#[command(about = "Classify game developers in a CSV dataset with an LLM")]
struct Args {
    /// Input CSV file
    #[arg(short, long, default_value = "data/cleaned_game.csv")]
    input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "data/developer_category.csv")]
    output: PathBuf,

    /// Column holding developer names
    #[arg(long, default_value = "developer")]
    column: String,

    /// Name of the column written with the classification
    #[arg(long, default_value = "developer_category")]
    output_column: String,

    /// JSON secrets file containing the `openai_api` key
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Chat-completion model
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens in each reply
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Number of requests in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Client-side cap on requests per minute
    #[arg(long)]
    requests_per_minute: Option<u32>,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Rows with a missing developer: classify, skip or drop
    #[arg(long, default_value = "classify")]
    missing: MissingPolicy,

    /// SQLite file for resuming interrupted runs
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("devclassify=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // CLI flags win over the environment
    let mut config = Config::from_env(args.credentials.as_deref())?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency_limit = concurrency;
    }
    if let Some(rpm) = args.requests_per_minute {
        config.requests_per_minute = Some(rpm);
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(path) = args.checkpoint {
        config.checkpoint_path = Some(path);
    }

    let llm = OpenAIProvider::from_config(&config)?;

    let pipeline_config = PipelineConfig {
        input_path: args.input,
        output_path: args.output,
        column: args.column,
        output_column: args.output_column,
        missing_policy: args.missing,
        ..PipelineConfig::from(&config)
    };

    let mut pipeline = ClassificationPipeline::new(llm, pipeline_config);
    if let Some(ref path) = config.checkpoint_path {
        let storage = Storage::new(path)?;
        tracing::info!(
            "Resuming with {} checkpointed classifications from {}",
            storage.count_classifications(&config.model)?,
            path.display()
        );
        pipeline = pipeline.with_checkpoint(storage);
    }

    let report = pipeline.run().await?;
    println!("{}", report);

    Ok(())
}

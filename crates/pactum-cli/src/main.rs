//! Pactum command line: parse, batch, organize, index, search, retry.

mod display;
mod pipeline;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pactum",
    version,
    about = "Contract parsing, entity extraction, and document organization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse one document and report the assembled contract.
    Parse(ParseArgs),
    /// Parse every document under a directory, continuing past failures.
    Batch(BatchArgs),
    /// File contracts into the processed tree using analyzed metadata.
    Organize(OrganizeArgs),
    /// Embed a contract document and add it to the vector index.
    Index(IndexArgs),
    /// Search the vector index for contracts similar to a query.
    Search(SearchArgs),
    /// Retry filename translations that previously failed.
    Retry(RetryArgs),
}

/// Analyzer endpoints shared by the document commands. Every service is
/// optional: a missing endpoint just drops that analyzer from the run.
#[derive(Args, Debug, Default)]
struct AnalyzerArgs {
    /// Chat-completions endpoint for LLM metadata analysis.
    #[arg(long, env = "PACTUM_LLM_URL")]
    llm_url: Option<String>,
    /// API key for the LLM endpoint.
    #[arg(long, env = "PACTUM_LLM_KEY")]
    llm_key: Option<String>,
    /// Translation endpoint for foreign-language text and filenames.
    #[arg(long, env = "PACTUM_TRANSLATE_URL")]
    translate_url: Option<String>,
    /// Directory holding model.onnx and tokenizer.json for the model passes.
    #[arg(long, env = "PACTUM_MODEL_DIR")]
    model_dir: Option<PathBuf>,
    /// Parquet file of labeled historical phrases for the domain pass.
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Document to parse: .md, .txt, .json, or .pdf with a converted sibling.
    input: PathBuf,
    #[command(flatten)]
    analyzers: AnalyzerArgs,
    /// Print the contract and validation summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory of documents to parse.
    input: PathBuf,
    #[command(flatten)]
    analyzers: AnalyzerArgs,
}

#[derive(Args, Debug)]
struct OrganizeArgs {
    /// Contract file or directory of contract files to organize.
    input: PathBuf,
    /// Root the processed tree is created under.
    #[arg(long, default_value = ".")]
    output: PathBuf,
    #[command(flatten)]
    analyzers: AnalyzerArgs,
    /// Move the files; without this the plan is only printed.
    #[arg(long)]
    apply: bool,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Parsed contract document to embed and index.
    input: PathBuf,
    /// LanceDB database directory.
    #[arg(long, env = "PACTUM_DB", default_value = "pactum.lance")]
    db: PathBuf,
    /// Directory holding model.onnx and tokenizer.json.
    #[arg(long, env = "PACTUM_MODEL_DIR")]
    model_dir: PathBuf,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Free-text query.
    query: String,
    /// LanceDB database directory.
    #[arg(long, env = "PACTUM_DB", default_value = "pactum.lance")]
    db: PathBuf,
    /// Directory holding model.onnx and tokenizer.json.
    #[arg(long, env = "PACTUM_MODEL_DIR")]
    model_dir: PathBuf,
    /// Number of hits to return.
    #[arg(long, default_value_t = 5)]
    limit: usize,
    /// Print hits as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RetryArgs {
    /// Directory holding the translation queue file.
    #[arg(long, default_value = ".")]
    queue_dir: PathBuf,
    /// Translation endpoint; without it only the fallback mapping applies.
    #[arg(long, env = "PACTUM_TRANSLATE_URL")]
    translate_url: Option<String>,
    /// Attempts before a queue entry is skipped for good.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse(args) => pipeline::run_parse(args).await,
        Commands::Batch(args) => pipeline::run_batch(args).await,
        Commands::Organize(args) => pipeline::run_organize(args).await,
        Commands::Index(args) => pipeline::run_index(args).await,
        Commands::Search(args) => pipeline::run_search(args).await,
        Commands::Retry(args) => pipeline::run_retry(args).await,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

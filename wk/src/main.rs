//! WikiChat - chat with an agent over Wikipedia pages you name
//!
//! CLI entry point for the interactive chat and index management.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;
use vectorstore::{ChunkOptions, IndexStore};

use wikichat::cli::{Cli, Command, IndexesCommand, get_log_path};
use wikichat::config::Config;
use wikichat::embed::create_embedder;
use wikichat::extract::extract_page_list;
use wikichat::index::{WikiIndex, build_index};
use wikichat::llm::create_client;
use wikichat::query::QueryOptions;
use wikichat::repl;
use wikichat::wikipedia::{DocumentLoader, WikipediaReader};

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file, never to the terminal
    let level = match level {
        Some(level) => level
            .parse::<tracing::Level>()
            .map_err(|_| eyre::eyre!("Invalid log level: {}", level))?,
        None => tracing::Level::INFO,
    };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI flag wins over the config file
    let level = cli.log_level.clone().or_else(|| Config::load_log_level(cli.config.as_ref()));
    setup_logging(level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "WikiChat loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Some(Command::Chat { model, index, load }) => repl::run_interactive(&config, model, index, load).await,
        Some(Command::Extract { request }) => cmd_extract(&config, &request).await,
        Some(Command::Index { request, label }) => cmd_index(&config, &request, label.as_deref()).await,
        Some(Command::Query { id, question }) => cmd_query(&config, &id, &question).await,
        Some(Command::Indexes { command }) => cmd_indexes(&config, command),
        None => repl::run_interactive(&config, None, None, None).await,
    }
}

fn open_store(config: &Config) -> Result<IndexStore> {
    IndexStore::open(&config.index.store_dir)
        .with_context(|| format!("Failed to open index store at {}", config.index.store_dir.display()))
}

/// Print the extracted page list
async fn cmd_extract(config: &Config, request: &str) -> Result<()> {
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let pages = extract_page_list(llm.as_ref(), request).await;
    println!("{}", serde_json::to_string(&pages)?);
    Ok(())
}

/// Build and save an index for a request
async fn cmd_index(config: &Config, request: &str, label: Option<&str>) -> Result<()> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let embedder = create_embedder(&config.embedding).context("Failed to create embedder")?;
    let loader = WikipediaReader::from_config(&config.wikipedia).context("Failed to create Wikipedia reader")?;

    let pages = extract_page_list(llm.as_ref(), request).await;
    if pages.is_empty() {
        return Err(eyre::eyre!("No Wikipedia pages found in '{}'", request));
    }
    println!("{} {}", "Pages:".bright_cyan(), pages.as_slice().join(", "));

    let documents = loader.load(pages.as_slice()).await.context("Failed to load pages")?;
    if documents.is_empty() {
        return Err(eyre::eyre!("None of the pages could be loaded"));
    }
    println!("{} {} page(s)", "Loaded:".bright_cyan(), documents.len());

    let mut index = build_index(&documents, embedder.as_ref(), &ChunkOptions::from(&config.index))
        .await
        .context("Failed to build index")?;
    let store = open_store(config)?;
    let manifest = index
        .save(&store, Some(label.unwrap_or(request)))
        .context("Failed to save index")?;

    info!(id = %manifest.id, node_count = manifest.node_count, "Saved index");
    println!(
        "{} {} ({} documents)",
        "Saved:".bright_green(),
        manifest.id,
        manifest.node_count
    );
    Ok(())
}

/// Answer one question from a saved index
async fn cmd_query(config: &Config, id: &str, question: &str) -> Result<()> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let embedder = create_embedder(&config.embedding).context("Failed to create embedder")?;
    let store = open_store(config)?;
    let (_, index) = WikiIndex::load(&store, id).with_context(|| format!("Failed to load index '{}'", id))?;

    let engine = Arc::new(index).as_query_engine(llm, embedder, QueryOptions::from(&config.index))?;
    let response = engine.query(question).await?;

    println!("{}", response.response);
    if !response.source_nodes.is_empty() {
        println!();
        println!("{}", "Sources:".bright_cyan());
        for scored in &response.source_nodes {
            println!(
                "  {:.3}  {} #{}",
                scored.score,
                scored.node.title,
                scored.node.chunk_index
            );
        }
    }
    Ok(())
}

/// List, show or delete saved indexes
fn cmd_indexes(config: &Config, command: IndexesCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        IndexesCommand::List => {
            let manifests = store.list()?;
            if manifests.is_empty() {
                println!("No saved indexes in {}", store.base_path().display());
                return Ok(());
            }
            for manifest in manifests {
                println!(
                    "{}  {}  {:>5} nodes  {}",
                    manifest.id.bright_white(),
                    manifest.created_at.format("%Y-%m-%d %H:%M"),
                    manifest.node_count,
                    manifest.label.as_deref().unwrap_or("-")
                );
            }
        }
        IndexesCommand::Show { id } => {
            let manifest = store.manifest(&id)?;
            let stats = store.stats(&id)?;
            println!("{:12} {}", "ID:", manifest.id);
            println!("{:12} {}", "Label:", manifest.label.as_deref().unwrap_or("-"));
            println!("{:12} {}", "Created:", manifest.created_at.to_rfc3339());
            println!("{:12} {}", "Dimensions:", manifest.dimensions);
            println!("{:12} {}", "Nodes:", stats.node_count);
            println!("{:12} {}", "Documents:", stats.document_count);
            println!("{:12} {} bytes", "Text:", stats.text_bytes);
            println!("{:12} {} bytes", "On disk:", stats.disk_bytes);
            println!("{:12} {}", "Pages:", manifest.documents.join(", "));
        }
        IndexesCommand::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted index {}", id);
        }
    }
    Ok(())
}

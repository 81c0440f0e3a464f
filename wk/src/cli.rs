//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Path of the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wikichat")
        .join("logs")
        .join("wikichat.log")
}

/// WikiChat - chat with an agent over Wikipedia pages you name
#[derive(Parser)]
#[command(
    name = "wikichat",
    about = "Index Wikipedia pages on demand and chat with a retrieval-augmented agent over them",
    version,
    after_help = "Logs are written to: ~/.local/share/wikichat/logs/wikichat.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, global = true, help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive chat (the default)
    Chat {
        /// Chat model to start with
        #[arg(short, long)]
        model: Option<String>,

        /// Request naming pages to index first, e.g. "please index: Paris, Lagos"
        #[arg(short, long, value_name = "REQUEST")]
        index: Option<String>,

        /// Saved index to chat over
        #[arg(long, value_name = "ID")]
        load: Option<String>,
    },

    /// Print the page names extracted from a request as JSON
    Extract {
        /// Free-text request
        request: String,
    },

    /// Extract, load and index pages, then save the index
    Index {
        /// Free-text request
        request: String,

        /// Label stored with the index
        #[arg(long)]
        label: Option<String>,
    },

    /// Ask one question against a saved index
    Query {
        /// Saved index ID
        id: String,

        /// Question to answer
        question: String,
    },

    /// Manage saved indexes
    Indexes {
        #[command(subcommand)]
        command: IndexesCommand,
    },
}

/// Saved index subcommands
#[derive(Subcommand)]
pub enum IndexesCommand {
    /// List saved indexes
    List,

    /// Show one saved index
    Show {
        /// Saved index ID
        id: String,
    },

    /// Delete a saved index
    Delete {
        /// Saved index ID
        id: String,
    },
}

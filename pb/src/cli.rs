//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// PitchBot - AI startup pitch deck generator
#[derive(Debug, Parser)]
#[command(
    name = "pb",
    about = "Generate a startup pitch deck in Google Slides from a short idea description",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the pitch and build the slide deck
    Run {
        /// Idea description file (JSON or YAML)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Presentation title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Generate and print the pitch without touching Google Slides
    Pitch {
        /// Idea description file (JSON or YAML)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the prompt that would be sent to the language model
    Prompt {
        /// Idea description file (JSON or YAML)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Split saved pitch text into sections
    Sections {
        /// File containing pitch text
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Authorize with Google and cache the token
    Auth,
}

/// Output format for commands that print structured data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

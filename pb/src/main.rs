//! PitchBot - AI startup pitch deck generator
//!
//! CLI entry point: generate pitch copy and turn it into a Google Slides deck.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, error, info};

use pitchbot::cli::{Cli, Command, OutputFormat};
use pitchbot::config::Config;
use pitchbot::idea::load_input;
use pitchbot::llm::create_client;
use pitchbot::pipeline::{Pipeline, PipelineEvent};
use pitchbot::prompts::PromptLoader;
use pitchbot::sections::extract_sections;
use pitchbot::slides::{GoogleSlidesConnector, SlidesConnector};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pitchbot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("pitchbot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    if let Err(e) = setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("PitchBot loaded config: model={}", config.llm.model);

    debug!(command = ?cli.command, "run: dispatching command");
    match cli.command {
        None => cmd_run(&config, None, None).await,
        Some(Command::Run { input, title }) => cmd_run(&config, input, title).await,
        Some(Command::Pitch { input }) => cmd_pitch(&config, input).await,
        Some(Command::Prompt { input }) => cmd_prompt(&config, input),
        Some(Command::Sections { file, format }) => cmd_sections(&file, format),
        Some(Command::Auth) => cmd_auth(&config).await,
    }
}

fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::InputLoaded => println!("{} Idea loaded", "•".cyan()),
        PipelineEvent::GeneratingPitch => println!("{} Generating pitch...", "•".cyan()),
        PipelineEvent::PitchGenerated(pitch) => {
            println!("{} Pitch generated\n", "✓".green());
            println!("{}\n", pitch);
        }
        PipelineEvent::SectionsParsed(titles) => {
            println!("{} {} sections parsed", "•".cyan(), titles.len());
        }
        PipelineEvent::Authorized => println!("{} Authorized with Google Slides", "✓".green()),
        PipelineEvent::PresentationCreated(id) => println!("{} Created presentation {}", "•".cyan(), id.dimmed()),
        PipelineEvent::DeckBuilt {
            slides,
            skipped_placeholders,
        } => {
            println!("{} {} slides added", "✓".green(), slides);
            if *skipped_placeholders > 0 {
                println!(
                    "{} {} placeholders missing and left empty",
                    "!".yellow(),
                    skipped_placeholders
                );
            }
        }
    }
}

fn build_pipeline(config: &Config, title: Option<String>) -> Result<Pipeline> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let connector: Arc<dyn SlidesConnector> = Arc::new(GoogleSlidesConnector::new(config.slides.clone()));
    let title = title.unwrap_or_else(|| config.slides.deck_title.clone());

    Ok(Pipeline::new(llm, connector, PromptLoader::new(&config.prompts_dir), title).with_observer(print_event))
}

async fn cmd_run(config: &Config, input: Option<PathBuf>, title: Option<String>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.input.clone());
    debug!(?input, ?title, "cmd_run: called");

    let outcome = build_pipeline(config, title)?.run(&input).await?;
    println!("Presentation: {}", outcome.url.bold());
    Ok(())
}

async fn cmd_pitch(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.input.clone());
    debug!(?input, "cmd_pitch: called");

    build_pipeline(config, None)?.generate(&input).await?;
    Ok(())
}

fn cmd_prompt(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.input.clone());
    debug!(?input, "cmd_prompt: called");

    let idea = load_input(&input).context("Failed to load idea description")?;
    let prompt = PromptLoader::new(&config.prompts_dir).render_pitch(&idea)?;
    println!("{}", prompt);
    Ok(())
}

fn cmd_sections(file: &Path, format: OutputFormat) -> Result<()> {
    debug!(?file, ?format, "cmd_sections: called");
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let sections = extract_sections(&text);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sections)?),
        OutputFormat::Text => {
            if sections.is_empty() {
                println!("No sections found.");
            }
            for (title, body) in &sections {
                println!("{}", title.bold());
                if !body.is_empty() {
                    println!("{}", body);
                }
                println!();
            }
        }
    }
    Ok(())
}

async fn cmd_auth(config: &Config) -> Result<()> {
    debug!("cmd_auth: called");
    let user = GoogleSlidesConnector::new(config.slides.clone())
        .authorize()
        .await
        .context("Failed to authorize with Google Slides")?;

    println!(
        "{} Authorized. Token saved to {}",
        "✓".green(),
        config.slides.token_file.display()
    );
    if let Some(expiry) = user.expiry {
        println!("  expires {}", expiry.to_rfc3339());
    }
    Ok(())
}

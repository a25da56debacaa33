//! etl-cognition - PowerCenter workflow analyzer
//!
//! CLI entry point: runs the demo, analyzes files, lists sessions or serves
//! the HTTP API.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use etl_cognition::cli::{Cli, Command};
use etl_cognition::config::Config;
use etl_cognition::extractor::{ExtractionResult, WorkflowExtractor};
use etl_cognition::sample::write_sample;
use etl_cognition::{server, session};

fn setup_logging(level: tracing::Level) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("etl-cognition")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to log file, not stdout/stderr
    let log_file = fs::File::create(log_dir.join("ec.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

/// `--log-level` beats config `log-level`, which beats INFO
fn resolve_log_level(cli_level: Option<&str>, config_level: Option<&str>) -> tracing::Level {
    cli_level
        .or(config_level)
        .and_then(|level| level.parse().ok())
        .unwrap_or(tracing::Level::INFO)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_level = Config::load_log_level(cli.config.as_ref());
    let level = resolve_log_level(cli.log_level.as_deref(), config_level.as_deref());
    setup_logging(level).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "etl-cognition loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        None | Some(Command::Run) => cmd_run(&config).await,
        Some(Command::Analyze { file }) => cmd_analyze(&config, &file).await,
        Some(Command::Generate { output }) => cmd_generate(&config, output),
        Some(Command::Sessions) => cmd_sessions(&config),
        Some(Command::Serve { host, port }) => cmd_serve(config, host, port).await,
    }
}

/// Write the sample export and analyze it
async fn cmd_run(config: &Config) -> Result<()> {
    println!("{}", "=== PowerCenter XML Analyzer CLI Mode ===".bold());
    let sample = &config.output.sample_file;
    write_sample(sample)?;
    println!("Generated sample XML: {}", sample.display());
    cmd_analyze(config, sample).await
}

async fn cmd_analyze(config: &Config, file: &Path) -> Result<()> {
    let extractor = WorkflowExtractor::new(config);
    if extractor.is_mock() {
        println!(
            "{}",
            format!("{} not set, using mock LLM responses", config.llm.api_key_env).yellow()
        );
    }

    let result = match extractor.extract_file(file).await {
        Ok(result) => result,
        Err(e) => {
            println!("{} {:#}", "✗".red(), e);
            return Err(e);
        }
    };
    print_result(&result);
    Ok(())
}

fn print_result(result: &ExtractionResult) {
    println!();
    println!("{}", "=== WORKFLOW EXTRACTION RESULTS ===".bold());
    println!("Session ID: {}", result.session_id);
    println!("Session Folder: {}", result.session_folder.display());
    println!("Repository: {}", result.repository.repository_name);
    println!("Sources: {}", result.repository.sources.len());
    println!("Targets: {}", result.repository.targets.len());
    println!("Transformations: {}", result.analyses.len());

    println!();
    println!("{}", "=== DEPENDENCIES ===".bold());
    for edge in &result.edges {
        println!("  {}", edge);
    }

    println!();
    println!("{}", "=== WORKFLOW SUMMARY ===".bold());
    println!("{}", result.summary);

    println!();
    println!("{}", "=== ERRORS ===".bold());
    for warning in &result.warnings {
        println!("- {}", warning.yellow());
    }

    println!();
    println!("{}", "=== GRAPH VISUALIZATION ===".bold());
    match &result.diagram_path {
        Some(path) => println!("Graph visualization saved as '{}'", path.display()),
        None => println!("{}", "Graph visualization could not be created".yellow()),
    }

    println!();
    println!("{}", "=== SESSION COMPLETE ===".green().bold());
    println!("All outputs saved to: {}", result.session_folder.display());
}

fn cmd_generate(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| config.output.sample_file.clone());
    write_sample(&path)?;
    println!("{} Sample XML written to {}", "✓".green(), path.display());
    Ok(())
}

fn cmd_sessions(config: &Config) -> Result<()> {
    let sessions = session::list_sessions(&config.output.sessions_dir)?;
    if sessions.is_empty() {
        println!("No sessions found in {}", config.output.sessions_dir.display());
        return Ok(());
    }

    println!("{:<22} {:<18} {:<8} {:<8}", "SESSION", "CREATED", "SUMMARY", "DIAGRAM");
    for s in sessions {
        let mark = |present: bool| if present { "yes".green() } else { "no".red() };
        println!(
            "{:<22} {:<18} {:<8} {:<8}",
            s.session_id,
            s.created_at,
            mark(s.has_summary),
            mark(s.has_diagram)
        );
    }
    Ok(())
}

async fn cmd_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or_else(|| config.server.effective_port());
    let addr = format!("{}:{}", host, port);

    if config.llm.api_key().is_none() {
        warn!("Serving with mock LLM responses");
    }
    println!("{}", "=== PowerCenter XML Analyzer API ===".bold());
    println!("Listening on http://{}", addr);
    println!("Health Check: http://{}/health", addr);
    server::serve(config, &addr).await
}

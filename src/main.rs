//! Market Resolver CLI
//!
//! Resolves prediction market questions from exchange and sports feeds.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use market_resolver::resolver::unresolved_files;
use market_resolver::{Config, Database, Question, Recommendation, Resolution, Resolver};
use std::path::{Path, PathBuf};
use tracing::{error, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "market-resolver")]
#[command(about = "Resolve prediction market questions to a recommendation code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one question file and print `recommendation: pN`
    Resolve {
        /// Path to the question file
        file: PathBuf,

        /// Do not write the result to the history database
        #[arg(long)]
        no_record: bool,
    },

    /// Resolve every question file in a directory
    Batch {
        /// Directory containing *.json question files
        dir: PathBuf,

        /// Maximum questions resolved at once
        #[arg(short, long, default_value = "4")]
        concurrency: usize,

        /// Do not write results to the history database
        #[arg(long)]
        no_record: bool,
    },

    /// Check a question file without fetching anything
    Validate {
        /// Path to the question file
        file: PathBuf,
    },

    /// Show recorded resolutions
    History {
        /// Maximum number of rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Only show this question id
        #[arg(short, long)]
        question: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for recommendation lines
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Resolve { file, no_record } => resolve_question(&file, no_record).await,
        Commands::Batch { dir, concurrency, no_record } => resolve_batch(&dir, concurrency, no_record).await,
        Commands::Validate { file } => validate_question(&file)?,
        Commands::History { limit, question } => show_history(limit, question.as_deref()).await?,
    }

    Ok(())
}

/// Always prints exactly one recommendation line and never fails
async fn resolve_question(file: &Path, no_record: bool) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            println!("recommendation: {}", Recommendation::default());
            return;
        }
    };

    let resolution = match Resolver::new(&config) {
        Ok(resolver) => resolver.resolve_file(file).await,
        Err(e) => {
            error!("Failed to create HTTP client: {:#}", e);
            let reason = format!("{:#}", e);
            unresolved_files(&[file.to_path_buf()], &reason).remove(0)
        }
    };
    println!("{}", resolution.output_line());

    if config.record_history && !no_record {
        record(&config, std::slice::from_ref(&resolution)).await;
    }
}

/// Prints one line per question file in `dir` and never fails
async fn resolve_batch(dir: &Path, concurrency: usize, no_record: bool) {
    let paths = match Question::discover(dir) {
        Ok(paths) => paths,
        Err(e) => {
            error!("{:#}", e);
            return;
        }
    };

    let setup = Config::from_env().and_then(|config| Resolver::new(&config).map(|resolver| (config, resolver)));

    let resolutions = match &setup {
        Ok((_, resolver)) => resolver.resolve_files(&paths, concurrency).await,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            unresolved_files(&paths, &format!("{:#}", e))
        }
    };

    for resolution in &resolutions {
        println!("{} {}", resolution.question_id, resolution.output_line());
    }

    if let Ok((config, _)) = &setup {
        if config.record_history && !no_record {
            record(config, &resolutions).await;
        }
    }
}

/// History failures are logged and never change what was printed
async fn record(config: &Config, resolutions: &[Resolution]) {
    let db = match Database::new(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            warn!("History database unavailable: {:#}", e);
            return;
        }
    };

    for resolution in resolutions {
        if let Err(e) = db.record_resolution(resolution).await {
            warn!("{:#}", e);
        }
    }
}

fn validate_question(file: &Path) -> Result<()> {
    let question = Question::load(file)?;

    println!("{} {}", "OK".green().bold(), question.display_title());
    println!("  id:       {}", question.id);
    println!("  kind:     {}", question.rule.kind());
    println!("  fallback: {}", question.fallback);

    Ok(())
}

async fn show_history(limit: i64, question_id: Option<&str>) -> Result<()> {
    let config = Config::from_env()?;
    let db = Database::new(&config.database_path).await?;

    let records = match question_id {
        Some(id) => db.resolutions_for(id, limit).await?,
        None => db.recent_resolutions(limit).await?,
    };

    if records.is_empty() {
        println!("No resolutions recorded.");
        return Ok(());
    }

    println!("\n{}", "=".repeat(70));
    println!("  RESOLUTION HISTORY ({})", records.len());
    println!("{}\n", "=".repeat(70));

    for record in &records {
        let code = if record.fell_back {
            record.recommendation.to_string().yellow()
        } else {
            record.recommendation.to_string().green()
        };

        println!(
            "{}  {}  {}",
            record.resolved_at.format("%Y-%m-%d %H:%M:%S"),
            code.bold(),
            record.question_id
        );
        println!("    {}", record.detail.dimmed());
    }

    println!();
    Ok(())
}

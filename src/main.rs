use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beejobs::config::Config;
use beejobs::models::{Category, JobType};
use beejobs::storage::{JobQuery, SortField, SortOrder};

mod commands;

#[derive(Parser)]
#[command(
    name = "beejobs",
    version,
    about = "Job listings aggregator with a paced, retrying crawler",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); BEEJOBS_* environment variables otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl job listings into the database
    Crawl {
        /// Location to search
        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of result pages
        #[arg(short, long)]
        max_pages: Option<u32>,

        /// Repeat the crawl every N minutes until interrupted
        #[arg(long)]
        every: Option<u64>,
    },

    /// Search stored jobs
    Search {
        /// Text matched against title, company and description
        query: Option<String>,

        /// Location substring
        #[arg(short, long)]
        location: Option<String>,

        /// Job type (full-time, part-time, contract, internship, freelance)
        #[arg(long)]
        job_type: Option<JobType>,

        /// Category (Engineering, Marketing, Sales, Design, Product, Data, DevOps, Other)
        #[arg(long)]
        category: Option<Category>,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Results per page
        #[arg(long, default_value = "10")]
        limit: u32,

        /// Sort field (postedDate, title, company, createdAt)
        #[arg(long, default_value = "postedDate")]
        sort_by: SortField,

        /// Sort order (asc, desc)
        #[arg(long, default_value = "desc")]
        sort_order: SortOrder,

        /// Print the result page as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available filter values
    Filters,

    /// Show job store statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.sqlite_path = database;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&config, cli.verbose)?;

    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Crawl {
            location,
            max_pages,
            every,
        } => {
            tracing::info!(
                location = ?location,
                max_pages = ?max_pages,
                every = ?every,
                "Starting crawl command"
            );
            commands::crawl(config, location, max_pages, every).await?;
        }

        Commands::Search {
            query,
            location,
            job_type,
            category,
            page,
            limit,
            sort_by,
            sort_order,
            json,
        } => {
            let query = JobQuery {
                query,
                location,
                job_type,
                category,
                page,
                limit,
                sort_by,
                sort_order,
            };
            tracing::debug!(?query, "Starting search command");
            commands::search(config, query, json)?;
        }

        Commands::Filters => commands::filters(config)?,

        Commands::Stats => commands::stats(config)?,
    }

    Ok(())
}

fn setup_tracing(config: &Config, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("beejobs=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("beejobs={},warn", config.logging.level))
        })
    };

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use beejobs::config::Config;
use beejobs::crawler::{CrawlOutcome, CrawlReport, HttpSession, JobCrawler};
use beejobs::storage::{create_sqlite_store, SharedJobStore};

/// Run one crawl, or one every `every_minutes` until Ctrl-C
pub async fn crawl(
    config: Config,
    location: Option<String>,
    max_pages: Option<u32>,
    every_minutes: Option<u64>,
) -> Result<()> {
    let location = location.unwrap_or_else(|| config.crawler.location.clone());
    let max_pages = max_pages.unwrap_or(config.crawler.max_pages);

    let store = create_sqlite_store(&config.database.sqlite_path)
        .context("Failed to open job store")?;
    let crawler = JobCrawler::new(&config, store);

    println!("Starting job crawl");
    println!("==================");
    println!("  Site:      {}", config.crawler.base_url);
    println!("  Location:  {location}");
    println!("  Max pages: {max_pages}");

    let Some(minutes) = every_minutes else {
        let report = run_once(&config, &crawler, &location, max_pages).await?;
        print_report(&report);
        return Ok(());
    };

    let period = schedule_period(minutes)?;
    println!("  Every:     {minutes} min (Ctrl-C to stop)");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match run_once(&config, &crawler, &location, max_pages).await {
                    Ok(report) => print_report(&report),
                    Err(e) => tracing::error!(error = %e, "Scheduled crawl failed, waiting for next run"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping scheduled crawls");
                break;
            }
        }
    }

    Ok(())
}

/// Interval between scheduled crawls
fn schedule_period(minutes: u64) -> Result<Duration> {
    if minutes == 0 {
        anyhow::bail!("--every must be at least 1 minute");
    }
    let Some(secs) = minutes.checked_mul(60) else {
        anyhow::bail!("--every {minutes} is too large");
    };
    Ok(Duration::from_secs(secs))
}

async fn run_once(
    config: &Config,
    crawler: &JobCrawler,
    location: &str,
    max_pages: u32,
) -> Result<CrawlReport> {
    let session =
        HttpSession::new(config.crawler.rate_limit).context("Failed to create browser session")?;

    let report = crawler.crawl(Box::new(session), location, max_pages).await?;
    Ok(report)
}

fn print_report(report: &CrawlReport) {
    println!();
    println!("Crawl Summary");
    println!("=============");
    match report.outcome {
        CrawlOutcome::Done => println!("  Outcome:   done"),
        CrawlOutcome::StoppedEarly(reason) => println!("  Outcome:   stopped early ({reason})"),
    }
    println!("  Pages:     {}", report.pages_visited);
    println!("  Processed: {}", report.jobs_processed);
    println!("  Created:   {}", report.jobs_created);
    println!("  Updated:   {}", report.jobs_updated);
}

pub fn stats(config: Config) -> Result<()> {
    let path = &config.database.sqlite_path;
    if !path.exists() {
        println!("Database not found: {}", path.display());
        println!("Run a crawl first to create the database.");
        return Ok(());
    }

    let store: SharedJobStore = create_sqlite_store(path)?;
    let stats = store.stats()?;

    println!("Job Statistics");
    println!("==============");
    println!("Database: {}", path.display());
    println!();
    println!("Total jobs: {}", stats.total);

    println!();
    println!("By category:");
    for (category, count) in &stats.by_category {
        println!("  {category:<12} {count}");
    }

    println!();
    println!("By job type:");
    for (job_type, count) in &stats.by_job_type {
        println!("  {job_type:<12} {count}");
    }

    if let Some(last_updated) = stats.last_updated {
        println!();
        println!("Last updated: {}", last_updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

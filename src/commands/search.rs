use anyhow::{Context, Result};

use beejobs::config::Config;
use beejobs::storage::repository::MAX_PAGE_SIZE;
use beejobs::storage::{create_sqlite_store, JobQuery, SharedJobStore};

fn open_store(config: &Config) -> Result<Option<SharedJobStore>> {
    let path = &config.database.sqlite_path;
    if !path.exists() {
        println!("Database not found: {}", path.display());
        println!("Run 'beejobs crawl' first to create the database.");
        return Ok(None);
    }
    let store = create_sqlite_store(path).context("Failed to open job store")?;
    Ok(Some(store))
}

pub fn search(config: Config, query: JobQuery, json: bool) -> Result<()> {
    let Some(store) = open_store(&config)? else {
        return Ok(());
    };

    let page = store.search(&query).context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    println!(
        "Found {} jobs (page {} of {}):\n",
        page.total, page.page, page.total_pages
    );

    let offset = (page.page as usize - 1) * query.limit.clamp(1, MAX_PAGE_SIZE) as usize;
    for (i, job) in page.jobs.iter().enumerate() {
        println!("{}. {} at {}", offset + i + 1, job.title, job.company);
        println!(
            "   {} | {} | {}",
            job.location, job.job_type, job.category
        );
        if let Some(salary) = job.salary.as_deref().filter(|s| !s.is_empty()) {
            println!("   Salary: {salary}");
        }
        println!("   Posted: {}", job.posted_date);
        println!("   Apply:  {}", job.apply_url);
        println!();
    }

    Ok(())
}

pub fn filters(config: Config) -> Result<()> {
    let Some(store) = open_store(&config)? else {
        return Ok(());
    };

    let values = store.filter_values()?;

    println!("Job types:  {}", values.job_types.join(", "));
    println!("Categories: {}", values.categories.join(", "));
    println!("Locations:");
    for location in &values.locations {
        println!("  {location}");
    }

    Ok(())
}

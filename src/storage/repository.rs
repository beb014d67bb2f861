//! Repository Pattern for the job store
//!
//! The crawl engine only needs [`JobStore::upsert`]; the read side (search,
//! filter values, stats) backs the CLI queries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Crawl loop / CLI commands                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    JobStore trait                           │
//! └─────────────────────────────────────────────────────────────┘
//!                  ┌───────────┴───────────┐
//!                  ▼                       ▼
//!         ┌─────────────────┐     ┌─────────────────┐
//!         │     SQLite      │     │      Mock       │
//!         └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use beejobs::storage::repository::{JobStore, SqliteJobStore};
//!
//! let store = SqliteJobStore::new("data/jobs.db")?;
//! let outcome = store.upsert(&record.key("indeed"), &record)?;
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::heuristics::{infer_category, infer_job_type};
use crate::models::{Category, JobKey, JobRecord, JobType, StoredJob};
use crate::utils::error::StoreError;

// ============================================================================
// Core Types
// ============================================================================

/// Which branch an upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    PostedDate,
    Title,
    Company,
    CreatedAt,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            Self::PostedDate => "posted_date",
            Self::Title => "title",
            Self::Company => "company",
            Self::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "postedDate" | "posted_date" => Ok(Self::PostedDate),
            "title" => Ok(Self::Title),
            "company" => Ok(Self::Company),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Largest page size a search may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Search parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobQuery {
    /// Substring of title, company or description
    pub query: Option<String>,
    /// Substring of location
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub category: Option<Category>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            query: None,
            location: None,
            job_type: None,
            category: None,
            page: 1,
            limit: 10,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl JobQuery {
    fn page(&self) -> u32 {
        self.page.max(1)
    }

    fn limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }

    fn total_pages(&self, total: usize) -> u32 {
        let limit = self.limit() as usize;
        total.div_ceil(limit) as u32
    }

    fn text(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_lowercase)
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub jobs: Vec<StoredJob>,
    pub total: usize,
    pub page: u32,
    pub total_pages: u32,
}

/// Distinct values available for filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValues {
    pub job_types: Vec<String>,
    pub categories: Vec<String>,
    pub locations: Vec<String>,
}

/// Store-wide counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_job_type: BTreeMap<String, usize>,
    pub last_updated: Option<DateTime<Utc>>,
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Job storage keyed by `(source, source_id)`
pub trait JobStore: Send + Sync {
    /// Create the job if absent, refresh its mutable fields otherwise
    ///
    /// On create, a missing job type or category is inferred from title and
    /// description. On update, job type and category are never touched.
    fn upsert(&self, key: &JobKey, record: &JobRecord) -> Result<UpsertOutcome>;

    /// Get a job by natural key
    fn get(&self, key: &JobKey) -> Result<Option<StoredJob>>;

    /// Count stored jobs
    fn count(&self) -> Result<usize>;

    /// Filtered, sorted, paginated search
    fn search(&self, query: &JobQuery) -> Result<JobPage>;

    /// Distinct job types, categories and locations
    fn filter_values(&self) -> Result<FilterValues>;

    fn stats(&self) -> Result<StoreStats>;
}

fn validate_key(key: &JobKey) -> Result<()> {
    if key.source.trim().is_empty() || key.source_id.trim().is_empty() {
        return Err(StoreError::Rejected {
            key: key.to_string(),
            reason: "source and source id must be non-empty".to_string(),
        }
        .into());
    }
    Ok(())
}

fn creation_labels(record: &JobRecord) -> (JobType, Category) {
    let job_type = record
        .job_type
        .unwrap_or_else(|| infer_job_type(&record.title, &record.description));
    let category = record
        .category
        .unwrap_or_else(|| infer_category(&record.title, &record.description));
    (job_type, category)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of [`JobStore`]
///
/// Uses `Mutex` to serialize access to the connection; each upsert runs in
/// its own transaction.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

const JOB_COLUMNS: &str = "id, title, company, location, description, salary, job_type, \
     category, apply_url, posted_date, source, source_id, created_at, updated_at";

impl SqliteJobStore {
    /// Open (or create) the database at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite job store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned.into())
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS jobs (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    company TEXT NOT NULL,
                    location TEXT NOT NULL,
                    description TEXT NOT NULL,
                    salary TEXT,
                    job_type TEXT NOT NULL,
                    category TEXT NOT NULL,
                    apply_url TEXT NOT NULL,
                    posted_date TEXT NOT NULL,
                    source TEXT NOT NULL,
                    source_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (source, source_id)
                );

                CREATE INDEX IF NOT EXISTS idx_jobs_posted_date ON jobs(posted_date);
                CREATE INDEX IF NOT EXISTS idx_jobs_job_type ON jobs(job_type);
                CREATE INDEX IF NOT EXISTS idx_jobs_category ON jobs(category);
                "#,
        )?;

        Ok(())
    }
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<StoredJob> {
    let job_type: String = row.get(6)?;
    let category: String = row.get(7)?;
    let posted_date: String = row.get(9)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    let parse_time = |index: usize, value: &str| {
        DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(index, e.to_string()))
    };

    Ok(StoredJob {
        id: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        description: row.get(4)?,
        salary: row.get(5)?,
        job_type: job_type.parse().map_err(|e| conversion_error(6, e))?,
        category: category.parse().map_err(|e| conversion_error(7, e))?,
        apply_url: row.get(8)?,
        posted_date: NaiveDate::parse_from_str(&posted_date, "%Y-%m-%d")
            .map_err(|e| conversion_error(9, e.to_string()))?,
        source: row.get(10)?,
        source_id: row.get(11)?,
        created_at: parse_time(12, &created_at)?,
        updated_at: parse_time(13, &updated_at)?,
    })
}

fn count_by(conn: &Connection, column: &str) -> Result<BTreeMap<String, usize>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM jobs GROUP BY {column}"
    ))?;
    let counts = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
    Ok(counts)
}

/// `%text%` with LIKE wildcards in `text` matched literally under `ESCAPE '\'`
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn distinct(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {column} FROM jobs WHERE {column} <> '' ORDER BY {column}"
    ))?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values)
}

impl JobStore for SqliteJobStore {
    fn upsert(&self, key: &JobKey, record: &JobRecord) -> Result<UpsertOutcome> {
        validate_key(key)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existed: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE source = ?1 AND source_id = ?2)",
            params![key.source, key.source_id],
            |row| row.get(0),
        )?;

        let (job_type, category) = creation_labels(record);
        let now = timestamp(Utc::now());

        tx.execute(
            "INSERT INTO jobs (id, title, company, location, description, salary, job_type,
                               category, apply_url, posted_date, source, source_id,
                               created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             ON CONFLICT(source, source_id) DO UPDATE SET
                title = excluded.title,
                company = excluded.company,
                location = excluded.location,
                description = excluded.description,
                salary = excluded.salary,
                apply_url = excluded.apply_url,
                posted_date = excluded.posted_date,
                updated_at = excluded.updated_at",
            params![
                Uuid::new_v4().to_string(),
                record.title,
                record.company,
                record.location,
                record.description,
                record.salary,
                job_type.as_str(),
                category.as_str(),
                record.apply_url,
                record.posted_date.format("%Y-%m-%d").to_string(),
                key.source,
                key.source_id,
                now,
            ],
        )?;

        tx.commit()?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    fn get(&self, key: &JobKey) -> Result<Option<StoredJob>> {
        let conn = self.lock()?;
        let job = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE source = ?1 AND source_id = ?2"),
                params![key.source, key.source_id],
                row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn search(&self, query: &JobQuery) -> Result<JobPage> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(text) = JobQuery::text(&query.query) {
            clauses.push(format!(
                "(lower(title) LIKE ?{n} ESCAPE '\\' OR lower(company) LIKE ?{n} ESCAPE '\\' \
                 OR lower(description) LIKE ?{n} ESCAPE '\\')",
                n = values.len() + 1
            ));
            values.push(like_pattern(&text));
        }
        if let Some(location) = JobQuery::text(&query.location) {
            clauses.push(format!(
                "lower(location) LIKE ?{} ESCAPE '\\'",
                values.len() + 1
            ));
            values.push(like_pattern(&location));
        }
        if let Some(job_type) = query.job_type {
            clauses.push(format!("job_type = ?{}", values.len() + 1));
            values.push(job_type.as_str().to_string());
        }
        if let Some(category) = query.category {
            clauses.push(format!("category = ?{}", values.len() + 1));
            values.push(category.as_str().to_string());
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let direction = match query.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM jobs {filter}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs {filter}
             ORDER BY {column} {direction}, source_id ASC
             LIMIT {limit} OFFSET {offset}",
            column = query.sort_by.column(),
            limit = query.limit(),
            offset = query.offset(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params_from_iter(values.iter()), row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let total = total as usize;
        Ok(JobPage {
            jobs,
            total,
            page: query.page(),
            total_pages: query.total_pages(total),
        })
    }

    fn filter_values(&self) -> Result<FilterValues> {
        let conn = self.lock()?;
        Ok(FilterValues {
            job_types: distinct(&conn, "job_type")?,
            categories: distinct(&conn, "category")?,
            locations: distinct(&conn, "location")?,
        })
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        let last_updated: Option<String> =
            conn.query_row("SELECT MAX(updated_at) FROM jobs", [], |row| row.get(0))?;
        let last_updated = last_updated
            .map(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| Error::with_source("Invalid updated_at in jobs table", e))
            })
            .transpose()?;

        Ok(StoreStats {
            total: total as usize,
            by_category: count_by(&conn, "category")?,
            by_job_type: count_by(&conn, "job_type")?,
            last_updated,
        })
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of [`JobStore`]
///
/// Failures queued with [`MockJobStore::fail_next`] are returned by the next
/// upserts, one per call, before any record is touched.
#[derive(Default)]
pub struct MockJobStore {
    jobs: RwLock<HashMap<JobKey, StoredJob>>,
    failures: Mutex<VecDeque<Error>>,
    upsert_calls: Mutex<usize>,
}

impl MockJobStore {
    /// Create a new mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next upsert fail with `error`
    pub fn fail_next(&self, error: impl Into<Error>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error.into());
        }
    }

    /// Upsert calls made so far, failed ones included
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.lock().map(|c| *c).unwrap_or(0)
    }

    /// Get the number of stored jobs
    pub fn len(&self) -> usize {
        self.jobs.read().map(|j| j.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<JobKey, StoredJob>>> {
        self.jobs.read().map_err(|_| StoreError::Poisoned.into())
    }

    fn matches(job: &StoredJob, query: &JobQuery) -> bool {
        let text_ok = JobQuery::text(&query.query).map_or(true, |text| {
            job.title.to_lowercase().contains(&text)
                || job.company.to_lowercase().contains(&text)
                || job.description.to_lowercase().contains(&text)
        });
        let location_ok = JobQuery::text(&query.location)
            .map_or(true, |location| job.location.to_lowercase().contains(&location));

        text_ok
            && location_ok
            && query.job_type.map_or(true, |t| job.job_type == t)
            && query.category.map_or(true, |c| job.category == c)
    }
}

impl JobStore for MockJobStore {
    fn upsert(&self, key: &JobKey, record: &JobRecord) -> Result<UpsertOutcome> {
        if let Ok(mut calls) = self.upsert_calls.lock() {
            *calls += 1;
        }
        if let Some(error) = self
            .failures
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .pop_front()
        {
            return Err(error);
        }

        validate_key(key)?;

        let mut jobs = self.jobs.write().map_err(|_| StoreError::Poisoned)?;
        let now = Utc::now();

        if let Some(existing) = jobs.get_mut(key) {
            existing.title = record.title.clone();
            existing.company = record.company.clone();
            existing.location = record.location.clone();
            existing.description = record.description.clone();
            existing.salary = record.salary.clone();
            existing.apply_url = record.apply_url.clone();
            existing.posted_date = record.posted_date;
            existing.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        let (job_type, category) = creation_labels(record);
        jobs.insert(
            key.clone(),
            StoredJob {
                id: Uuid::new_v4().to_string(),
                title: record.title.clone(),
                company: record.company.clone(),
                location: record.location.clone(),
                description: record.description.clone(),
                salary: record.salary.clone(),
                job_type,
                category,
                apply_url: record.apply_url.clone(),
                posted_date: record.posted_date,
                source: key.source.clone(),
                source_id: key.source_id.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(UpsertOutcome::Created)
    }

    fn get(&self, key: &JobKey) -> Result<Option<StoredJob>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn search(&self, query: &JobQuery) -> Result<JobPage> {
        let jobs = self.read()?;
        let mut matched: Vec<StoredJob> = jobs
            .values()
            .filter(|job| Self::matches(job, query))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match query.sort_by {
                SortField::PostedDate => a.posted_date.cmp(&b.posted_date),
                SortField::Title => a.title.cmp(&b.title),
                SortField::Company => a.company.cmp(&b.company),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            let ordering = match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.source_id.cmp(&b.source_id))
        });

        let total = matched.len();
        let jobs = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();

        Ok(JobPage {
            jobs,
            total,
            page: query.page(),
            total_pages: query.total_pages(total),
        })
    }

    fn filter_values(&self) -> Result<FilterValues> {
        let jobs = self.read()?;
        let collect = |f: fn(&StoredJob) -> String| {
            let mut values: Vec<String> = jobs
                .values()
                .map(f)
                .filter(|v| !v.is_empty())
                .collect();
            values.sort();
            values.dedup();
            values
        };

        Ok(FilterValues {
            job_types: collect(|j| j.job_type.as_str().to_string()),
            categories: collect(|j| j.category.as_str().to_string()),
            locations: collect(|j| j.location.clone()),
        })
    }

    fn stats(&self) -> Result<StoreStats> {
        let jobs = self.read()?;
        let mut stats = StoreStats {
            total: jobs.len(),
            ..Default::default()
        };

        for job in jobs.values() {
            *stats
                .by_category
                .entry(job.category.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_job_type
                .entry(job.job_type.as_str().to_string())
                .or_default() += 1;
            stats.last_updated = stats.last_updated.max(Some(job.updated_at));
        }

        Ok(stats)
    }
}

// ============================================================================
// Shared Store Types
// ============================================================================

/// Thread-safe shared store handle
pub type SharedJobStore = Arc<dyn JobStore>;

/// Create a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> Result<SharedJobStore> {
    let store = SqliteJobStore::new(path)?;
    Ok(Arc::new(store))
}

/// Create a shared mock store
pub fn create_mock_store() -> SharedJobStore {
    Arc::new(MockJobStore::new())
}

// ============================================================================
// Tests
// ============================================================================

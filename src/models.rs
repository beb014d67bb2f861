// Core data structures for beejobs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Source tag for every record crawled from the listings site
pub const SOURCE_INDEED: &str = "indeed";

/// Job posting as extracted from the listings site
///
/// Listing extraction fills everything but `description`; the detail
/// enricher fills `description`; `job_type`/`category` are only backfilled
/// when the record is first stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary: Option<String>,
    pub job_type: Option<JobType>,
    pub category: Option<Category>,
    pub apply_url: String,
    pub posted_date: NaiveDate,
    pub source_id: String, // value of the `jk` query parameter
}

impl JobRecord {
    /// Natural key of this record under the given source tag
    pub fn key(&self, source: &str) -> JobKey {
        JobKey::new(source, &self.source_id)
    }
}

/// Natural key `(source, source_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobKey {
    pub source: String,
    pub source_id: String,
}

impl JobKey {
    pub fn new(source: &str, source_id: &str) -> Self {
        Self {
            source: source.to_string(),
            source_id: source_id.to_string(),
        }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source, self.source_id)
    }
}

/// A job as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredJob {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary: Option<String>,
    pub job_type: JobType,
    pub category: Category,
    pub apply_url: String,
    pub posted_date: NaiveDate,
    pub source: String,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
    #[serde(rename = "contract")]
    Contract,
    #[serde(rename = "internship")]
    Internship,
    #[serde(rename = "freelance")]
    Freelance,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Contract => "contract",
            Self::Internship => "internship",
            Self::Freelance => "freelance",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::FullTime,
            Self::PartTime,
            Self::Contract,
            Self::Internship,
            Self::Freelance,
        ]
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown job type: {s}"))
    }
}

/// Job category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Engineering,
    Marketing,
    Sales,
    Design,
    Product,
    Data,
    DevOps,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::Marketing => "Marketing",
            Self::Sales => "Sales",
            Self::Design => "Design",
            Self::Product => "Product",
            Self::Data => "Data",
            Self::DevOps => "DevOps",
            Self::Other => "Other",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Engineering,
            Self::Marketing,
            Self::Sales,
            Self::Design,
            Self::Product,
            Self::Data,
            Self::DevOps,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

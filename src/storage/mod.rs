//! Persistence of crawled jobs
//!
//! [`JobPersister`] upserts one page's batch into a [`JobStore`] under the
//! crawler's source tag.

pub mod repository;

pub use repository::{
    create_mock_store, create_sqlite_store, FilterValues, JobPage, JobQuery, JobStore,
    MockJobStore, SharedJobStore, SortField, SortOrder, SqliteJobStore, StoreStats,
    UpsertOutcome,
};

use tracing::{debug, info};

use crate::error::Result;
use crate::models::JobRecord;

/// Created/updated counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub created: usize,
    pub updated: usize,
}

impl PersistReport {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Upserts batches of records for one source
pub struct JobPersister {
    store: SharedJobStore,
    source: String,
}

impl JobPersister {
    pub fn new(store: SharedJobStore, source: impl Into<String>) -> Self {
        Self {
            store,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Upsert every record in order, stopping at the first failure
    ///
    /// Re-running a partially applied batch is safe: records already written
    /// are updated in place.
    pub fn persist(&self, batch: &[JobRecord]) -> Result<PersistReport> {
        let mut report = PersistReport::default();

        for record in batch {
            let key = record.key(&self.source);
            match self.store.upsert(&key, record)? {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
            debug!(key = %key, title = %record.title, "Saved job");
        }

        info!(
            source = %self.source,
            created = report.created,
            updated = report.updated,
            "Persisted batch"
        );
        Ok(report)
    }
}

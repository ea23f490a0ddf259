//! External store adapters.
//!
//! Two collaborators: the Notion database holding pass-request records
//! and the Supabase Postgres instance holding the student roster. Both
//! sit behind traits so the report pipeline and the HTTP handlers can be
//! exercised against in-memory fakes.

pub mod notion;
pub mod roster;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{PassRequest, Status, Student};

pub use notion::NotionStore;
pub use roster::{build_catalog, PgRosterStore, RosterCatalog};

/// Filter parameters for a request-store query. All supplied filters
/// combine with AND; the statuses and directions are each OR-combined
/// internally, and the search term fans out across the string fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    /// Inclusive lower bound, calendar-day granularity.
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound, calendar-day granularity.
    pub to_date: Option<NaiveDate>,
    pub group: Option<String>,
    pub student: Option<String>,
    pub statuses: Vec<Status>,
    pub directions: Vec<String>,
    pub search_term: Option<String>,
}

impl RequestFilter {
    pub fn is_empty(&self) -> bool {
        *self == RequestFilter::default()
    }
}

/// A new pass request as submitted by the intake form.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPassRequest {
    pub direction: String,
    pub group: String,
    pub student_fio: String,
    pub reason: String,
}

/// Read/write access to the pass-request store.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Query requests matching `filter`, sorted by submission date
    /// descending, following pagination until exhausted. Any transport
    /// or query failure is an error; never a partial result.
    async fn query(&self, filter: &RequestFilter) -> Result<Vec<PassRequest>>;

    /// Create a new record with status `Pending` and today's submission
    /// date. Returns the store-assigned id.
    async fn create(&self, submission: &NewPassRequest) -> Result<String>;

    /// Single-field status update on one record.
    async fn update_status(&self, id: &str, status: Status) -> Result<()>;

    /// All requests whose student name contains `name`, every page
    /// concatenated. `cancel` is checked between pages; a cancelled
    /// fetch returns [`crate::Error::Cancelled`] instead of data.
    async fn student_history(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PassRequest>>;
}

/// Read-only access to the student roster.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn students(&self) -> Result<Vec<Student>>;

    /// Whether the exact (name, group) pair exists in the roster.
    async fn contains(&self, name: &str, group: &str) -> Result<bool>;
}

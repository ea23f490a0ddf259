//! The in-memory report view: holds the fetched result set, the local
//! filter selections, and the sort state, and derives the displayable
//! ordered rows.
//!
//! Group and student selections are applied server-side when fetching;
//! locally they only participate in facet reconciliation. The local
//! filter pipeline narrows in a fixed order: status set, then free-text
//! search, then direction set.

use std::cmp::Ordering;

use super::facets::ReportFacets;
use crate::error::Result;
use crate::model::{PassRequest, Status};
use crate::store::{RequestFilter, RequestStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Fio,
    Reason,
    Status,
    Group,
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Filter selections local to the view. `None` group/student means the
/// "all" sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilters {
    pub group: Option<String>,
    pub student: Option<String>,
    pub statuses: Vec<Status>,
    pub directions: Vec<String>,
    pub search_term: String,
}

impl ViewFilters {
    /// The server-side query matching these selections plus a date range.
    pub fn to_request_filter(
        &self,
        from_date: Option<chrono::NaiveDate>,
        to_date: Option<chrono::NaiveDate>,
    ) -> RequestFilter {
        RequestFilter {
            from_date,
            to_date,
            group: self.group.clone(),
            student: self.student.clone(),
            statuses: self.statuses.clone(),
            directions: self.directions.clone(),
            search_term: if self.search_term.is_empty() {
                None
            } else {
                Some(self.search_term.clone())
            },
        }
    }
}

pub struct ReportView {
    records: Vec<PassRequest>,
    pub filters: ViewFilters,
    sort: Option<(SortField, SortDirection)>,
}

impl Default for ReportView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportView {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            filters: ViewFilters::default(),
            // freshest submissions first by default
            sort: Some((SortField::Date, SortDirection::Desc)),
        }
    }

    pub fn records(&self) -> &[PassRequest] {
        &self.records
    }

    pub fn sort(&self) -> Option<(SortField, SortDirection)> {
        self.sort
    }

    /// Replace the result set wholesale and reconcile filter selections
    /// against the fresh facets: a selected value that no longer occurs
    /// resets to "all" instead of silently filtering out everything.
    pub fn set_records(&mut self, records: Vec<PassRequest>) {
        self.records = records;
        self.reconcile_filters();
    }

    /// Fetch through the store with the current selections and replace
    /// the result set.
    pub async fn refresh(
        &mut self,
        store: &dyn RequestStore,
        from_date: Option<chrono::NaiveDate>,
        to_date: Option<chrono::NaiveDate>,
    ) -> Result<()> {
        let filter = self.filters.to_request_filter(from_date, to_date);
        let records = store.query(&filter).await?;
        self.set_records(records);
        Ok(())
    }

    pub fn facets(&self) -> ReportFacets {
        ReportFacets::derive(&self.records)
    }

    /// Toggling the active sort field flips its direction; choosing a
    /// new field resets to ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = match self.sort {
            Some((current, direction)) if current == field => Some((field, direction.flip())),
            _ => Some((field, SortDirection::Asc)),
        };
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn reset_filters(&mut self) {
        self.filters = ViewFilters::default();
        self.sort = None;
    }

    /// The displayable rows: filtered, then stably sorted.
    pub fn rows(&self) -> Vec<PassRequest> {
        let mut rows = apply_filters(&self.records, &self.filters);
        if let Some((field, direction)) = self.sort {
            sort_records(&mut rows, field, direction);
        }
        rows
    }

    /// Confirmed status transition: the store round trip completes
    /// first, and only then is the matched record patched in place. On
    /// failure the list is untouched and the error propagates.
    pub async fn update_status(
        &mut self,
        store: &dyn RequestStore,
        id: &str,
        status: Status,
    ) -> Result<()> {
        store.update_status(id, status).await?;
        if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
            record.status = status;
        }
        Ok(())
    }

    fn reconcile_filters(&mut self) {
        let facets = ReportFacets::derive(&self.records);

        if let Some(group) = &self.filters.group {
            if !facets.groups.iter().any(|f| &f.value == group) {
                self.filters.group = None;
            }
        }
        if let Some(student) = &self.filters.student {
            if !facets.students.iter().any(|f| &f.value == student) {
                self.filters.student = None;
            }
        }
        self.filters
            .directions
            .retain(|d| facets.directions.iter().any(|f| &f.value == d));
    }
}

/// Narrow `records` by the local filter stages, in order: status-set
/// membership, case-insensitive substring match across all field
/// values, direction-set membership.
pub fn apply_filters(records: &[PassRequest], filters: &ViewFilters) -> Vec<PassRequest> {
    let term = filters.search_term.to_lowercase();

    records
        .iter()
        .filter(|r| filters.statuses.is_empty() || filters.statuses.contains(&r.status))
        .filter(|r| term.is_empty() || haystack(r).iter().any(|v| v.to_lowercase().contains(&term)))
        .filter(|r| filters.directions.is_empty() || filters.directions.contains(&r.direction))
        .cloned()
        .collect()
}

fn haystack(record: &PassRequest) -> [&str; 7] {
    [
        &record.id,
        &record.date,
        &record.fio,
        &record.reason,
        record.status.as_str(),
        &record.group,
        &record.direction,
    ]
}

/// Stable single-field sort. Dates compare chronologically with the
/// sentinel as epoch zero; strings compare case-folded.
pub fn sort_records(records: &mut [PassRequest], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ordering = compare_field(a, b, field);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_field(a: &PassRequest, b: &PassRequest, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.date_value().cmp(&b.date_value()),
        SortField::Fio => fold_cmp(&a.fio, &b.fio),
        SortField::Reason => fold_cmp(&a.reason, &b.reason),
        SortField::Status => fold_cmp(a.status.as_str(), b.status.as_str()),
        SortField::Group => fold_cmp(&a.group, &b.group),
        SortField::Direction => fold_cmp(&a.direction, &b.direction),
    }
}

fn fold_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

//! Per-student statistics: paged history fetch, summary aggregation,
//! and the abort-superseded-request discipline.
//!
//! A [`StatsSession`] owns at most one in-flight fetch. Issuing a new
//! load cancels the previous token and bumps a generation counter; a
//! superseded load can never publish its (now stale) result, no matter
//! when it resolves.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::model::{PassRequest, StatusCounts, StudentSummary, NA, REASON_OTHER};
use crate::store::RequestStore;

/// Stats payload: the summary plus the raw matched requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStats {
    pub summary: StudentSummary,
    pub requests: Vec<PassRequest>,
}

/// Fetch every request for `name` and aggregate. Zero matches is a
/// reportable not-found condition, not an empty success.
pub async fn fetch_student_stats(
    store: &dyn RequestStore,
    name: &str,
    cancel: &CancellationToken,
) -> Result<StudentStats> {
    let requests = store.student_history(name, cancel).await?;
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if requests.is_empty() {
        return Err(Error::NotFound(format!(
            "no pass requests found for student \"{name}\""
        )));
    }

    let summary = summarize(&requests).ok_or_else(|| {
        Error::NotFound(format!("no pass requests found for student \"{name}\""))
    })?;

    Ok(StudentStats { summary, requests })
}

/// Aggregate one student's requests. Returns `None` for an empty slice.
///
/// First/last request dates come from a copy sorted ascending by date,
/// with sentinel dates treated as earliest. Reason buckets are the
/// literal reason strings; no merging of near-duplicate free text.
pub fn summarize(requests: &[PassRequest]) -> Option<StudentSummary> {
    let first = requests.first()?;

    let mut status_counts = StatusCounts::default();
    let mut reason_counts = std::collections::BTreeMap::new();
    for request in requests {
        status_counts.bump(request.status);
        let reason = if request.reason.is_empty() {
            REASON_OTHER
        } else {
            &request.reason
        };
        *reason_counts.entry(reason.to_string()).or_insert(0) += 1;
    }

    let mut by_date = requests.to_vec();
    by_date.sort_by_key(PassRequest::date_value);

    Some(StudentSummary {
        name: first.fio.clone(),
        group: first.group.clone(),
        direction: first.direction.clone(),
        total_requests: requests.len(),
        status_counts,
        reason_counts,
        first_request_date: by_date.first().map(|r| r.date.clone()).unwrap_or_else(|| NA.to_string()),
        last_request_date: by_date.last().map(|r| r.date.clone()).unwrap_or_else(|| NA.to_string()),
    })
}

struct SessionInner {
    current: Option<CancellationToken>,
    generation: u64,
    latest: Option<(String, StudentStats)>,
}

/// At-most-one in-flight stats fetch, newest wins.
pub struct StatsSession {
    store: Arc<dyn RequestStore>,
    inner: Mutex<SessionInner>,
}

impl StatsSession {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(SessionInner {
                current: None,
                generation: 0,
                latest: None,
            }),
        }
    }

    /// Load stats for `name`, cancelling any in-flight load first. A
    /// load that was superseded while running resolves to
    /// [`Error::Cancelled`] and leaves the published result untouched.
    pub async fn load(&self, name: &str) -> Result<StudentStats> {
        let (token, generation) = {
            let mut inner = self.inner.lock().unwrap();
            if let Some(previous) = inner.current.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            inner.current = Some(token.clone());
            inner.generation += 1;
            (token, inner.generation)
        };

        let outcome = fetch_student_stats(self.store.as_ref(), name, &token).await;

        let mut inner = self.inner.lock().unwrap();
        if inner.generation != generation || token.is_cancelled() {
            // a newer load took over while we were in flight
            return Err(Error::Cancelled);
        }
        inner.current = None;

        match outcome {
            Ok(stats) => {
                inner.latest = Some((name.to_string(), stats.clone()));
                Ok(stats)
            }
            Err(err) => {
                inner.latest = None;
                Err(err)
            }
        }
    }

    /// Abort the in-flight fetch, if any (e.g. the stats panel closed).
    pub fn abort(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(token) = inner.current.take() {
            token.cancel();
        }
        inner.generation += 1;
    }

    /// The most recently published (student, stats) pair.
    pub fn latest(&self) -> Option<(String, StudentStats)> {
        self.inner.lock().unwrap().latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn request(date: &str, status: Status, reason: &str) -> PassRequest {
        PassRequest {
            id: format!("{date}-{reason}"),
            date: date.to_string(),
            fio: "Anna Smirnova".to_string(),
            reason: reason.to_string(),
            status,
            group: "MGM-101".to_string(),
            direction: "Management".to_string(),
        }
    }

    #[test]
    fn summary_counts_and_date_span() {
        let requests = vec![
            request("2024-02-10", Status::Approved, "Illness"),
            request("2024-01-05", Status::Pending, "Illness"),
            request("2024-03-01", Status::Rejected, "Driving lessons"),
        ];
        let summary = summarize(&requests).unwrap();

        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.status_counts.total(), 3);
        assert_eq!(summary.status_counts.get(Status::Approved), 1);
        assert_eq!(summary.reason_counts["Illness"], 2);
        assert_eq!(summary.reason_counts["Driving lessons"], 1);
        assert_eq!(summary.first_request_date, "2024-01-05");
        assert_eq!(summary.last_request_date, "2024-03-01");
    }

    #[test]
    fn sentinel_dates_sort_as_earliest() {
        let requests = vec![
            request("2024-02-10", Status::Pending, "Illness"),
            request(NA, Status::Pending, "Illness"),
        ];
        let summary = summarize(&requests).unwrap();
        assert_eq!(summary.first_request_date, NA);
        assert_eq!(summary.last_request_date, "2024-02-10");
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(summarize(&[]).is_none());
    }
}

//! Core data model: pass requests, the student roster, and the derived
//! summary/facet shapes used by the report pipeline.
//!
//! Normalization happens exactly once, at the store-adapter boundary;
//! everything downstream can rely on the invariants here (status is
//! always one of three values, text fields carry the `N/A` sentinel
//! instead of being absent).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for a field the store could not provide.
pub const NA: &str = "N/A";

/// Fallback reason bucket, also the free-text escape hatch on the form.
pub const REASON_OTHER: &str = "Other";

/// Master list of recognized program directions. The direction facet is
/// restricted to these; anything else in the data is ignored by the
/// facet but still displayed on the record.
pub const DIRECTIONS: [&str; 5] = [
    "Management",
    "Psychology",
    "Conflictology",
    "Jurisprudence",
    "Social Work",
];

/// Fixed reason choices offered by the intake form. "Other" unlocks a
/// free-text reason, which is stored verbatim.
pub const REASON_OPTIONS: [&str; 5] = [
    "Illness",
    "Family circumstances",
    "Medical appointment",
    "Academic activity",
    REASON_OTHER,
];

/// Review status of a pass request. Exactly three values; anything the
/// store hands us that is not one of them normalizes to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Approved,
    Rejected,
    Pending,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Approved, Status::Rejected, Status::Pending];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
            Status::Pending => "Pending",
        }
    }

    /// Strict parse of a canonical status string. Used at the API
    /// boundary, where an unknown value is a validation error.
    pub fn parse(raw: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Lenient normalization for data read back from the store: missing
    /// or unrecognized values become `Pending`.
    pub fn normalize(raw: Option<&str>) -> Status {
        raw.and_then(Status::parse).unwrap_or(Status::Pending)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pass request as normalized from the external store.
///
/// `date` keeps the store's ISO-8601 text (date-only or full timestamp)
/// with `N/A` as the sentinel; [`PassRequest::date_value`] derives the
/// comparable instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRequest {
    pub id: String,
    pub date: String,
    pub fio: String,
    pub reason: String,
    pub status: Status,
    pub group: String,
    pub direction: String,
}

impl PassRequest {
    /// Comparable submission instant. Sentinel or unparseable dates sort
    /// as epoch zero, i.e. before everything real.
    pub fn date_value(&self) -> DateTime<Utc> {
        parse_date_value(&self.date)
    }
}

/// Parse a stored date string: RFC 3339 first, then bare calendar day.
pub fn parse_date_value(raw: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }
    DateTime::<Utc>::UNIX_EPOCH
}

/// Roster entry. Direction is derived from the group code, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub group: String,
}

/// Derive the program direction from a group code: the first three
/// characters, uppercased, looked up in the fixed prefix table.
/// Unrecognized prefixes pass through as their own label.
pub fn direction_for_group(group: &str) -> String {
    let prefix: String = group.chars().take(3).collect::<String>().to_uppercase();
    let known = match prefix.as_str() {
        "MGM" => "Management",
        "PSY" => "Psychology",
        "CFL" => "Conflictology",
        "LAW" => "Jurisprudence",
        "SWK" => "Social Work",
        _ => return prefix,
    };
    known.to_string()
}

/// Status histogram with all three keys always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "Approved")]
    pub approved: u32,
    #[serde(rename = "Rejected")]
    pub rejected: u32,
    #[serde(rename = "Pending")]
    pub pending: u32,
}

impl StatusCounts {
    pub fn bump(&mut self, status: Status) {
        match status {
            Status::Approved => self.approved += 1,
            Status::Rejected => self.rejected += 1,
            Status::Pending => self.pending += 1,
        }
    }

    pub fn get(&self, status: Status) -> u32 {
        match status {
            Status::Approved => self.approved,
            Status::Rejected => self.rejected,
            Status::Pending => self.pending,
        }
    }

    pub fn total(&self) -> u32 {
        self.approved + self.rejected + self.pending
    }
}

/// Per-student aggregate over all of their pass requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub name: String,
    pub group: String,
    pub direction: String,
    pub total_requests: usize,
    pub status_counts: StatusCounts,
    /// Keys are the literal reason strings; free-text reasons each form
    /// their own bucket. Only reasons that occurred appear.
    pub reason_counts: std::collections::BTreeMap<String, u32>,
    pub first_request_date: String,
    pub last_request_date: String,
}

/// One selectable value in a filter facet, with its occurrence count in
/// the current result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    pub count: usize,
}

//! Facet derivation over the current result set.
//!
//! Each facet lists the distinct values present in the records with
//! occurrence counts, feeding the filter UI. The status facet always
//! carries all three canonical statuses; the direction facet is
//! restricted to the recognized master list and drops zero-count
//! entries.

use std::collections::BTreeMap;

use crate::model::{FacetOption, PassRequest, Status, DIRECTIONS, NA};

/// All four facet lists for one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFacets {
    pub groups: Vec<FacetOption>,
    pub students: Vec<FacetOption>,
    pub statuses: Vec<FacetOption>,
    pub directions: Vec<FacetOption>,
}

impl ReportFacets {
    pub fn derive(records: &[PassRequest]) -> Self {
        Self {
            groups: group_facets(records),
            students: student_facets(records),
            statuses: status_facets(records),
            directions: direction_facets(records),
        }
    }
}

/// Distinct non-sentinel groups with counts, sorted by case-folded label.
pub fn group_facets(records: &[PassRequest]) -> Vec<FacetOption> {
    value_facets(records, |r| r.group.as_str())
}

/// Distinct non-sentinel student names with counts.
pub fn student_facets(records: &[PassRequest]) -> Vec<FacetOption> {
    value_facets(records, |r| r.fio.as_str())
}

/// All three canonical statuses, zero counts included.
pub fn status_facets(records: &[PassRequest]) -> Vec<FacetOption> {
    Status::ALL
        .into_iter()
        .map(|status| FacetOption {
            value: status.as_str().to_string(),
            label: status.as_str().to_string(),
            count: records.iter().filter(|r| r.status == status).count(),
        })
        .collect()
}

/// Recognized directions present in the records, master-list order,
/// zero-count entries excluded.
pub fn direction_facets(records: &[PassRequest]) -> Vec<FacetOption> {
    DIRECTIONS
        .iter()
        .map(|direction| FacetOption {
            value: direction.to_string(),
            label: direction.to_string(),
            count: records.iter().filter(|r| r.direction == *direction).count(),
        })
        .filter(|facet| facet.count > 0)
        .collect()
}

fn value_facets<'a>(
    records: &'a [PassRequest],
    field: impl Fn(&'a PassRequest) -> &'a str,
) -> Vec<FacetOption> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let value = field(record);
        if !value.is_empty() && value != NA {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut facets: Vec<FacetOption> = counts
        .into_iter()
        .map(|(value, count)| FacetOption {
            value: value.to_string(),
            label: value.to_string(),
            count,
        })
        .collect();
    facets.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    facets
}

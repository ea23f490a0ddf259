//! Report aggregation pipeline: facet derivation, compound filtering,
//! stable sorting, and per-student statistics.

pub mod facets;
pub mod stats;
pub mod view;

pub use facets::{direction_facets, group_facets, status_facets, student_facets, ReportFacets};
pub use stats::{fetch_student_stats, summarize, StatsSession, StudentStats};
pub use view::{ReportView, SortDirection, SortField, ViewFilters};

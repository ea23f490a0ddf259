//! PDF export endpoint: either a filter set rendered through the fixed
//! report template, or a raw HTML document rendered verbatim.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::Status;
use crate::state::AppState;
use crate::store::RequestFilter;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExportBody {
    Html(RawHtml),
    Report(ReportParams),
}

#[derive(Debug, Deserialize)]
pub struct RawHtml {
    pub html: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub group: Option<String>,
    pub student: Option<String>,
    pub status: Vec<String>,
    pub direction: Vec<String>,
    pub search_term: Option<String>,
}

impl ReportParams {
    fn into_filter(self) -> Result<RequestFilter> {
        let statuses = self
            .status
            .iter()
            .map(|raw| {
                Status::parse(raw)
                    .ok_or_else(|| Error::Validation(format!("unknown status filter: \"{raw}\"")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RequestFilter {
            from_date: self.from_date,
            to_date: self.to_date,
            group: self.group.filter(|g| !g.is_empty() && g != "all"),
            student: self.student.filter(|s| !s.is_empty() && s != "all"),
            statuses,
            directions: self.direction,
            search_term: self.search_term.filter(|t| !t.is_empty()),
        })
    }
}

/// `POST /api/export/pdf` — binary PDF, delivered as an attachment.
pub async fn export_pdf(
    State(state): State<AppState>,
    Json(body): Json<ExportBody>,
) -> Result<Response> {
    let html = match body {
        ExportBody::Html(raw) => {
            if raw.html.trim().is_empty() {
                return Err(Error::Validation("html must not be empty".to_string()));
            }
            raw.html
        }
        ExportBody::Report(params) => {
            let filter = params.into_filter()?;
            let records = state.requests.query(&filter).await?;
            state
                .template
                .render(&records, filter.from_date, filter.to_date)?
        }
    };

    let pdf = state.pdf.render_html(&html).await?;
    info!(bytes = pdf.len(), "pdf export rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.pdf\"",
            ),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_with_html_key_is_the_raw_variant() {
        let body: ExportBody = serde_json::from_str(r#"{"html": "<p>hi</p>"}"#).unwrap();
        assert!(matches!(body, ExportBody::Html(_)));
    }

    #[test]
    fn filter_object_is_the_report_variant() {
        let body: ExportBody =
            serde_json::from_str(r#"{"fromDate": "2024-01-01", "status": ["Approved"]}"#).unwrap();
        let ExportBody::Report(params) = body else {
            panic!("expected report params");
        };
        let filter = params.into_filter().unwrap();
        assert_eq!(filter.from_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.statuses, vec![Status::Approved]);
    }

    #[test]
    fn empty_body_means_unfiltered_report() {
        let body: ExportBody = serde_json::from_str("{}").unwrap();
        let ExportBody::Report(params) = body else {
            panic!("expected report params");
        };
        assert!(params.into_filter().unwrap().is_empty());
    }

    #[test]
    fn unknown_status_in_filters_is_rejected() {
        let params = ReportParams {
            status: vec!["Escalated".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            params.into_filter().unwrap_err(),
            Error::Validation(_)
        ));
    }
}

//! Pass-request endpoints: list with filters, intake submission, and
//! the single-field status update.

use axum::extract::{RawQuery, State};
use axum::response::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{PassRequest, Status};
use crate::state::AppState;
use crate::store::{NewPassRequest, RequestFilter};

/// `GET /api/requests` — filtered list, date-descending.
///
/// `status` and `direction` may repeat; `group`/`student` accept the
/// `all` sentinel; dates are `YYYY-MM-DD`.
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<PassRequest>>> {
    let filter = parse_request_query(query.as_deref().unwrap_or(""))?;
    let requests = state.requests.query(&filter).await?;
    Ok(Json(requests))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub id: String,
}

/// `POST /api/requests` — intake submission. The (student, group) pair
/// must exist in the roster; the new record starts as `Pending`.
pub async fn submit(
    State(state): State<AppState>,
    Json(submission): Json<NewPassRequest>,
) -> Result<Json<SubmitResponse>> {
    for (field, value) in [
        ("direction", &submission.direction),
        ("group", &submission.group),
        ("studentFio", &submission.student_fio),
        ("reason", &submission.reason),
    ] {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("missing required field: {field}")));
        }
    }

    let known = state
        .roster
        .contains(&submission.student_fio, &submission.group)
        .await?;
    if !known {
        return Err(Error::NotFound(format!(
            "student \"{}\" in group \"{}\" not found",
            submission.student_fio, submission.group
        )));
    }

    let id = state.requests.create(&submission).await?;
    info!(%id, student = %submission.student_fio, "pass request submitted");

    Ok(Json(SubmitResponse {
        message: "pass request submitted".to_string(),
        id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub id: String,
    pub status: String,
}

/// `POST /api/requests/status` — canonical statuses only.
pub async fn update_status(
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Value>> {
    if body.id.trim().is_empty() {
        return Err(Error::Validation("missing request id".to_string()));
    }
    let status = Status::parse(&body.status).ok_or_else(|| {
        Error::Validation(format!(
            "status must be one of Approved, Rejected, Pending; got \"{}\"",
            body.status
        ))
    })?;

    state.requests.update_status(&body.id, status).await?;
    info!(id = %body.id, %status, "request status updated");

    Ok(Json(json!({"message": "status updated"})))
}

/// Parse the list query string. Repeated keys accumulate; unknown keys
/// are ignored; empty values and the `all` sentinel mean "no filter".
pub fn parse_request_query(query: &str) -> Result<RequestFilter> {
    let mut filter = RequestFilter::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        match key.as_ref() {
            "fromDate" => filter.from_date = Some(parse_day("fromDate", &value)?),
            "toDate" => filter.to_date = Some(parse_day("toDate", &value)?),
            "group" => {
                if !value.is_empty() && value != "all" {
                    filter.group = Some(value);
                }
            }
            "student" => {
                if !value.is_empty() && value != "all" {
                    filter.student = Some(value);
                }
            }
            "status" => {
                let status = Status::parse(&value).ok_or_else(|| {
                    Error::Validation(format!("unknown status filter: \"{value}\""))
                })?;
                filter.statuses.push(status);
            }
            "direction" => {
                if !value.is_empty() {
                    filter.directions.push(value);
                }
            }
            "searchTerm" => {
                if !value.is_empty() {
                    filter.search_term = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(filter)
}

fn parse_day(name: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("{name} must be YYYY-MM-DD, got \"{raw}\"")))
}

//! Notion-backed request store.
//!
//! Translates [`RequestFilter`] into the Notion database query shape,
//! follows cursor pagination, and normalizes the heterogeneous page
//! properties into [`PassRequest`] in one place. Downstream code never
//! re-derives defaults.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{NewPassRequest, RequestFilter, RequestStore};
use crate::error::{Error, Result};
use crate::model::{PassRequest, Status, NA, REASON_OTHER};

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

// Property names in the request database.
const PROP_STUDENT: &str = "Student";
const PROP_GROUP: &str = "Group";
const PROP_REASON: &str = "Reason";
const PROP_STATUS: &str = "Status";
const PROP_DIRECTION: &str = "Direction";
const PROP_DATE: &str = "Submission Date";

pub struct NotionStore {
    http: Client,
    token: String,
    database_id: String,
    base_url: String,
}

impl NotionStore {
    pub fn new(token: String, database_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token,
            database_id,
            base_url: NOTION_API_BASE.to_string(),
        })
    }

    /// Point the adapter at a different API host (test harnesses).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let response = request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream_with_details(
                format!("{what} failed with {status}"),
                body.chars().take(300).collect::<String>(),
            ));
        }

        Ok(response.json().await?)
    }

    /// Run a database query, following `next_cursor` until exhausted.
    /// `cancel`, when present, is checked before each page round trip.
    async fn query_pages(
        &self,
        filter: Option<Value>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
            }

            let mut body = json!({
                "sorts": [{"property": PROP_DATE, "direction": "descending"}],
            });
            if let Some(filter) = &filter {
                body["filter"] = filter.clone();
            }
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let page = self
                .send(self.http.post(&url).json(&body), "request query")
                .await?;

            if let Some(items) = page["results"].as_array() {
                results.extend(items.iter().cloned());
            }

            if page["has_more"].as_bool() == Some(true) {
                cursor = page["next_cursor"].as_str().map(str::to_string);
                if cursor.is_none() {
                    // has_more without a cursor would loop forever
                    break;
                }
            } else {
                break;
            }
        }

        Ok(results)
    }
}

#[async_trait::async_trait]
impl RequestStore for NotionStore {
    async fn query(&self, filter: &RequestFilter) -> Result<Vec<PassRequest>> {
        let pages = self.query_pages(filter_json(filter), None).await?;
        Ok(normalize_pages(&pages))
    }

    async fn create(&self, submission: &NewPassRequest) -> Result<String> {
        let url = format!("{}/pages", self.base_url);
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let body = json!({
            "parent": {"database_id": self.database_id},
            "properties": {
                PROP_STUDENT: {"title": [{"text": {"content": &submission.student_fio}}]},
                PROP_DIRECTION: {"select": {"name": &submission.direction}},
                PROP_GROUP: {"select": {"name": &submission.group}},
                PROP_REASON: {"select": {"name": &submission.reason}},
                PROP_DATE: {"date": {"start": today}},
                PROP_STATUS: {"select": {"name": Status::Pending.as_str()}},
            },
        });

        let page = self
            .send(self.http.post(&url).json(&body), "request creation")
            .await?;

        page["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::upstream("request creation returned no id"))
    }

    async fn update_status(&self, id: &str, status: Status) -> Result<()> {
        let url = format!("{}/pages/{}", self.base_url, id);
        let body = json!({
            "properties": {
                PROP_STATUS: {"select": {"name": status.as_str()}},
            },
        });

        self.send(self.http.patch(&url).json(&body), "status update")
            .await?;
        Ok(())
    }

    async fn student_history(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PassRequest>> {
        let filter = json!({
            "property": PROP_STUDENT,
            "title": {"contains": name},
        });
        let pages = self.query_pages(Some(filter), Some(cancel)).await?;
        Ok(normalize_pages(&pages))
    }
}

/// Build the Notion filter clause for a [`RequestFilter`], or `None`
/// when no filter applies. Mirrors the documented AND/OR composition.
pub(crate) fn filter_json(filter: &RequestFilter) -> Option<Value> {
    let mut clauses: Vec<Value> = Vec::new();

    if let Some(group) = &filter.group {
        clauses.push(json!({"property": PROP_GROUP, "select": {"equals": group}}));
    }

    if let Some(student) = &filter.student {
        clauses.push(json!({"property": PROP_STUDENT, "title": {"contains": student}}));
    }

    if !filter.statuses.is_empty() {
        let any: Vec<Value> = filter
            .statuses
            .iter()
            .map(|s| json!({"property": PROP_STATUS, "select": {"equals": s.as_str()}}))
            .collect();
        clauses.push(json!({"or": any}));
    }

    if !filter.directions.is_empty() {
        let any: Vec<Value> = filter
            .directions
            .iter()
            .map(|d| json!({"property": PROP_DIRECTION, "select": {"equals": d}}))
            .collect();
        clauses.push(json!({"or": any}));
    }

    if let Some(term) = &filter.search_term {
        clauses.push(json!({"or": [
            {"property": PROP_STUDENT, "title": {"contains": term}},
            {"property": PROP_GROUP, "select": {"contains": term}},
            {"property": PROP_REASON, "select": {"contains": term}},
            {"property": PROP_STATUS, "select": {"contains": term}},
            {"property": PROP_DIRECTION, "select": {"contains": term}},
        ]}));
    }

    if filter.from_date.is_some() || filter.to_date.is_some() {
        let mut range = json!({});
        if let Some(from) = filter.from_date {
            range["on_or_after"] = json!(from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = filter.to_date {
            range["on_or_before"] = json!(to.format("%Y-%m-%d").to_string());
        }
        clauses.push(json!({"property": PROP_DATE, "date": range}));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(json!({"and": clauses}))
    }
}

fn normalize_pages(pages: &[Value]) -> Vec<PassRequest> {
    pages.iter().filter_map(normalize_page).collect()
}

/// Normalize one Notion page into a [`PassRequest`].
///
/// Precedence, applied here and nowhere else:
/// - date: submission-date property, then record `created_time`, then `N/A`
/// - fio: first title fragment, then `N/A`
/// - reason: select name, then `Other`
/// - status: canonical select name, anything else becomes `Pending`
/// - group/direction: select name, then `N/A`
///
/// Pages without an id (partial objects) are skipped.
pub(crate) fn normalize_page(page: &Value) -> Option<PassRequest> {
    let Some(id) = page["id"].as_str() else {
        warn!("skipping partial page object without id");
        return None;
    };

    let date = date_start(page, PROP_DATE)
        .or_else(|| page["created_time"].as_str())
        .unwrap_or(NA);

    Some(PassRequest {
        id: id.to_string(),
        date: date.to_string(),
        fio: title_text(page, PROP_STUDENT).unwrap_or(NA).to_string(),
        reason: select_name(page, PROP_REASON)
            .unwrap_or(REASON_OTHER)
            .to_string(),
        status: Status::normalize(select_name(page, PROP_STATUS)),
        group: select_name(page, PROP_GROUP).unwrap_or(NA).to_string(),
        direction: select_name(page, PROP_DIRECTION).unwrap_or(NA).to_string(),
    })
}

fn select_name<'a>(page: &'a Value, prop: &str) -> Option<&'a str> {
    page["properties"][prop]["select"]["name"].as_str()
}

fn title_text<'a>(page: &'a Value, prop: &str) -> Option<&'a str> {
    page["properties"][prop]["title"][0]["plain_text"].as_str()
}

fn date_start<'a>(page: &'a Value, prop: &str) -> Option<&'a str> {
    page["properties"][prop]["date"]["start"].as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page(properties: Value) -> Value {
        json!({
            "id": "page-1",
            "created_time": "2024-03-01T08:00:00.000Z",
            "properties": properties,
        })
    }

    #[test]
    fn empty_filter_produces_no_clause() {
        assert_eq!(filter_json(&RequestFilter::default()), None);
    }

    #[test]
    fn statuses_or_combine_inside_the_and() {
        let filter = RequestFilter {
            group: Some("MGM-101".to_string()),
            statuses: vec![Status::Approved, Status::Pending],
            ..Default::default()
        };
        let clause = filter_json(&filter).unwrap();
        let and = clause["and"].as_array().unwrap();
        assert_eq!(and.len(), 2);
        assert_eq!(and[0]["property"], PROP_GROUP);
        let or = and[1]["or"].as_array().unwrap();
        assert_eq!(or.len(), 2);
        assert_eq!(or[0]["select"]["equals"], "Approved");
        assert_eq!(or[1]["select"]["equals"], "Pending");
    }

    #[test]
    fn search_term_fans_out_across_five_fields() {
        let filter = RequestFilter {
            search_term: Some("illness".to_string()),
            ..Default::default()
        };
        let clause = filter_json(&filter).unwrap();
        let or = clause["and"][0]["or"].as_array().unwrap();
        assert_eq!(or.len(), 5);
        assert_eq!(or[0]["title"]["contains"], "illness");
    }

    #[test]
    fn date_range_uses_inclusive_bounds() {
        let filter = RequestFilter {
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..Default::default()
        };
        let clause = filter_json(&filter).unwrap();
        let range = &clause["and"][0];
        assert_eq!(range["property"], PROP_DATE);
        assert_eq!(range["date"]["on_or_after"], "2024-01-01");
        assert_eq!(range["date"]["on_or_before"], "2024-01-31");
    }

    #[test]
    fn normalization_prefers_submission_date_over_created_time() {
        let page = page(json!({
            PROP_DATE: {"date": {"start": "2024-02-20"}},
            PROP_STUDENT: {"title": [{"plain_text": "Anna Smirnova"}]},
            PROP_STATUS: {"select": {"name": "Approved"}},
        }));
        let request = normalize_page(&page).unwrap();
        assert_eq!(request.date, "2024-02-20");
        assert_eq!(request.fio, "Anna Smirnova");
        assert_eq!(request.status, Status::Approved);
    }

    #[test]
    fn normalization_falls_back_to_created_time_then_sentinels() {
        let request = normalize_page(&page(json!({}))).unwrap();
        assert_eq!(request.date, "2024-03-01T08:00:00.000Z");
        assert_eq!(request.fio, NA);
        assert_eq!(request.reason, REASON_OTHER);
        assert_eq!(request.status, Status::Pending);
        assert_eq!(request.group, NA);
        assert_eq!(request.direction, NA);
    }

    #[test]
    fn unrecognized_status_coerces_to_pending() {
        let page = page(json!({
            PROP_STATUS: {"select": {"name": "Escalated"}},
        }));
        assert_eq!(normalize_page(&page).unwrap().status, Status::Pending);
    }

    #[test]
    fn partial_pages_are_skipped() {
        let partial = json!({"object": "page"});
        assert!(normalize_page(&partial).is_none());
    }
}

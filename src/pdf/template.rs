//! Fixed HTML table template for the filter-driven report export.

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde_json::json;

use crate::error::{Error, Result};
use crate::model::{PassRequest, Status, NA};

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Pass request report</title>
  <meta charset="UTF-8">
  <style>
    body { font-family: 'Arial', sans-serif; margin: 20px; font-size: 10px; }
    h1 { font-size: 18px; text-align: center; margin-bottom: 20px; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
    th { background-color: #f2f2f2; }
    .badge { display: inline-block; padding: 4px 8px; border-radius: 4px; color: white; font-size: 9px; }
    .badge-approved { background-color: #28a745; }
    .badge-rejected { background-color: #dc3545; }
    .badge-pending { background-color: #ffc107; }
  </style>
</head>
<body>
  <h1>Pass request report{{#if period}} for {{period}}{{/if}}</h1>
  <table>
    <thead>
      <tr>
        <th>Date</th>
        <th>Student</th>
        <th>Group</th>
        <th>Reason</th>
        <th>Status</th>
      </tr>
    </thead>
    <tbody>
      {{#each rows}}
      <tr>
        <td>{{date}}</td>
        <td>{{fio}}</td>
        <td>{{group}}</td>
        <td>{{reason}}</td>
        <td><span class="badge {{status_class}}">{{status}}</span></td>
      </tr>
      {{/each}}
    </tbody>
  </table>
</body>
</html>
"#;

pub struct ReportTemplate {
    handlebars: Handlebars<'static>,
}

impl ReportTemplate {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string("report", REPORT_TEMPLATE)
            .map_err(|e| Error::Config(format!("invalid report template: {e}")))?;
        Ok(Self { handlebars })
    }

    /// Render the report table for a result set, with an optional
    /// covered-period line when both bounds are present.
    pub fn render(
        &self,
        records: &[PassRequest],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<String> {
        let rows: Vec<serde_json::Value> = records
            .iter()
            .map(|record| {
                json!({
                    "date": display_date(&record.date),
                    "fio": record.fio,
                    "group": record.group,
                    "reason": record.reason,
                    "status": record.status.as_str(),
                    "status_class": status_class(record.status),
                })
            })
            .collect();

        let period = match (from, to) {
            (Some(from), Some(to)) => Some(format!(
                "{} — {}",
                from.format("%d.%m.%Y"),
                to.format("%d.%m.%Y")
            )),
            _ => None,
        };

        self.handlebars
            .render("report", &json!({"rows": rows, "period": period}))
            .map_err(|e| Error::Render(format!("report template render failed: {e}")))
    }
}

fn status_class(status: Status) -> &'static str {
    match status {
        Status::Approved => "badge-approved",
        Status::Rejected => "badge-rejected",
        Status::Pending => "badge-pending",
    }
}

fn display_date(raw: &str) -> String {
    if raw == NA {
        return NA.to_string();
    }
    let parsed = crate::model::parse_date_value(raw);
    if parsed == chrono::DateTime::<chrono::Utc>::UNIX_EPOCH {
        raw.to_string()
    } else {
        parsed.format("%d.%m.%Y %H:%M").to_string()
    }
}

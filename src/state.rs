//! Shared application context, built once in `main` and handed to the
//! router. No module-scoped clients anywhere.

use std::sync::Arc;

use crate::pdf::{PdfRenderer, ReportTemplate};
use crate::store::{RequestStore, RosterStore};

#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<dyn RequestStore>,
    pub roster: Arc<dyn RosterStore>,
    pub pdf: Arc<PdfRenderer>,
    pub template: Arc<ReportTemplate>,
}

impl AppState {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        roster: Arc<dyn RosterStore>,
        pdf: PdfRenderer,
        template: ReportTemplate,
    ) -> Self {
        Self {
            requests,
            roster,
            pdf: Arc::new(pdf),
            template: Arc::new(template),
        }
    }
}

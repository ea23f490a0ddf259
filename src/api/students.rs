//! Roster catalog and per-student statistics endpoints.

use axum::extract::{Path, State};
use axum::response::Json;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::model::NA;
use crate::report::stats::{fetch_student_stats, StudentStats};
use crate::state::AppState;
use crate::store::{build_catalog, RosterCatalog};

/// `GET /api/students` — roster plus derived direction/group tables.
pub async fn roster(State(state): State<AppState>) -> Result<Json<RosterCatalog>> {
    let students = state.roster.students().await?;
    Ok(Json(build_catalog(&students)))
}

/// `GET /api/students/:name/stats` — summary and matched requests;
/// 404 when the student has no requests.
pub async fn stats(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StudentStats>> {
    let name = name.trim();
    if name.is_empty() || name == NA {
        return Err(Error::Validation("missing student name".to_string()));
    }

    // token scoped to this request; dropped when the response goes out
    let cancel = CancellationToken::new();
    let stats = fetch_student_stats(state.requests.as_ref(), name, &cancel).await?;
    Ok(Json(stats))
}

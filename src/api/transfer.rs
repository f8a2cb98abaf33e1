use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::active_profile_id;
use super::{ApiError, AppState};
use crate::services::{ExportDocument, ImportSummary};

/// GET /export — the persisted transfer document for the active profile.
pub async fn export_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ExportDocument>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    let document = state.transfer().export(profile_id).await?;
    Ok(Json(document))
}

/// POST /import — accepts the transfer document, a bare id array, or a
/// newline-delimited id list.
pub async fn import_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    let summary = state.transfer().import(profile_id, &body).await?;
    Ok(Json(summary))
}

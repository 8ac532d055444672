//! POST /db/sync — migrate every config artifact of one db alias to another.
//! GET  /health  — liveness.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::model::{DbSyncRequest, Envelope, MigrationRequest};
use crate::server::error::AppError;
use crate::sync::DatabaseSync;

pub async fn sync_database(
    Extension(sync): Extension<DatabaseSync>,
    body: Result<Json<DbSyncRequest>, JsonRejection>,
) -> Result<Json<Envelope>, AppError> {
    let Json(body) = body.map_err(|e| SyncError::Validation(e.body_text()))?;
    let req = MigrationRequest::try_from(body)?;

    tracing::info!(
        project = %req.project_id,
        from = %req.source_alias,
        to = %req.target.db_alias,
        strategy = %sync.strategy(),
        "database sync invoked"
    );

    let report = sync.sync_database(&req).await.map_err(|e| {
        tracing::error!(project = %req.project_id, error = %e, "database sync failed");
        e
    })?;

    let report = serde_json::to_value(&report)
        .map_err(|e| SyncError::InvalidSpec(format!("cannot encode sync report: {e}")))?;
    Ok(Json(Envelope {
        error: None,
        result: Some(vec![report]),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

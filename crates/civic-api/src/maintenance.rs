//! `POST /maintenance/recount`: rebuild every cached counter from its rows.

use std::sync::Arc;

use axum::{Json, extract::State};
use civic_core::store::{CivicStore, RecountReport};

use crate::error::ApiError;

pub async fn recount<S: CivicStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<RecountReport>, ApiError> {
  let report = store.recount_counters().await.map_err(ApiError::store)?;
  Ok(Json(report))
}

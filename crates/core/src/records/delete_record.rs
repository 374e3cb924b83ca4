use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use log::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Outcome of a deletion. `error` is set exactly when `success` is false.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
pub struct DeleteRecordResponse {
  pub success: bool,
  pub error: Option<String>,
}

impl DeleteRecordResponse {
  pub fn ok() -> Self {
    return Self {
      success: true,
      error: None,
    };
  }

  pub fn failed(error: impl Into<String>) -> Self {
    return Self {
      success: false,
      error: Some(error.into()),
    };
  }
}

/// Delete record.
///
/// Always answers with 200. Whether the deletion went through is part of the body.
#[utoipa::path(
  delete,
  path = "/{id}",
  tag = "records",
  params(
    ("id" = String, Path, description = "Identifier of the record to delete."),
  ),
  responses(
    (status = 200, description = "Outcome of the deletion, failures included.", body = DeleteRecordResponse)
  )
)]
pub async fn delete_record_handler(
  State(state): State<AppState>,
  path: Result<Path<String>, PathRejection>,
) -> Json<DeleteRecordResponse> {
  let id = match path {
    Ok(Path(id)) => id,
    Err(rejection) => {
      info!("Rejected record id: {rejection}");
      return Json(state.deleter().invalid_id());
    }
  };

  return Json(state.deleter().delete(&id).await);
}

/// Requests without an id segment, e.g. `DELETE /api/faqs/`, are validation failures.
pub async fn delete_record_without_id_handler(
  State(state): State<AppState>,
) -> Json<DeleteRecordResponse> {
  return Json(state.deleter().delete("").await);
}

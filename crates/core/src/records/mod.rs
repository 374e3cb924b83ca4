use axum::{Router, routing::delete};
use utoipa::OpenApi;

pub(crate) mod delete_record;
pub(crate) mod test_utils;

mod deleter;
mod error;

pub use delete_record::DeleteRecordResponse;
pub use deleter::RecordDeleter;
pub use error::DeleteError;

use crate::AppState;
use crate::constants::API_PATH;

#[allow(unused)]
#[derive(OpenApi)]
#[openapi(paths(delete_record::delete_record_handler))]
pub(super) struct RecordOpenApi;

/// Routes for the collection `name`, i.e. `DELETE /api/<name>/<id>`.
pub(crate) fn router(name: &str) -> Router<AppState> {
  return Router::new()
    .route(
      &format!("/{API_PATH}/{name}/{{id}}"),
      delete(delete_record::delete_record_handler),
    )
    .route(
      &format!("/{API_PATH}/{name}/"),
      delete(delete_record::delete_record_without_id_handler),
    )
    .route(
      &format!("/{API_PATH}/{name}"),
      delete(delete_record::delete_record_without_id_handler),
    );
}

use futures_util::FutureExt;
use log::*;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::records::DeleteError;
use crate::records::delete_record::DeleteRecordResponse;
use crate::store::{RecordStore, StoreCallError, StoreOutcome};

/// Deletes records of a single collection by identifier using privileged credentials.
///
/// Stateless apart from its configuration, every call is independent of prior calls. In
/// particular repeated deletions of the same id aren't tracked, the store decides whether the
/// second one is a no-op or an error.
pub struct RecordDeleter {
  store: Arc<dyn RecordStore>,
  collection: String,
  id_column: String,
  entity_label: String,
  rls_rpc: Option<String>,
  timeout: Duration,
}

impl RecordDeleter {
  pub fn new(store: Arc<dyn RecordStore>, config: &StoreConfig) -> Self {
    return Self {
      store,
      collection: config.collection.clone(),
      id_column: config.id_column.clone(),
      entity_label: config.entity_label.clone(),
      rls_rpc: config.relax_rls.then(|| config.rls_rpc.clone()),
      timeout: config.timeout,
    };
  }

  pub fn collection(&self) -> &str {
    return &self.collection;
  }

  /// Validation failure for an identifier that couldn't be decoded, e.g. invalid UTF-8.
  pub fn invalid_id(&self) -> DeleteRecordResponse {
    return DeleteError::Validation(format!("{} ID is invalid", self.entity_label)).into();
  }

  /// Delete the record with the given `id`.
  ///
  /// Never fails: validation errors, store errors and unexpected errors (including panics) are
  /// all reported through the returned response.
  pub async fn delete(&self, id: &str) -> DeleteRecordResponse {
    let result = AssertUnwindSafe(self.try_delete(id)).catch_unwind().await;

    return match result {
      Ok(Ok(())) => {
        debug!("Deleted {}/{id}", self.collection);
        DeleteRecordResponse::ok()
      }
      Ok(Err(err)) => {
        match err {
          DeleteError::Unexpected(ref cause) => {
            error!("Unexpected error deleting {}/{id}: {cause}", self.collection);
          }
          ref err => {
            info!("Deleting {}/{id} failed: {err}", self.collection);
          }
        };
        err.into()
      }
      Err(_panic) => {
        error!("Unexpected panic deleting {}/{id}", self.collection);
        DeleteError::Unexpected("panic".into()).into()
      }
    };
  }

  async fn try_delete(&self, id: &str) -> Result<(), DeleteError> {
    if id.is_empty() {
      return Err(DeleteError::Validation(format!(
        "{} ID is required",
        self.entity_label
      )));
    }

    if let Some(ref rpc) = self.rls_rpc {
      self.relax_row_level_security(rpc).await;
    }

    let outcome = self
      .bounded(
        self
          .store
          .delete_eq(&self.collection, &self.id_column, id),
      )
      .await?;

    if let Some(message) = outcome {
      return Err(DeleteError::Store(message));
    }

    return Ok(());
  }

  /// Best-effort attempt to lift row-level security for the following delete.
  ///
  /// Any failure is logged and otherwise ignored: the delete proceeds with service-role
  /// credentials either way. Must not return an error.
  async fn relax_row_level_security(&self, rpc: &str) {
    match self.bounded(self.store.call_rpc(rpc)).await {
      Ok(None) => {}
      Ok(Some(message)) => {
        warn!("Could not disable RLS, continuing with service role: {message}");
      }
      Err(err) => {
        warn!("Could not disable RLS, continuing with service role: {err}");
      }
    };
  }

  async fn bounded(
    &self,
    call: impl Future<Output = Result<StoreOutcome, StoreCallError>>,
  ) -> Result<StoreOutcome, DeleteError> {
    return match tokio::time::timeout(self.timeout, call).await {
      Ok(Ok(outcome)) => Ok(outcome),
      Ok(Err(err)) => Err(DeleteError::Unexpected(err.into())),
      Err(elapsed) => Err(DeleteError::Unexpected(elapsed.into())),
    };
  }
}

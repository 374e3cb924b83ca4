use async_trait::async_trait;
use thiserror::Error;

/// A call the store answered: `None` on success, otherwise the store's own error message.
pub type StoreOutcome = Option<String>;

/// The store could not be reached or its answer could not be understood.
#[derive(Debug, Error)]
pub enum StoreCallError {
  #[error("Store client: {0}")]
  Client(#[from] recordgate_store::Error),
  #[error("Other: {0}")]
  Other(Box<dyn std::error::Error + Send + Sync>),
}

/// The subset of record store operations deletions depend on.
#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Invoke the parameterless stored procedure `name`.
  async fn call_rpc(&self, name: &str) -> Result<StoreOutcome, StoreCallError>;

  /// `DELETE FROM <collection> WHERE <column> = <value>`.
  async fn delete_eq(
    &self,
    collection: &str,
    column: &str,
    value: &str,
  ) -> Result<StoreOutcome, StoreCallError>;
}

#[async_trait]
impl RecordStore for recordgate_store::Client {
  async fn call_rpc(&self, name: &str) -> Result<StoreOutcome, StoreCallError> {
    let response = self.rpc::<()>(name, None).await?;
    return Ok(response.error.map(|err| err.message));
  }

  async fn delete_eq(
    &self,
    collection: &str,
    column: &str,
    value: &str,
  ) -> Result<StoreOutcome, StoreCallError> {
    let response = self
      .from(collection)
      .delete()
      .eq(column, value)
      .execute()
      .await?;

    if response.is_ok() {
      log::debug!(
        "Deleted {n} row(s) from {collection}",
        n = response.data.len()
      );
    }

    return Ok(response.error.map(|err| err.message));
  }
}

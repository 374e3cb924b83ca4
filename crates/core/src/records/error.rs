use thiserror::Error;

use crate::constants::UNEXPECTED_ERROR_MESSAGE;
use crate::records::delete_record::DeleteRecordResponse;

/// Failure modes of a single deletion.
///
/// None of these ever leave the service as an error. They are folded into a
/// [DeleteRecordResponse], see the `From` impl below for what callers get to see.
#[derive(Debug, Error)]
pub enum DeleteError {
  /// Rejected before any store access.
  #[error("Validation: {0}")]
  Validation(String),
  /// The store answered and reported a failure, its message is forwarded verbatim.
  #[error("Store: {0}")]
  Store(String),
  /// Anything else: transport, timeouts, malformed responses, defects.
  #[error("Unexpected: {0}")]
  Unexpected(Box<dyn std::error::Error + Send + Sync>),
}

impl From<DeleteError> for DeleteRecordResponse {
  fn from(err: DeleteError) -> Self {
    return match err {
      DeleteError::Validation(msg) => DeleteRecordResponse::failed(msg),
      DeleteError::Store(msg) => DeleteRecordResponse::failed(msg),
      DeleteError::Unexpected(_) => DeleteRecordResponse::failed(UNEXPECTED_ERROR_MESSAGE),
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unexpected_errors_are_opaque() {
    let response: DeleteRecordResponse =
      DeleteError::Unexpected("connection reset by peer at 10.0.0.7:5432".into()).into();
    assert_eq!(
      response,
      DeleteRecordResponse {
        success: false,
        error: Some(UNEXPECTED_ERROR_MESSAGE.to_string()),
      }
    );

    let response: DeleteRecordResponse = DeleteError::Store("no rows affected".to_string()).into();
    assert_eq!(response.error.as_deref(), Some("no rows affected"));
  }
}

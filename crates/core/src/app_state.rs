use std::sync::Arc;

use crate::config::StoreConfig;
use crate::records::RecordDeleter;
use crate::store::RecordStore;

/// The app's internal state. AppState needs to be clonable which puts unnecessary constraints on
/// the internals. Thus rather arc once than many times.
struct InternalState {
  deleter: RecordDeleter,
}

pub(crate) struct AppStateArgs {
  pub store: Arc<dyn RecordStore>,
  pub store_config: StoreConfig,
}

#[derive(Clone)]
pub struct AppState {
  state: Arc<InternalState>,
}

impl AppState {
  pub(crate) fn new(args: AppStateArgs) -> Self {
    return AppState {
      state: Arc::new(InternalState {
        deleter: RecordDeleter::new(args.store, &args.store_config),
      }),
    };
  }

  pub fn deleter(&self) -> &RecordDeleter {
    return &self.state.deleter;
  }

  /// Name of the collection records are deleted from, also the API's path segment.
  pub fn collection(&self) -> &str {
    return self.state.deleter.collection();
  }
}

use log::*;
use std::sync::Arc;
use thiserror::Error;

use crate::app_state::{AppState, AppStateArgs};
use crate::config::{ConfigError, StoreConfig};
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum InitError {
  #[error("Config error: {0}")]
  Config(#[from] ConfigError),
  #[error("Store client error: {0}")]
  StoreClient(#[from] recordgate_store::Error),
}

pub struct InitArgs {
  pub store_config: StoreConfig,
}

/// Builds the app state talking to the hosted store described by `args.store_config`.
///
/// Fails if the store url or service-role key are missing, there's no point in starting up
/// without them.
pub fn init_app_state(args: InitArgs) -> Result<AppState, InitError> {
  let credentials = args.store_config.validate()?;

  let client = recordgate_store::Client::new(
    credentials.url.as_str(),
    credentials.service_key,
    recordgate_store::ClientOptions {
      timeout: Some(args.store_config.timeout),
    },
  )?;

  info!(
    "Deleting from '{collection}' at {url}",
    collection = args.store_config.collection,
    url = client.site(),
  );

  return init_app_state_with_store(args, Arc::new(client));
}

/// Like [init_app_state] but with a custom store, e.g. a fake for testing. Credentials are not
/// required.
pub fn init_app_state_with_store(
  args: InitArgs,
  store: Arc<dyn RecordStore>,
) -> Result<AppState, InitError> {
  args.store_config.validate_options()?;

  if !args.store_config.relax_rls {
    debug!("RLS relaxation disabled");
  }

  return Ok(AppState::new(AppStateArgs {
    store,
    store_config: args.store_config,
  }));
}

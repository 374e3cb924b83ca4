#![forbid(unsafe_code, clippy::unwrap_used)]
#![allow(clippy::needless_return)]
#![warn(clippy::await_holding_lock, clippy::inefficient_to_string)]

pub mod app_state;
pub mod config;
pub mod constants;
pub mod logging;
pub mod records;
pub mod store;

mod server;

pub use app_state::AppState;
pub use config::{ConfigError, StoreConfig};
pub use records::{DeleteRecordResponse, RecordDeleter};
pub use server::{
  InitArgs, InitError, Server, ServerOptions, init_app_state, init_app_state_with_store,
};
pub use store::RecordStore;

pub mod openapi {
  use utoipa::OpenApi;

  /// OpenAPI document for the default collection.
  #[derive(OpenApi)]
  #[openapi(
        info(
            title = "recordgate",
            description = "Record deletion APIs",
        ),
        nest(
            (path = "/api/faqs", api = crate::records::RecordOpenApi),
        ),
        tags(),
    )]
  pub struct Doc;

}

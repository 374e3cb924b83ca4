mod init;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::{Router, extract::State};
use log::*;
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors, trace::TraceLayer};

use crate::app_state::AppState;
use crate::config::StoreConfig;
use crate::constants::{DEFAULT_ADDRESS, HEALTHCHECK_PATH};
use crate::logging;
use crate::store::RecordStore;

pub use init::{InitArgs, InitError, init_app_state, init_app_state_with_store};

/// A set of options to configure serving behaviors. Changing any of these options
/// requires a server restart, which makes them a natural fit for being exposed as command line
/// arguments.
#[derive(Debug, Clone)]
pub struct ServerOptions {
  /// Address the HTTP server binds to (Default: localhost:8000).
  pub address: String,

  /// Dev mode uses permissive CORS to allow talking to the API from a separately hosted UI.
  pub dev: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerOptions {
  fn default() -> Self {
    return Self {
      address: DEFAULT_ADDRESS.to_string(),
      dev: false,
      cors_allowed_origins: vec!["*".to_string()],
    };
  }
}

pub struct Server {
  state: AppState,

  main_router: (String, Router),
}

impl Server {
  /// Initializes the server against the hosted record store.
  pub fn init(opts: ServerOptions, store_config: &StoreConfig) -> Result<Self, InitError> {
    let state = init::init_app_state(InitArgs {
      store_config: store_config.clone(),
    })?;

    return Ok(Self::with_state(state, &opts));
  }

  /// Initializes the server with a custom record store implementation.
  pub fn init_with_store(
    opts: ServerOptions,
    store_config: &StoreConfig,
    store: Arc<dyn RecordStore>,
  ) -> Result<Self, InitError> {
    let state = init::init_app_state_with_store(
      InitArgs {
        store_config: store_config.clone(),
      },
      store,
    )?;

    return Ok(Self::with_state(state, &opts));
  }

  fn with_state(state: AppState, opts: &ServerOptions) -> Self {
    let main_router = Self::build_main_router(&state, opts);
    return Self { state, main_router };
  }

  pub fn router(&self) -> &Router<()> {
    return &self.main_router.1;
  }

  pub fn address(&self) -> &str {
    return &self.main_router.0;
  }

  pub async fn serve(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (addr, router) = self.main_router.clone();

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|err| {
      error!("Failed to listen on: {addr}: {err}");
      err
    })?;

    info!(
      "listening on http://{addr} 🚀 (DELETE /api/{collection}/{{id}})",
      collection = self.state.collection()
    );

    axum::serve(listener, router)
      .with_graceful_shutdown(shutdown_signal())
      .await?;

    return Ok(());
  }

  fn build_main_router(state: &AppState, opts: &ServerOptions) -> (String, Router<()>) {
    let router = Router::new()
      .merge(crate::records::router(state.collection()))
      .route(&format!("/{HEALTHCHECK_PATH}"), get(healthcheck_handler))
      .route("/", get(info_handler));

    return (
      opts.address.clone(),
      Self::wrap_with_default_layers(state, opts, router),
    );
  }

  fn wrap_with_default_layers(
    state: &AppState,
    opts: &ServerOptions,
    router: Router<AppState>,
  ) -> Router<()> {
    return router
      .layer(build_cors(opts))
      .layer(
        // This declares: **what information** is logged at what level in to events and spans.
        TraceLayer::new_for_http()
          .make_span_with(logging::make_span)
          .on_request(logging::on_request)
          .on_response(logging::on_response),
      )
      .with_state(state.clone());
  }
}

async fn healthcheck_handler() -> Response {
  return (StatusCode::OK, "Ok").into_response();
}

async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
  return Json(serde_json::json!({
    "name": env!("CARGO_PKG_NAME"),
    "version": env!("CARGO_PKG_VERSION"),
    "status": "active",
    "collection": state.collection(),
  }));
}

fn build_cors(opts: &ServerOptions) -> cors::CorsLayer {
  if opts.dev {
    return cors::CorsLayer::very_permissive();
  }

  let origin_strs = &opts.cors_allowed_origins;
  let wildcard = origin_strs.iter().any(|s| s == "*");

  let origins = if wildcard {
    info!("CORS: allow any origin");
    cors::AllowOrigin::mirror_request()
  } else {
    cors::AllowOrigin::list(origin_strs.iter().filter_map(|o| {
      match HeaderValue::from_str(o.as_str()) {
        Ok(value) => Some(value),
        Err(err) => {
          error!("Invalid CORS origin {o}: {err}");
          None
        }
      }
    }))
  };

  return cors::CorsLayer::new()
    .allow_methods(cors::Any)
    .allow_headers(cors::Any)
    .allow_origin(origins);
}

async fn shutdown_signal() {
  let ctrl_c = async {
    signal::ctrl_c()
      .await
      .expect("failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .expect("failed to install signal handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {
      info!("Received Ctrl+C. Shutting down gracefully.");
    },
    _ = terminate => {
      info!("Received termination. Shutting down gracefully.");
    },
  }
}

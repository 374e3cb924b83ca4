use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use recordgate::StoreConfig;
use recordgate::constants::{
  DEFAULT_COLLECTION, DEFAULT_ENTITY_LABEL, DEFAULT_ID_COLUMN, DEFAULT_RLS_RPC,
};

/// Command line arguments for the record deletion gateway.
///
/// NOTE: everything here is read once at startup, changes require a restart.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct DefaultCommandLineArgs {
  #[command(flatten)]
  pub store: StoreArgs,

  #[command(subcommand)]
  pub cmd: Option<SubCommands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommands {
  /// Starts the HTTP server.
  Run(ServerArgs),
  /// Deletes a single record and prints the outcome as JSON.
  Delete {
    /// Identifier of the record to delete.
    id: String,
  },
  /// Print OpenAPI definitions.
  OpenApi,
}

/// Where and what to delete.
#[derive(Args, Clone, Debug)]
pub struct StoreArgs {
  /// Base URL of the hosted record store.
  #[arg(long, env = "NEXT_PUBLIC_SUPABASE_URL", global = true)]
  pub store_url: Option<String>,

  /// Service role key. Bypasses row-level security.
  #[arg(
    long,
    env = "SUPABASE_SERVICE_ROLE_KEY",
    hide_env_values = true,
    global = true
  )]
  pub service_key: Option<String>,

  /// Collection records are deleted from. Also the API's path segment.
  #[arg(long, env = "RECORDGATE_COLLECTION", default_value = DEFAULT_COLLECTION, global = true)]
  pub collection: String,

  /// Column matched against the record id.
  #[arg(long, env = "RECORDGATE_ID_COLUMN", default_value = DEFAULT_ID_COLUMN, global = true)]
  pub id_column: String,

  /// Entity name used in validation messages, e.g. "FAQ ID is required".
  #[arg(long, env = "RECORDGATE_ENTITY_LABEL", default_value = DEFAULT_ENTITY_LABEL, global = true)]
  pub entity_label: String,

  /// Stored procedure invoked to relax row-level security before deleting.
  #[arg(long, env = "RECORDGATE_RLS_RPC", default_value = DEFAULT_RLS_RPC, global = true)]
  pub rls_rpc: String,

  /// Skip the row-level security relaxation call.
  #[arg(long, env = "RECORDGATE_NO_RELAX_RLS", global = true)]
  pub no_relax_rls: bool,

  /// Timeout in seconds for each call to the store.
  #[arg(
    long,
    env = "RECORDGATE_STORE_TIMEOUT_SECS",
    default_value_t = 10,
    global = true
  )]
  pub store_timeout_secs: u64,
}

impl From<StoreArgs> for StoreConfig {
  fn from(args: StoreArgs) -> Self {
    return StoreConfig {
      url: args.store_url,
      service_key: args.service_key,
      collection: args.collection,
      id_column: args.id_column,
      entity_label: args.entity_label,
      relax_rls: !args.no_relax_rls,
      rls_rpc: args.rls_rpc,
      timeout: Duration::from_secs(args.store_timeout_secs),
    };
  }
}

#[derive(Args, Clone, Debug)]
pub struct ServerArgs {
  /// Authority (<host>:<port>) the HTTP server binds to (Default: localhost:8000).
  #[arg(short, long, env = "RECORDGATE_ADDRESS", default_value = "localhost:8000")]
  pub address: String,

  /// Use permissive CORS to allow for cross-origin requests when developing a UI hosted
  /// elsewhere, e.g. using a dev server.
  #[arg(long)]
  pub dev: bool,

  #[arg(long, default_value_t = false)]
  pub stderr_logging: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  #[arg(long, default_value = "*")]
  pub cors_allowed_origins: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_run_args() {
    let args = DefaultCommandLineArgs::try_parse_from([
      "gate",
      "run",
      "--address",
      "0.0.0.0:9000",
      "--cors-allowed-origins",
      "https://app.example.com",
    ])
    .unwrap();

    let Some(SubCommands::Run(server)) = args.cmd else {
      panic!("expected run: {:?}", args.cmd);
    };
    assert_eq!(server.address, "0.0.0.0:9000");
    assert!(!server.dev);
    assert_eq!(server.cors_allowed_origins, vec!["https://app.example.com"]);
  }

  #[test]
  fn test_store_args_into_config() {
    let args = DefaultCommandLineArgs::try_parse_from([
      "gate",
      "delete",
      "abc123",
      "--store-url",
      "https://project.supabase.co",
      "--service-key",
      "secret",
      "--collection",
      "snippets",
      "--no-relax-rls",
      "--store-timeout-secs",
      "3",
    ])
    .unwrap();

    assert!(matches!(args.cmd, Some(SubCommands::Delete { ref id }) if id == "abc123"));

    let config: StoreConfig = args.store.into();
    assert_eq!(config.url.as_deref(), Some("https://project.supabase.co"));
    assert_eq!(config.service_key.as_deref(), Some("secret"));
    assert_eq!(config.collection, "snippets");
    assert_eq!(config.id_column, "id");
    assert_eq!(config.entity_label, "FAQ");
    assert!(!config.relax_rls);
    assert_eq!(config.timeout, Duration::from_secs(3));
  }
}

#![allow(clippy::needless_return)]

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{CommandFactory, Parser};
use recordgate::{InitArgs, Server, ServerOptions, StoreConfig, init_app_state};
use tracing_subscriber::{filter, prelude::*};
use utoipa::OpenApi;

use recordgate_cli::{DefaultCommandLineArgs, SubCommands};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_logger(dev: bool) {
  const DEFAULT: &str = "info,tracing::span=warn";

  env_logger::Builder::from_env(if dev {
    env_logger::Env::new().default_filter_or(format!(
      "{DEFAULT},recordgate=debug,recordgate_store=debug"
    ))
  } else {
    env_logger::Env::new().default_filter_or(DEFAULT)
  })
  .format_timestamp_micros()
  .init();
}

async fn async_main() -> Result<(), BoxError> {
  // Values from the environment take precedence over the ".env" file.
  if let Err(err) = dotenvy::dotenv()
    && !err.not_found()
  {
    return Err(err.into());
  }

  let args = DefaultCommandLineArgs::parse();
  let store_config: StoreConfig = args.store.into();

  match args.cmd {
    Some(SubCommands::Run(cmd)) => {
      init_logger(cmd.dev);

      let app = Server::init(
        ServerOptions {
          address: cmd.address,
          dev: cmd.dev,
          cors_allowed_origins: cmd.cors_allowed_origins,
        },
        &store_config,
      )?;

      if cmd.dev || cmd.stderr_logging {
        // This declares **where** request traces go. What is traced is up to the server.
        let _ = tracing_subscriber::registry()
          .with(
            tracing_subscriber::fmt::layer().compact().with_filter(
              filter::Targets::new()
                .with_target(recordgate::logging::EVENT_TARGET, filter::LevelFilter::INFO)
                .with_default(filter::LevelFilter::OFF),
            ),
          )
          .try_init();
      }

      app.serve().await?;
    }
    Some(SubCommands::Delete { id }) => {
      init_logger(false);

      let state = init_app_state(InitArgs { store_config })?;

      let response = state.deleter().delete(&id).await;
      println!("{}", serde_json::to_string_pretty(&response)?);

      if !response.success {
        std::process::exit(1);
      }
    }
    Some(SubCommands::OpenApi) => {
      init_logger(false);

      let json = recordgate::openapi::Doc::openapi().to_pretty_json()?;
      println!("{json}");
    }
    None => {
      let _ = DefaultCommandLineArgs::command().print_help();
    }
  }

  return Ok(());
}

fn main() -> Result<(), BoxError> {
  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;

  return runtime.block_on(async_main());
}

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// mvnpack - build Maven projects into cacheable layers
#[derive(Parser)]
#[command(name = "mvnpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Decide whether the application is a Maven project and print the build plans
  Detect {
    /// Application root
    #[arg(long, default_value = ".")]
    app: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Install Maven, build the application and contribute layers
  Build {
    /// Application root
    #[arg(long, default_value = ".")]
    app: PathBuf,

    /// Directory the layers are written to
    #[arg(long)]
    layers: PathBuf,

    /// JSON array of plan entries (default: maven and jvm-application-package)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// TOML dependency catalog
    #[arg(long)]
    dependencies: Option<PathBuf>,

    /// Service binding root (default: $SERVICE_BINDING_ROOT)
    #[arg(long)]
    bindings: Option<PathBuf>,

    /// Download cache directory
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// List recognised configuration options and their effective values
  Info {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Detect { app, output } => cmd::cmd_detect(&app, output),
    Commands::Build {
      app,
      layers,
      plan,
      dependencies,
      bindings,
      cache,
      output,
    } => cmd::cmd_build(cmd::BuildArgs {
      app,
      layers,
      plan,
      dependencies,
      bindings,
      cache,
      output,
    }),
    Commands::Info { output } => cmd::cmd_info(output).map(|_| ExitCode::SUCCESS),
  };

  match result {
    Ok(code) => code,
    Err(e) => {
      // Library errors already carry their causes in the message
      print_error(&e.to_string());
      ExitCode::FAILURE
    }
  }
}

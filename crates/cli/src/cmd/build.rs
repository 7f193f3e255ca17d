//! Implementation of the `mvnpack build` command.
//!
//! Collects the build context from the command line and the environment, then runs
//! the orchestrator on a single-threaded runtime.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Result, anyhow, bail};
use tracing::info;

use mvnpack_lib::bindings::Bindings;
use mvnpack_lib::build::{BuildContext, BuildResult, build};
use mvnpack_lib::config::{ConfigResolver, MavenConfig};
use mvnpack_lib::dependency::{DependencyCache, DependencyCatalog};
use mvnpack_lib::execute::CommandExecutor;
use mvnpack_lib::layer::Layers;
use mvnpack_lib::plan::{BuildPlanEntry, default_entries};
use mvnpack_lib::platform::paths::{dependency_cache_dir, m2_dir};

use crate::output::{OutputFormat, print_json, print_stat, print_success, symbols};

pub struct BuildArgs {
  pub app: PathBuf,
  pub layers: PathBuf,
  pub plan: Option<PathBuf>,
  pub dependencies: Option<PathBuf>,
  pub bindings: Option<PathBuf>,
  pub cache: Option<PathBuf>,
  pub output: OutputFormat,
}

pub fn cmd_build(args: BuildArgs) -> Result<ExitCode> {
  let app = dunce::canonicalize(&args.app).map_err(|e| anyhow!("Application not found: {}: {e}", args.app.display()))?;

  let resolver = ConfigResolver::from_env();
  let config = MavenConfig::resolve(&resolver);

  let plan = match &args.plan {
    Some(path) => load_plan(path)?,
    None => default_entries(),
  };

  let catalog = match &args.dependencies {
    Some(path) => DependencyCatalog::load(path).map_err(|e| anyhow!("Failed to load dependency catalog: {e}"))?,
    None => DependencyCatalog::default(),
  };

  // Maven runs from the application root, so every directory handed to it must be absolute
  let layers = absolute_dir(&args.layers)?;
  let cache_dir = match args.cache.clone().or_else(dependency_cache_dir) {
    Some(dir) => absolute_dir(&dir)?,
    None => bail!("Unable to determine a download cache directory; pass --cache"),
  };

  let bindings = match args.bindings.as_ref().or(config.service_binding_root.as_ref()) {
    Some(root) if root.is_dir() => {
      let root = dunce::canonicalize(root).map_err(|e| anyhow!("Failed to resolve bindings {}: {e}", root.display()))?;
      Bindings::load(&root).map_err(|e| anyhow!("Failed to load bindings from {}: {e}", root.display()))?
    }
    _ => Bindings::default(),
  };

  let ctx = BuildContext {
    app_path: app,
    layers: Layers::new(layers),
    plan,
    resolver,
    config,
    catalog,
    cache: DependencyCache::new(cache_dir),
    bindings,
    local_repository: m2_dir(),
    interactive: std::io::stdout().is_terminal(),
  };

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .map_err(|e| anyhow!("Failed to create async runtime: {e}"))?;
  let result = rt
    .block_on(build(&ctx, &CommandExecutor))
    .map_err(|e| anyhow!("Build failed: {e}"))?;
  info!(layers = result.layers.len(), "build complete");

  if args.output.is_json() {
    print_json(&summary(&result))?;
  } else {
    print_summary(&result);
  }
  Ok(ExitCode::SUCCESS)
}

/// Create `path` if needed and return it in absolute form.
fn absolute_dir(path: &Path) -> Result<PathBuf> {
  std::fs::create_dir_all(path).map_err(|e| anyhow!("Failed to create {}: {e}", path.display()))?;
  dunce::canonicalize(path).map_err(|e| anyhow!("Failed to resolve {}: {e}", path.display()))
}

fn load_plan(path: &Path) -> Result<Vec<BuildPlanEntry>> {
  let content =
    std::fs::read_to_string(path).map_err(|e| anyhow!("Failed to read plan {}: {e}", path.display()))?;
  serde_json::from_str(&content).map_err(|e| anyhow!("Failed to parse plan {}: {e}", path.display()))
}

fn summary(result: &BuildResult) -> serde_json::Value {
  let layers: Vec<_> = result
    .layers
    .iter()
    .map(|l| {
      serde_json::json!({
        "name": l.name,
        "path": l.path,
        "build": l.types.build,
        "cache": l.types.cache,
        "launch": l.types.launch,
      })
    })
    .collect();
  serde_json::json!({
    "command": result.command,
    "arguments": result.arguments,
    "layers": layers,
    "bom": result.bom,
  })
}

fn print_summary(result: &BuildResult) {
  print_success("Build complete");
  if let Some(command) = &result.command {
    print_stat("Command", &command.display().to_string());
  }
  print_stat("Arguments", &result.arguments.join(" "));

  if !result.layers.is_empty() {
    println!();
    println!("Layers:");
    for layer in &result.layers {
      println!("  {} {} {}", symbols::INFO, layer.name, layer.path.display());
    }
  }

  if !result.bom.is_empty() {
    println!();
    println!("Bill of materials:");
    for entry in &result.bom {
      println!("  {} {} {}", symbols::INFO, entry.name, entry.version);
    }
  }
}

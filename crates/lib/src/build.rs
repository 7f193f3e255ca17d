//! Build orchestration.
//!
//! A build runs a fixed sequence of stages over an explicit [`BuildContext`]:
//!
//! 1. resolve which plan entries were requested
//! 2. install Maven through the first applicable strategy (when `maven` is requested)
//! 3. assemble the Maven arguments
//! 4. link the local repository cache, run Maven, locate the artifact and contribute the
//!    application layer (when `jvm-application-package` is requested)
//!
//! Every stage either succeeds or aborts the build; nothing is retried.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::application::{Application, ApplicationError};
use crate::arguments::{ArgumentAssembler, ArgumentError, Arguments, write_assembly_descriptor};
use crate::artifact::ArtifactLocator;
use crate::bindings::{BindingError, Bindings, SettingsBinding};
use crate::cache::LocalRepositoryCache;
use crate::config::{CONFIGURATIONS, ConfigResolver, MavenConfig};
use crate::consts::{MAVEN_BINDING_TYPE, PLAN_ENTRY_JVM_APPLICATION_PACKAGE, PLAN_ENTRY_MAVEN};
use crate::dependency::{BomEntry, DependencyCache, DependencyCatalog};
use crate::execute::{Execution, Executor};
use crate::layer::{Layer, LayerError, Layers};
use crate::manager::{self, ManagerContext, ManagerError, MavenManager, NoopManager, WrapperManager};
use crate::plan::{BuildPlanEntry, PlanEntryResolver};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("unable to resolve binding: {0}")]
  Binding(#[from] BindingError),

  #[error(transparent)]
  Manager(#[from] ManagerError),

  #[error("unable to resolve build arguments: {0}")]
  Argument(#[from] ArgumentError),

  #[error("unable to contribute cache layer: {0}")]
  Cache(#[from] LayerError),

  #[error("unable to contribute application layer: {0}")]
  Application(#[from] ApplicationError),

  #[error("unable to determine user home directory")]
  NoHome,
}

/// Everything a build reads. Stages take it by reference and never mutate it.
#[derive(Debug, Clone)]
pub struct BuildContext {
  pub app_path: PathBuf,
  pub layers: Layers,
  pub plan: Vec<BuildPlanEntry>,
  pub resolver: ConfigResolver,
  pub config: MavenConfig,
  pub catalog: DependencyCatalog,
  pub cache: DependencyCache,
  pub bindings: Bindings,
  /// Location of the Maven local repository, normally `~/.m2`.
  pub local_repository: Option<PathBuf>,
  /// Whether a terminal is attached to the build.
  pub interactive: bool,
}

/// What the build contributed.
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
  pub layers: Vec<Layer>,
  pub bom: Vec<BomEntry>,
  pub command: Option<PathBuf>,
  pub arguments: Vec<String>,
}

/// Which halves of the build the plan asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
  pub install_maven: bool,
  pub build_application: bool,
}

pub fn resolve_plan(ctx: &BuildContext) -> Stages {
  let resolver = PlanEntryResolver::new(&ctx.plan);
  let stages = Stages {
    install_maven: resolver.resolve(PLAN_ENTRY_MAVEN).is_some(),
    build_application: resolver.resolve(PLAN_ENTRY_JVM_APPLICATION_PACKAGE).is_some(),
  };
  debug!(?stages, "resolved build plan");
  stages
}

/// Log every recognised option with its effective value.
pub fn log_configuration(resolver: &ConfigResolver) {
  for configuration in CONFIGURATIONS {
    let (value, user_set) = resolver.resolve(configuration.name);
    info!(
      key = configuration.name,
      description = configuration.description,
      value = %value,
      user_set,
      "configuration"
    );
  }
}

fn manager_context(ctx: &BuildContext) -> ManagerContext {
  ManagerContext {
    app_path: ctx.app_path.clone(),
    layers: ctx.layers.clone(),
    config: ctx.config.clone(),
    catalog: ctx.catalog.clone(),
    cache: ctx.cache.clone(),
  }
}

/// Select and install Maven, contributing a distribution layer when one is needed.
pub async fn install_maven(ctx: &BuildContext, result: &mut BuildResult) -> Result<PathBuf, BuildError> {
  let managers = manager_context(ctx);
  let chain = manager::chain(&managers);
  let selected = manager::select(&chain)?;
  info!(manager = selected.name(), "selected maven manager");

  let installation = selected.install()?;
  if let Some(distribution) = &installation.layer {
    result.layers.push(distribution.contribute(&ctx.layers).await?);
  }
  if let Some(bom) = installation.bom {
    result.bom.push(bom);
  }
  Ok(installation.command)
}

/// The command to build with when Maven itself was not requested: the project's
/// wrapper, or `mvn` from the search path.
pub fn existing_maven(ctx: &BuildContext) -> Result<PathBuf, BuildError> {
  let managers = manager_context(ctx);
  let wrapper = WrapperManager::new(&managers);
  let installation = if wrapper.should_install() {
    wrapper.install()?
  } else {
    NoopManager::new(&managers).install()?
  };
  Ok(installation.command)
}

pub fn configure_arguments(ctx: &BuildContext) -> Result<Arguments, BuildError> {
  let binding = ctx.bindings.resolve_one(MAVEN_BINDING_TYPE)?;
  let settings = SettingsBinding::from_binding(binding);
  debug!(?settings, "resolved settings binding");

  // Maven runs from the application root, so a relative settings path is resolved there.
  // Joining an absolute path yields it unchanged.
  let mut config = ctx.config.clone();
  config.settings_path = config.settings_path.map(|path| ctx.app_path.join(path));
  Ok(ArgumentAssembler::new(&config, &settings, ctx.interactive).assemble()?)
}

pub async fn build_application<X: Executor>(
  ctx: &BuildContext,
  command: PathBuf,
  arguments: Arguments,
  executor: &X,
  result: &mut BuildResult,
) -> Result<(), BuildError> {
  if let Some(local_repository) = &ctx.local_repository {
    let cache = LocalRepositoryCache::new(local_repository);
    result.layers.push(cache.contribute(&ctx.layers).await?);
  } else {
    return Err(BuildError::NoHome);
  }

  if ctx.config.support_multiple_artifacts {
    write_assembly_descriptor(&ctx.app_path)?;
  }

  let application = Application {
    execution: Execution {
      command,
      arguments: arguments.arguments,
      dir: ctx.app_path.clone(),
    },
    metadata: arguments.metadata,
    locator: ArtifactLocator::from_config(&ctx.config),
    executor,
  };
  result.layers.push(application.contribute(&ctx.layers).await?);
  Ok(())
}

/// Run every stage the plan requests.
pub async fn build<X: Executor>(ctx: &BuildContext, executor: &X) -> Result<BuildResult, BuildError> {
  info!(app = ?ctx.app_path, layers = ?ctx.layers.root(), "starting build");
  log_configuration(&ctx.resolver);

  let stages = resolve_plan(ctx);
  let mut result = BuildResult::default();

  let installed = if stages.install_maven {
    Some(install_maven(ctx, &mut result).await?)
  } else {
    None
  };

  let arguments = configure_arguments(ctx)?;
  result.arguments = arguments.arguments.clone();

  if stages.build_application {
    let command = match installed {
      Some(command) => command,
      None => existing_maven(ctx)?,
    };
    result.command = Some(command.clone());
    build_application(ctx, command, arguments, executor, &mut result).await?;
  } else {
    result.command = installed;
  }

  info!(layers = result.layers.len(), bom = result.bom.len(), "build complete");
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::execute::ExecuteError;
  use crate::plan::default_entries;
  use crate::util::testutil::write_executable_jar;
  use std::sync::Mutex;
  use tempfile::TempDir;

  #[derive(Default)]
  struct FakeMaven {
    runs: Mutex<Vec<Execution>>,
  }

  impl Executor for FakeMaven {
    async fn execute(&self, execution: &Execution) -> Result<(), ExecuteError> {
      write_executable_jar(&execution.dir.join("target/app.jar"));
      self.runs.lock().unwrap().push(execution.clone());
      Ok(())
    }
  }

  fn context(temp: &TempDir, plan: Vec<BuildPlanEntry>, env: &[(&str, &str)]) -> BuildContext {
    let app = temp.path().join("app");
    std::fs::create_dir_all(&app).unwrap();
    std::fs::write(app.join("pom.xml"), "<project/>").unwrap();
    let resolver = ConfigResolver::from_pairs(env.iter().copied());
    let mut config = MavenConfig::resolve(&resolver);
    config.search_path = Some(temp.path().join("empty-bin").into_os_string());
    BuildContext {
      app_path: app,
      layers: Layers::new(temp.path().join("layers")),
      plan,
      resolver,
      config,
      catalog: crate::manager::tests::catalog(),
      cache: DependencyCache::new(temp.path().join("cache")),
      bindings: Bindings::default(),
      local_repository: Some(temp.path().join("home/.m2")),
      interactive: false,
    }
  }

  #[test]
  fn plan_stages_are_independent() {
    let temp = TempDir::new().unwrap();
    let stages = |plan| resolve_plan(&context(&temp, plan, &[]));

    assert_eq!(
      stages(default_entries()),
      Stages {
        install_maven: true,
        build_application: true
      }
    );
    assert_eq!(
      stages(vec![BuildPlanEntry::new("maven")]),
      Stages {
        install_maven: true,
        build_application: false
      }
    );
    assert_eq!(
      stages(vec![BuildPlanEntry::new("jvm-application-package")]),
      Stages {
        install_maven: false,
        build_application: true
      }
    );
  }

  #[test]
  fn arguments_use_maven_binding() {
    let temp = TempDir::new().unwrap();
    let binding_dir = temp.path().join("bindings/maven-settings");
    std::fs::create_dir_all(&binding_dir).unwrap();
    std::fs::write(binding_dir.join("type"), "maven").unwrap();
    std::fs::write(binding_dir.join("settings.xml"), "maven-settings-content").unwrap();

    let mut ctx = context(&temp, default_entries(), &[]);
    ctx.bindings = Bindings::load(&temp.path().join("bindings")).unwrap();

    let arguments = configure_arguments(&ctx).unwrap();

    assert_eq!(
      arguments.arguments[0],
      format!("--settings={}", binding_dir.join("settings.xml").display())
    );
    assert!(arguments.metadata.contains_key("settings-sha256"));
  }

  #[test]
  fn relative_settings_path_resolves_against_application() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, default_entries(), &[("BP_MAVEN_SETTINGS_PATH", "settings.xml")]);
    std::fs::write(ctx.app_path.join("settings.xml"), "maven-settings-content").unwrap();

    let arguments = configure_arguments(&ctx).unwrap();

    assert_eq!(
      arguments.arguments[0],
      format!("--settings={}", ctx.app_path.join("settings.xml").display())
    );
    assert_eq!(
      arguments.metadata["settings-sha256"],
      "cc784f356a8efb8e138b99aabe8b1c813a3e921b059c48a0b39b2497a2c478c5"
    );
  }

  #[tokio::test]
  async fn build_only_uses_wrapper() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, vec![BuildPlanEntry::new("jvm-application-package")], &[]);
    std::fs::write(ctx.app_path.join("mvnw"), "#!/bin/sh\r\n").unwrap();
    let maven = FakeMaven::default();

    let result = build(&ctx, &maven).await.unwrap();

    let runs = maven.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].command, ctx.app_path.join("mvnw"));
    assert!(result.bom.is_empty());
    let names: Vec<_> = result.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["cache", "application"]);
  }

  #[tokio::test]
  async fn build_only_without_maven_fails() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, vec![BuildPlanEntry::new("jvm-application-package")], &[]);

    let result = build(&ctx, &FakeMaven::default()).await;

    assert!(matches!(
      result,
      Err(BuildError::Manager(ManagerError::NotFound { .. }))
    ));
  }

  #[tokio::test]
  async fn empty_plan_only_assembles_arguments() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, vec![], &[("BP_MAVEN_ACTIVE_PROFILES", "prod")]);
    let maven = FakeMaven::default();

    let result = build(&ctx, &maven).await.unwrap();

    assert!(maven.runs.lock().unwrap().is_empty());
    assert!(result.layers.is_empty());
    assert_eq!(result.arguments.last().unwrap(), "prod");
    assert!(ctx.app_path.join("pom.xml").is_file());
  }

  #[tokio::test]
  async fn multiple_artifacts_write_descriptor() {
    let temp = TempDir::new().unwrap();
    let ctx = context(
      &temp,
      vec![BuildPlanEntry::new("jvm-application-package")],
      &[("BP_MAVEN_SUPPORT_MULTIPLE_ARTIFACTS", "true")],
    );
    std::fs::write(ctx.app_path.join("mvnw"), "#!/bin/sh\n").unwrap();
    let maven = FakeMaven::default();

    let result = build(&ctx, &maven).await.unwrap();

    assert!(result.arguments.contains(&"assembly:single".to_string()));
    // The descriptor is in the source tree Maven saw, then replaced by the artifact
    let layer = result.layers.iter().find(|l| l.name == "application").unwrap();
    let files = layer.metadata["files"].as_array().unwrap();
    assert!(files.iter().any(|f| f["path"] == "zip.xml"));
  }
}

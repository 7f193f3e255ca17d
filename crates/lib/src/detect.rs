//! Detection: decides whether this build participates and what it provides/requires.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::MavenConfig;
use crate::consts::{
  MANIFEST_PATH, PLAN_ENTRY_JDK, PLAN_ENTRY_JVM_APPLICATION_PACKAGE, PLAN_ENTRY_MAVEN, PLAN_ENTRY_NODE,
  PLAN_ENTRY_SYFT, PLAN_ENTRY_YARN,
};
use crate::plan::{BuildPlan, BuildPlanProvide, BuildPlanRequire, DetectResult};

#[derive(Debug, Error)]
pub enum DetectError {
  #[error("unable to determine if {path} exists: {source}")]
  Stat {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Inspect the application tree and offer build plans.
///
/// - A `META-INF/MANIFEST.MF` at the root means the application is already packaged:
///   detection fails.
/// - Otherwise Maven is always offered. When the POM exists, building the application
///   package is offered too, requiring a JDK, Maven and an SBOM scanner.
/// - With `BP_JAVA_INSTALL_NODE`, a `yarn.lock` or `package.json` adds Node (and Yarn)
///   as build-time requirements.
pub fn detect(app_path: &Path, config: &MavenConfig) -> Result<DetectResult, DetectError> {
  if app_path.join(MANIFEST_PATH).exists() {
    debug!(app = %app_path.display(), "found {}, application is pre-built", MANIFEST_PATH);
    return Ok(DetectResult::default());
  }

  let mut result = DetectResult {
    pass: true,
    plans: vec![
      // just offer to provide Maven
      BuildPlan {
        provides: vec![BuildPlanProvide::new(PLAN_ENTRY_MAVEN)],
        requires: vec![BuildPlanRequire::new(PLAN_ENTRY_JDK)],
      },
      // offer to install & build with Maven
      BuildPlan {
        provides: vec![
          BuildPlanProvide::new(PLAN_ENTRY_JVM_APPLICATION_PACKAGE),
          BuildPlanProvide::new(PLAN_ENTRY_MAVEN),
        ],
        requires: vec![],
      },
    ],
  };

  let pom = app_path.join(config.pom_location());
  if !exists(&pom)? {
    debug!(pom = %pom.display(), "no POM found, offering Maven only");
    return Ok(result);
  }

  // build-only
  result.plans.push(BuildPlan {
    provides: vec![BuildPlanProvide::new(PLAN_ENTRY_JVM_APPLICATION_PACKAGE)],
    requires: vec![],
  });

  let mut requires = vec![
    BuildPlanRequire::new(PLAN_ENTRY_SYFT),
    BuildPlanRequire::new(PLAN_ENTRY_JDK),
    BuildPlanRequire::new(PLAN_ENTRY_MAVEN),
  ];

  if config.install_node {
    requires.extend(node_requirements(app_path, config)?);
  }

  for plan in result.plans.iter_mut().skip(1) {
    plan.requires = requires.clone();
  }

  Ok(result)
}

/// Frontend requirements: `yarn.lock` wins over `package.json`.
fn node_requirements(app_path: &Path, config: &MavenConfig) -> Result<Vec<BuildPlanRequire>, DetectError> {
  let root = match &config.node_project_path {
    Some(sub) => app_path.join(sub),
    None => app_path.to_path_buf(),
  };

  if exists(&root.join("yarn.lock"))? {
    return Ok(vec![
      BuildPlanRequire::build(PLAN_ENTRY_YARN),
      BuildPlanRequire::build(PLAN_ENTRY_NODE),
    ]);
  }
  if exists(&root.join("package.json"))? {
    return Ok(vec![BuildPlanRequire::build(PLAN_ENTRY_NODE)]);
  }

  info!("unable to find a yarn.lock or package.json file, you may need to set BP_NODE_PROJECT_PATH");
  Ok(vec![])
}

fn exists(path: &Path) -> Result<bool, DetectError> {
  match std::fs::metadata(path) {
    Ok(_) => Ok(true),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
    Err(source) => Err(DetectError::Stat {
      path: path.to_path_buf(),
      source,
    }),
  }
}

use tracing::info;

use super::{Installation, ManagerContext, ManagerError, MavenManager};
use crate::consts::{MAVEN_BINARY, MAVEN_DEPENDENCY_ID};
use crate::distribution::Distribution;

/// Apache Maven downloaded into its own layer, pinned by `BP_MAVEN_VERSION`.
pub struct StandardManager<'a> {
  ctx: &'a ManagerContext,
}

impl<'a> StandardManager<'a> {
  pub fn new(ctx: &'a ManagerContext) -> Self {
    Self { ctx }
  }
}

impl MavenManager for StandardManager<'_> {
  fn name(&self) -> &'static str {
    "standard"
  }

  fn should_install(&self) -> bool {
    !self.ctx.config.daemon_enabled && !self.ctx.has_wrapper() && self.ctx.maven_on_path().is_none()
  }

  fn install(&self) -> Result<Installation, ManagerError> {
    let dependency = self
      .ctx
      .catalog
      .resolve(MAVEN_DEPENDENCY_ID, &self.ctx.config.maven_version)?;
    info!(version = %dependency.version, constraint = %self.ctx.config.maven_version, "using maven distribution");

    let (distribution, bom) = Distribution::new(dependency, self.ctx.cache.clone());
    let command = distribution.command(&self.ctx.layers, MAVEN_BINARY);

    Ok(Installation {
      command,
      layer: Some(distribution),
      bom: Some(bom),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dependency::DependencyError;
  use crate::manager::tests::context;
  use tempfile::TempDir;

  #[test]
  fn installs_maven_layer() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, &[]);

    let installation = StandardManager::new(&ctx).install().unwrap();

    assert_eq!(installation.command, temp.path().join("layers/maven/bin/mvn"));
    assert_eq!(installation.layer.unwrap().dependency.version, "3.9.9");
    assert_eq!(installation.bom.unwrap().name, "maven");
  }

  #[test]
  fn version_constraint_must_match() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, &[("BP_MAVEN_VERSION", "4")]);

    let result = StandardManager::new(&ctx).install();
    assert!(matches!(
      result,
      Err(ManagerError::Dependency(DependencyError::NoMatch { .. }))
    ));
  }

  #[test]
  fn does_not_apply_when_daemon_enabled() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, &[("BP_MAVEN_DAEMON_ENABLED", "true")]);
    assert!(!StandardManager::new(&ctx).should_install());
  }
}

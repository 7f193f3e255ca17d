use tracing::info;

use super::{Installation, ManagerContext, ManagerError, MavenManager};
use crate::consts::{DAEMON_BINARY, DAEMON_DEPENDENCY_ID};
use crate::distribution::Distribution;

/// Maven Daemon (`mvnd`) downloaded into its own layer.
pub struct DaemonManager<'a> {
  ctx: &'a ManagerContext,
}

impl<'a> DaemonManager<'a> {
  pub fn new(ctx: &'a ManagerContext) -> Self {
    Self { ctx }
  }
}

impl MavenManager for DaemonManager<'_> {
  fn name(&self) -> &'static str {
    "daemon"
  }

  fn should_install(&self) -> bool {
    self.ctx.config.daemon_enabled
  }

  fn install(&self) -> Result<Installation, ManagerError> {
    let dependency = self.ctx.catalog.resolve(DAEMON_DEPENDENCY_ID, "")?;
    info!(version = %dependency.version, "using maven daemon");

    let (distribution, bom) = Distribution::new(dependency, self.ctx.cache.clone());
    let command = distribution.command(&self.ctx.layers, DAEMON_BINARY);

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
  use crate::manager::tests::context;
  use tempfile::TempDir;

  #[test]
  fn applies_only_when_enabled() {
    let temp = TempDir::new().unwrap();
    assert!(!DaemonManager::new(&context(&temp, &[])).should_install());
    assert!(DaemonManager::new(&context(&temp, &[("BP_MAVEN_DAEMON_ENABLED", "true")])).should_install());
  }

  #[test]
  fn installs_mvnd_layer() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, &[("BP_MAVEN_DAEMON_ENABLED", "true")]);

    let installation = DaemonManager::new(&ctx).install().unwrap();

    assert_eq!(installation.command, temp.path().join("layers/mvnd/bin/mvnd"));
    assert_eq!(installation.layer.unwrap().name(), "mvnd");
    assert_eq!(installation.bom.unwrap().version, "1.0.2");
  }
}

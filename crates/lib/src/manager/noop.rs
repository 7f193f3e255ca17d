use tracing::info;

use super::{Installation, ManagerContext, ManagerError, MavenManager};
use crate::consts::MAVEN_BINARY;

/// `mvn` already present on the search path. Installs nothing.
pub struct NoopManager<'a> {
  ctx: &'a ManagerContext,
}

impl<'a> NoopManager<'a> {
  pub fn new(ctx: &'a ManagerContext) -> Self {
    Self { ctx }
  }
}

impl MavenManager for NoopManager<'_> {
  fn name(&self) -> &'static str {
    "noop"
  }

  fn should_install(&self) -> bool {
    !self.ctx.config.daemon_enabled && !self.ctx.has_wrapper() && self.ctx.maven_on_path().is_some()
  }

  fn install(&self) -> Result<Installation, ManagerError> {
    let command = self.ctx.maven_on_path().ok_or_else(|| ManagerError::NotFound {
      binary: MAVEN_BINARY.to_string(),
    })?;
    info!(command = ?command, "using maven from search path");
    Ok(Installation::command_only(command))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manager::tests::context;
  use tempfile::TempDir;

  #[test]
  fn missing_binary_is_not_found() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, &[]);

    let manager = NoopManager::new(&ctx);
    assert!(!manager.should_install());
    assert!(matches!(manager.install(), Err(ManagerError::NotFound { .. })));
  }

  #[cfg(unix)]
  #[test]
  fn resolves_binary_from_search_path() {
    let temp = TempDir::new().unwrap();
    let mut ctx = context(&temp, &[]);
    let mvn = crate::manager::tests::add_maven_to_path(&temp, &mut ctx);

    let installation = NoopManager::new(&ctx).install().unwrap();

    assert_eq!(installation.command, mvn);
    assert!(installation.layer.is_none());
    assert!(installation.bom.is_none());
  }
}

use std::path::Path;

use tracing::{info, warn};

use super::{Installation, ManagerContext, ManagerError, MavenManager};
use crate::consts::WRAPPER_PROPERTIES;

/// The project's own `mvnw`. The wrapper provisions Maven itself when it runs.
pub struct WrapperManager<'a> {
  ctx: &'a ManagerContext,
}

impl<'a> WrapperManager<'a> {
  pub fn new(ctx: &'a ManagerContext) -> Self {
    Self { ctx }
  }
}

impl MavenManager for WrapperManager<'_> {
  fn name(&self) -> &'static str {
    "wrapper"
  }

  fn should_install(&self) -> bool {
    self.ctx.has_wrapper()
  }

  fn install(&self) -> Result<Installation, ManagerError> {
    let command = self.ctx.wrapper_path();
    info!(command = ?command, "using maven wrapper");

    if let Err(e) = make_executable(&command) {
      warn!(path = ?command, error = %e, "unable to chmod wrapper");
    }

    if let Err(e) = strip_carriage_returns(&command) {
      warn!(path = ?command, error = %e, "unable to clean wrapper line endings");
    }

    let properties = self.ctx.app_path.join(WRAPPER_PROPERTIES);
    if properties.exists()
      && let Err(e) = strip_carriage_returns(&properties)
    {
      warn!(path = ?properties, error = %e, "unable to clean wrapper properties line endings");
    }

    Ok(Installation::command_only(command))
  }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
  Ok(())
}

/// Remove every `\r`, so a checkout with CRLF line endings still runs under `/bin/sh`.
fn strip_carriage_returns(path: &Path) -> std::io::Result<()> {
  let content = std::fs::read(path)?;
  if !content.contains(&b'\r') {
    return Ok(());
  }
  let cleaned: Vec<u8> = content.into_iter().filter(|b| *b != b'\r').collect();
  std::fs::write(path, cleaned)
}

//! Maven execution strategies.
//!
//! Four strategies compete to provide the `mvn` command. They are evaluated in a fixed
//! order and the first one that applies wins:
//!
//! 1. [`DaemonManager`] - Maven Daemon, when `BP_MAVEN_DAEMON_ENABLED` is set
//! 2. [`StandardManager`] - downloaded Maven distribution
//! 3. [`WrapperManager`] - the project's own `mvnw`
//! 4. [`NoopManager`] - `mvn` already on the search path
//!
//! Only the first two produce a layer and a bill-of-materials entry.

mod daemon;
mod noop;
mod standard;
mod wrapper;

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::archive::ArchiveError;
use crate::config::MavenConfig;
use crate::consts::MAVEN_BINARY;
use crate::dependency::{BomEntry, DependencyCache, DependencyCatalog, DependencyError};
use crate::distribution::Distribution;
use crate::layer::{LayerError, Layers};

pub use daemon::DaemonManager;
pub use noop::NoopManager;
pub use standard::StandardManager;
pub use wrapper::WrapperManager;

#[derive(Debug, Error)]
pub enum ManagerError {
  #[error("unable to install maven: no strategy applies")]
  NoApplicableManager,

  #[error("unable to find '{binary}' on the search path")]
  NotFound { binary: String },

  #[error("unable to find dependency: {0}")]
  Dependency(#[from] DependencyError),

  #[error("unable to expand distribution: {0}")]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Layer(#[from] LayerError),
}

/// What a strategy hands back: the command to run and, for downloaded distributions,
/// the layer to contribute and its bill-of-materials entry.
#[derive(Debug, Clone)]
pub struct Installation {
  pub command: PathBuf,
  pub layer: Option<Distribution>,
  pub bom: Option<BomEntry>,
}

impl Installation {
  fn command_only(command: PathBuf) -> Self {
    Self {
      command,
      layer: None,
      bom: None,
    }
  }
}

/// One way of providing Maven.
pub trait MavenManager {
  fn name(&self) -> &'static str;

  /// Whether this strategy applies to the current project and environment.
  ///
  /// Must not modify anything.
  fn should_install(&self) -> bool;

  fn install(&self) -> Result<Installation, ManagerError>;
}

/// Everything the strategies inspect or install into.
#[derive(Debug, Clone)]
pub struct ManagerContext {
  pub app_path: PathBuf,
  pub layers: Layers,
  pub config: MavenConfig,
  pub catalog: DependencyCatalog,
  pub cache: DependencyCache,
}

impl ManagerContext {
  pub(crate) fn wrapper_path(&self) -> PathBuf {
    self.app_path.join(crate::consts::WRAPPER_SCRIPT)
  }

  pub(crate) fn has_wrapper(&self) -> bool {
    // symlink_metadata so that a dangling mvnw still counts as present
    std::fs::symlink_metadata(self.wrapper_path()).is_ok()
  }

  /// `mvn` resolved against the configured search path.
  pub(crate) fn maven_on_path(&self) -> Option<PathBuf> {
    let search_path = self.config.search_path.as_ref()?;
    which::which_in(MAVEN_BINARY, Some(search_path), &self.app_path).ok()
  }
}

/// The strategies in evaluation order.
pub fn chain(ctx: &ManagerContext) -> Vec<Box<dyn MavenManager + '_>> {
  vec![
    Box::new(DaemonManager::new(ctx)),
    Box::new(StandardManager::new(ctx)),
    Box::new(WrapperManager::new(ctx)),
    Box::new(NoopManager::new(ctx)),
  ]
}

/// The first strategy in `chain` that applies.
pub fn select<'a, 'b>(chain: &'a [Box<dyn MavenManager + 'b>]) -> Result<&'a (dyn MavenManager + 'b), ManagerError> {
  for manager in chain {
    let applies = manager.should_install();
    debug!(manager = manager.name(), applies, "evaluated maven manager");
    if applies {
      return Ok(manager.as_ref());
    }
  }
  Err(ManagerError::NoApplicableManager)
}

//! Layer backing the Maven local repository.
//!
//! `~/.m2` is replaced by a symlink into a cached layer, so downloaded plugins and
//! dependencies survive between builds.

use std::path::{Path, PathBuf};

use serde_json::Map;
use tracing::{info, warn};

use crate::layer::{Layer, LayerContributor, LayerError, LayerTypes, Layers};

pub const CACHE_LAYER: &str = "cache";

#[derive(Debug, Clone)]
pub struct LocalRepositoryCache {
  /// Where Maven looks for its local repository, normally `~/.m2`.
  pub path: PathBuf,
}

impl LocalRepositoryCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub async fn contribute(&self, layers: &Layers) -> Result<Layer, LayerError> {
    let layer = LayerContributor::new(CACHE_LAYER, Map::new(), LayerTypes::BUILD_CACHE)
      .contribute(layers, |layer| async move { Ok::<_, LayerError>(layer) })
      .await?;

    match std::fs::symlink_metadata(&self.path) {
      Ok(metadata) if metadata.file_type().is_symlink() => {
        let target = std::fs::read_link(&self.path).map_err(|source| LayerError::Io {
          path: self.path.clone(),
          source,
        })?;
        if target == layer.path {
          info!(path = ?self.path, "cache already exists");
          return Ok(layer);
        }
        std::fs::remove_file(&self.path).map_err(|source| LayerError::Io {
          path: self.path.clone(),
          source,
        })?;
      }
      Ok(_) => {
        warn!(path = ?self.path, "local repository already exists, not linking cache layer");
        return Ok(layer);
      }
      Err(_) => {}
    }

    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| LayerError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    link(&layer.path, &self.path).map_err(|source| LayerError::Io {
      path: self.path.clone(),
      source,
    })?;

    info!(path = ?self.path, target = ?layer.path, "creating cache directory");
    Ok(layer)
  }
}

#[cfg(unix)]
fn link(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn link(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
  #[error("unable to read layer metadata {path}: {message}")]
  ReadMetadata { path: PathBuf, message: String },

  #[error("unable to write layer metadata {path}: {message}")]
  WriteMetadata { path: PathBuf, message: String },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Where a layer is visible: later build steps, future builds, the running image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTypes {
  #[serde(default)]
  pub build: bool,
  #[serde(default)]
  pub cache: bool,
  #[serde(default)]
  pub launch: bool,
}

impl LayerTypes {
  pub const BUILD_CACHE: LayerTypes = LayerTypes {
    build: true,
    cache: true,
    launch: false,
  };

  pub const CACHE: LayerTypes = LayerTypes {
    build: false,
    cache: true,
    launch: false,
  };
}

/// On-disk form of `<layers>/<name>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct LayerFile {
  #[serde(default)]
  types: LayerTypes,
  #[serde(default)]
  metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
  pub name: String,
  pub path: PathBuf,
  pub metadata_path: PathBuf,
  pub types: LayerTypes,
  pub metadata: Map<String, Value>,
}

/// The directory all layers of one build are written under.
#[derive(Debug, Clone)]
pub struct Layers {
  root: PathBuf,
}

impl Layers {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Load layer `name` with whatever metadata a previous build stored for it.
  ///
  /// A layer that was never written comes back with empty metadata and no types.
  pub fn layer(&self, name: &str) -> Result<Layer, LayerError> {
    let metadata_path = self.root.join(format!("{}.json", name));

    let stored = if metadata_path.exists() {
      let content = std::fs::read_to_string(&metadata_path).map_err(|e| LayerError::ReadMetadata {
        path: metadata_path.clone(),
        message: e.to_string(),
      })?;
      serde_json::from_str(&content).map_err(|e| LayerError::ReadMetadata {
        path: metadata_path.clone(),
        message: e.to_string(),
      })?
    } else {
      LayerFile::default()
    };

    Ok(Layer {
      name: name.to_string(),
      path: self.root.join(name),
      metadata_path,
      types: stored.types,
      metadata: stored.metadata,
    })
  }

  /// Persist a layer's types and metadata.
  pub async fn write(&self, layer: &Layer) -> Result<(), LayerError> {
    let file = LayerFile {
      types: layer.types,
      metadata: layer.metadata.clone(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|e| LayerError::WriteMetadata {
      path: layer.metadata_path.clone(),
      message: e.to_string(),
    })?;

    tokio::fs::create_dir_all(&self.root).await.map_err(|source| LayerError::Io {
      path: self.root.clone(),
      source,
    })?;
    tokio::fs::write(&layer.metadata_path, content)
      .await
      .map_err(|e| LayerError::WriteMetadata {
        path: layer.metadata_path.clone(),
        message: e.to_string(),
      })
  }
}

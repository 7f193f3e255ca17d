use std::future::Future;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{Layer, LayerError, LayerTypes, Layers};

/// Contributes one layer, skipping the work when the layer is already current.
#[derive(Debug, Clone)]
pub struct LayerContributor {
  pub name: String,
  pub expected: Map<String, Value>,
  pub types: LayerTypes,
}

impl LayerContributor {
  pub fn new(name: impl Into<String>, expected: Map<String, Value>, types: LayerTypes) -> Self {
    Self {
      name: name.into(),
      expected,
      types,
    }
  }

  /// Produce the layer.
  ///
  /// When the stored metadata equals `expected` and the layer directory exists, the
  /// layer is returned as-is and `create` is not called. Otherwise the directory is
  /// emptied, `create` populates it, and the expected metadata is recorded.
  pub async fn contribute<F, Fut, E>(&self, layers: &Layers, create: F) -> Result<Layer, E>
  where
    F: FnOnce(Layer) -> Fut,
    Fut: Future<Output = Result<Layer, E>>,
    E: From<LayerError>,
  {
    let mut layer = layers.layer(&self.name)?;

    if layer.metadata == self.expected && layer.path.is_dir() {
      info!(layer = %self.name, "reusing cached layer");
      if layer.types != self.types {
        layer.types = self.types;
        layers.write(&layer).await?;
      }
      return Ok(layer);
    }

    debug!(layer = %self.name, "layer metadata changed, contributing");
    // Metadata is rewritten only once `create` succeeds
    if layer.metadata_path.exists() {
      tokio::fs::remove_file(&layer.metadata_path)
        .await
        .map_err(|source| LayerError::Io {
          path: layer.metadata_path.clone(),
          source,
        })?;
    }
    if layer.path.exists() {
      tokio::fs::remove_dir_all(&layer.path).await.map_err(|source| LayerError::Io {
        path: layer.path.clone(),
        source,
      })?;
    }
    tokio::fs::create_dir_all(&layer.path).await.map_err(|source| LayerError::Io {
      path: layer.path.clone(),
      source,
    })?;

    layer.types = self.types;
    layer.metadata = self.expected.clone();

    let layer = create(layer).await?;
    layers.write(&layer).await?;

    info!(layer = %self.name, path = ?layer.path, "layer contributed");
    Ok(layer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tempfile::TempDir;

  fn expected(version: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("version".to_string(), json!(version));
    map
  }

  async fn populate(layer: Layer, calls: &AtomicUsize) -> Result<Layer, LayerError> {
    calls.fetch_add(1, Ordering::SeqCst);
    std::fs::write(layer.path.join("marker"), "x").unwrap();
    Ok(layer)
  }

  #[tokio::test]
  async fn identical_metadata_contributes_once() {
    let temp = TempDir::new().unwrap();
    let layers = Layers::new(temp.path());
    let contributor = LayerContributor::new("maven", expected("3.9.9"), LayerTypes::BUILD_CACHE);
    let calls = AtomicUsize::new(0);

    let first = contributor.contribute(&layers, |l| populate(l, &calls)).await.unwrap();
    let second = contributor.contribute(&layers, |l| populate(l, &calls)).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert!(second.path.join("marker").is_file());
  }

  #[tokio::test]
  async fn changed_metadata_rebuilds_from_empty_directory() {
    let temp = TempDir::new().unwrap();
    let layers = Layers::new(temp.path());
    let calls = AtomicUsize::new(0);

    LayerContributor::new("maven", expected("3.9.8"), LayerTypes::BUILD_CACHE)
      .contribute(&layers, |l| populate(l, &calls))
      .await
      .unwrap();
    std::fs::write(temp.path().join("maven/stale"), "old").unwrap();

    let layer = LayerContributor::new("maven", expected("3.9.9"), LayerTypes::BUILD_CACHE)
      .contribute(&layers, |l| populate(l, &calls))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!layer.path.join("stale").exists());
    assert_eq!(layers.layer("maven").unwrap().metadata, expected("3.9.9"));
  }

  #[tokio::test]
  async fn failed_contribution_leaves_no_metadata() {
    let temp = TempDir::new().unwrap();
    let layers = Layers::new(temp.path());

    let result = LayerContributor::new("maven", expected("3.9.9"), LayerTypes::BUILD_CACHE)
      .contribute(&layers, |l| async move {
        Err::<Layer, LayerError>(LayerError::Io {
          path: l.path,
          source: std::io::Error::other("download interrupted"),
        })
      })
      .await;

    assert!(result.is_err());
    assert!(!temp.path().join("maven.json").exists());
  }
}

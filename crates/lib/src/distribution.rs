//! Layers holding a downloaded Maven or Maven Daemon distribution.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::info;

use crate::archive;
use crate::dependency::{BomEntry, Dependency, DependencyCache};
use crate::layer::{Layer, LayerContributor, LayerTypes, Layers};
use crate::manager::ManagerError;

/// A distribution expanded into the layer named after its dependency id.
#[derive(Debug, Clone)]
pub struct Distribution {
  pub dependency: Dependency,
  cache: DependencyCache,
}

impl Distribution {
  pub fn new(dependency: Dependency, cache: DependencyCache) -> (Self, BomEntry) {
    let bom = dependency.bom_entry();
    (Self { dependency, cache }, bom)
  }

  pub fn name(&self) -> &str {
    &self.dependency.id
  }

  /// Path of `binary` once the distribution has been expanded under `layers`.
  pub fn command(&self, layers: &Layers, binary: &str) -> PathBuf {
    layers.root().join(self.name()).join("bin").join(binary)
  }

  /// The dependency's identity, used as the layer's cache key.
  pub fn expected_metadata(&self) -> Map<String, Value> {
    let mut expected = Map::new();
    expected.insert(
      "dependency".to_string(),
      serde_json::to_value(&self.dependency).unwrap_or(Value::Null),
    );
    expected
  }

  pub async fn contribute(&self, layers: &Layers) -> Result<Layer, ManagerError> {
    let contributor = LayerContributor::new(self.name(), self.expected_metadata(), LayerTypes::BUILD_CACHE);

    contributor
      .contribute(layers, |layer| async move {
        let artifact = self.cache.artifact(&self.dependency).await?;
        info!(layer = %layer.name, path = ?layer.path, "expanding distribution");
        archive::extract(&artifact, &layer.path, 1)?;
        Ok::<_, ManagerError>(layer)
      })
      .await
  }
}

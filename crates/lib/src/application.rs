//! The compiled application layer.
//!
//! Runs Maven, copies the located artifact into the layer as `application.zip`, then
//! replaces the application's source tree with the artifact's contents. The layer is
//! keyed by the command line, settings digests and a listing of the source tree, so an
//! unchanged project skips the Maven run entirely.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{self, ArchiveError};
use crate::artifact::{ArtifactError, ArtifactLocator};
use crate::consts::APPLICATION_ARCHIVE;
use crate::execute::{ExecuteError, Execution, Executor};
use crate::layer::{Layer, LayerContributor, LayerError, LayerTypes, Layers};
use crate::util::hash::{HashError, file_listing};

pub const APPLICATION_LAYER: &str = "application";

#[derive(Debug, Error)]
pub enum ApplicationError {
  #[error("unable to create file listing for {path}: {source}")]
  Listing {
    path: PathBuf,
    #[source]
    source: HashError,
  },

  #[error("error running build: {0}")]
  Execute(#[from] ExecuteError),

  #[error("unable to resolve artifact: {0}")]
  Artifact(#[from] ArtifactError),

  #[error("unable to extract application: {0}")]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Layer(#[from] LayerError),

  #[error("unable to {operation} {path}: {source}")]
  Io {
    operation: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub struct Application<'a, X> {
  pub execution: Execution,
  /// Extra fingerprint entries, such as settings digests.
  pub metadata: Map<String, Value>,
  pub locator: ArtifactLocator,
  pub executor: &'a X,
}

impl<X: Executor> Application<'_, X> {
  fn app_path(&self) -> &Path {
    &self.execution.dir
  }

  pub fn expected_metadata(&self) -> Result<Map<String, Value>, ApplicationError> {
    let listing = file_listing(self.app_path()).map_err(|source| ApplicationError::Listing {
      path: self.app_path().to_path_buf(),
      source,
    })?;

    let mut expected = self.metadata.clone();
    expected.insert("arguments".to_string(), Value::from(self.execution.arguments.clone()));
    let command = self
      .execution
      .command
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    expected.insert("command".to_string(), Value::String(command));
    expected.insert(
      "files".to_string(),
      serde_json::to_value(listing).unwrap_or(Value::Null),
    );
    Ok(expected)
  }

  /// Build (or reuse) the layer, then swap the source tree for the built artifact.
  pub async fn contribute(&self, layers: &Layers) -> Result<Layer, ApplicationError> {
    let contributor = LayerContributor::new(APPLICATION_LAYER, self.expected_metadata()?, LayerTypes::CACHE);

    let layer = contributor
      .contribute(layers, |layer| async move {
        self.executor.execute(&self.execution).await?;

        let artifact = self.locator.locate(self.app_path())?;
        let dest = layer.path.join(APPLICATION_ARCHIVE);
        info!(artifact = ?artifact, dest = ?dest, "copying built artifact");
        tokio::fs::copy(&artifact, &dest)
          .await
          .map_err(|source| ApplicationError::Io {
            operation: "copy artifact to",
            path: dest.clone(),
            source,
          })?;
        Ok::<_, ApplicationError>(layer)
      })
      .await?;

    info!(path = ?self.app_path(), "removing source code");
    remove_children(self.app_path()).await?;

    let archive_path = layer.path.join(APPLICATION_ARCHIVE);
    archive::extract(&archive_path, self.app_path(), 0)?;
    debug!(archive = ?archive_path, "restored application from layer");

    Ok(layer)
  }
}

/// Delete everything inside `dir`, leaving `dir` itself.
async fn remove_children(dir: &Path) -> Result<(), ApplicationError> {
  let io_err = |operation: &'static str, path: &Path| {
    let path = path.to_path_buf();
    move |source| ApplicationError::Io { operation, path, source }
  };

  let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err("list", dir))?;
  while let Some(entry) = entries.next_entry().await.map_err(io_err("list", dir))? {
    let path = entry.path();
    let file_type = entry.file_type().await.map_err(io_err("stat", &path))?;
    if file_type.is_dir() {
      tokio::fs::remove_dir_all(&path).await.map_err(io_err("remove", &path))?;
    } else {
      tokio::fs::remove_file(&path).await.map_err(io_err("remove", &path))?;
    }
  }
  Ok(())
}

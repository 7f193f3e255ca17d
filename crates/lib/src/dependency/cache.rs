//! Dependency download cache.
//!
//! Downloads land in `<root>/<sha256>/<file name>` and are verified against the
//! catalog's SHA-256 before being written. A file already present with the expected
//! digest is reused without touching the network.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::{Dependency, DependencyError};
use crate::util::hash::{hash_bytes, hash_file};

#[derive(Debug, Clone)]
pub struct DependencyCache {
  root: PathBuf,
}

impl DependencyCache {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the verified artifact for `dependency`, downloading it if needed.
  pub async fn artifact(&self, dependency: &Dependency) -> Result<PathBuf, DependencyError> {
    let dir = self.root.join(&dependency.sha256);
    let dest_path = dir.join(file_name(dependency));

    if dest_path.is_file() {
      match hash_file(&dest_path) {
        Ok(actual) if actual.0 == dependency.sha256 => {
          info!(id = %dependency.id, version = %dependency.version, path = ?dest_path, "reusing cached download");
          return Ok(dest_path);
        }
        Ok(actual) => debug!(path = ?dest_path, actual = %actual, "stale cached download"),
        Err(e) => debug!(path = ?dest_path, error = %e, "unreadable cached download"),
      }
    }

    info!(id = %dependency.id, version = %dependency.version, uri = %dependency.uri, "downloading dependency");
    let bytes = fetch_bytes(&dependency.uri).await?;

    let actual = hash_bytes(&bytes);
    if actual.0 != dependency.sha256 {
      return Err(DependencyError::HashMismatch {
        uri: dependency.uri.clone(),
        expected: dependency.sha256.clone(),
        actual: actual.0,
      });
    }

    fs::create_dir_all(&dir).await.map_err(|source| DependencyError::Io {
      path: dir.clone(),
      source,
    })?;
    fs::write(&dest_path, &bytes).await.map_err(|source| DependencyError::Io {
      path: dest_path.clone(),
      source,
    })?;

    info!(path = ?dest_path, size = bytes.len(), "download complete");
    Ok(dest_path)
  }
}

/// Read the bytes behind `uri`. `file://` URIs are read from the local filesystem.
async fn fetch_bytes(uri: &str) -> Result<Vec<u8>, DependencyError> {
  if let Some(path) = uri.strip_prefix("file://") {
    return fs::read(path).await.map_err(|e| DependencyError::FetchFailed {
      uri: uri.to_string(),
      message: e.to_string(),
    });
  }

  let fetch_err = |message: String| DependencyError::FetchFailed {
    uri: uri.to_string(),
    message,
  };

  let response = reqwest::get(uri).await.map_err(|e| fetch_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_err(format!("HTTP {}", response.status())));
  }
  let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
  Ok(bytes.to_vec())
}

/// Name of the cached file: the last URI segment, or `<id>-<version>` when the URI
/// does not end in a usable name. The extension decides how the archive is unpacked.
fn file_name(dependency: &Dependency) -> String {
  let path = dependency.uri.split(['?', '#']).next().unwrap_or_default();
  match path.rsplit('/').next() {
    Some(name) if !name.is_empty() && name != "." && name != ".." && !name.contains('\\') => name.to_string(),
    _ => format!("{}-{}", dependency.id, dependency.version),
  }
}

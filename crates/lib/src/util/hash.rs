//! Hashing utilities for layer fingerprints and settings digests.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hex digest
//! - `file_listing()`: Deterministic listing of a source tree for cache keys
//! - `hash_file()`: Single file hashing
//! - `hash_bytes()`: Arbitrary byte hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash for content verification.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing a file or walking a tree.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to walk directory {path}: {message}")]
  WalkDir { path: String, message: String },

  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read symlink {path}: {source}")]
  ReadSymlink {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// One entry of a source tree listing.
///
/// Directories carry no digest; symlinks are hashed by their target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
  pub path: String,
  pub mode: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sha256: Option<String>,
}

/// List every entry below `path`, sorted by relative path.
///
/// The listing covers file contents, directory structure and symlink targets, but not
/// timestamps, so that two checkouts of the same sources produce the same listing.
pub fn file_listing(path: &Path) -> Result<Vec<FileEntry>, HashError> {
  let mut entries = Vec::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| HashError::WalkDir {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    // Skip the root directory itself
    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let sha256 = if file_type.is_file() {
      Some(hash_file(entry_path)?.0)
    } else if file_type.is_dir() {
      None
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|source| HashError::ReadSymlink {
        path: entry_path.display().to_string(),
        source,
      })?;
      Some(hash_bytes(target.to_string_lossy().as_bytes()).0)
    } else {
      // Skip special files (sockets, devices, etc.)
      continue;
    };

    entries.push(FileEntry {
      path: rel_path,
      mode: file_mode(&entry),
      sha256,
    });
  }

  entries.sort_by(|a, b| a.path.cmp(&b.path));
  Ok(entries)
}

#[cfg(unix)]
fn file_mode(entry: &walkdir::DirEntry) -> String {
  use std::os::unix::fs::PermissionsExt;
  match entry.metadata() {
    Ok(metadata) => format!("{:04o}", metadata.permissions().mode() & 0o7777),
    Err(_) => String::new(),
  }
}

#[cfg(not(unix))]
fn file_mode(entry: &walkdir::DirEntry) -> String {
  if entry.file_type().is_dir() {
    "0755".to_string()
  } else {
    "0644".to_string()
  }
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA-256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let mut file = fs::File::open(path).map_err(|source| HashError::ReadFile {
    path: path.display().to_string(),
    source,
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|source| HashError::ReadFile {
      path: path.display().to_string(),
      source,
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn hash_bytes_matches_known_digest() {
    assert_eq!(
      hash_bytes(b"maven-settings-content").0,
      "cc784f356a8efb8e138b99aabe8b1c813a3e921b059c48a0b39b2497a2c478c5"
    );
  }

  #[test]
  fn hash_file_matches_hash_bytes() {
    let temp = tempdir().unwrap();
    let file_path = temp.path().join("settings.xml");
    fs::write(&file_path, "maven-settings-security-content").unwrap();

    let hash = hash_file(&file_path).unwrap();
    assert_eq!(hash, hash_bytes(b"maven-settings-security-content"));
    assert_eq!(
      hash.0,
      "91dff74ef3ab7f5ccb5808b32c30d2ab35b9f699d9a613c05a7f45eb83dd4c3a"
    );
  }

  #[test]
  fn hash_file_missing_is_error() {
    let temp = tempdir().unwrap();
    let result = hash_file(&temp.path().join("missing"));
    assert!(matches!(result, Err(HashError::ReadFile { .. })));
  }

  #[test]
  fn listing_of_empty_directory_is_empty() {
    let temp = tempdir().unwrap();
    assert!(file_listing(temp.path()).unwrap().is_empty());
  }

  #[test]
  fn listing_is_sorted_and_deterministic() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("pom.xml"), "<project/>").unwrap();
    fs::create_dir_all(temp.path().join("src/main")).unwrap();
    fs::write(temp.path().join("src/main/App.java"), "class App {}").unwrap();

    let first = file_listing(temp.path()).unwrap();
    let second = file_listing(temp.path()).unwrap();
    assert_eq!(first, second);

    let paths: Vec<_> = first.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["pom.xml", "src", "src/main", "src/main/App.java"]);
    assert!(first[1].sha256.is_none());
    assert_eq!(first[0].sha256.as_deref(), Some(hash_bytes(b"<project/>").0.as_str()));
  }

  #[test]
  fn listing_changes_with_content() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("pom.xml"), "original").unwrap();
    let before = file_listing(temp.path()).unwrap();

    fs::write(temp.path().join("pom.xml"), "modified").unwrap();
    let after = file_listing(temp.path()).unwrap();

    assert_ne!(before, after);
  }

  #[test]
  #[cfg(unix)]
  fn listing_includes_symlinks() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("target.txt"), "target content").unwrap();
    std::os::unix::fs::symlink("target.txt", temp.path().join("link")).unwrap();

    let listing = file_listing(temp.path()).unwrap();
    let link = listing.iter().find(|e| e.path == "link").unwrap();
    assert_eq!(link.sha256.as_deref(), Some(hash_bytes(b"target.txt").0.as_str()));
  }
}

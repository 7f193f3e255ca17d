use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DependencyError {
  #[error("unable to read dependency catalog {path}: {source}")]
  ReadCatalog {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unable to parse dependency catalog {path}: {message}")]
  ParseCatalog { path: PathBuf, message: String },

  #[error("invalid version constraint {constraint:?} for {id}: {message}")]
  InvalidConstraint {
    id: String,
    constraint: String,
    message: String,
  },

  #[error("invalid version {version:?} for dependency {id}: {message}")]
  InvalidVersion {
    id: String,
    version: String,
    message: String,
  },

  #[error("no valid dependencies for {id}, {constraint:?} in [{}]", .available.join(", "))]
  NoMatch {
    id: String,
    constraint: String,
    available: Vec<String>,
  },

  #[error("fetch failed for {uri}: {message}")]
  FetchFailed { uri: String, message: String },

  #[error("hash mismatch for {uri}: expected {expected}, got {actual}")]
  HashMismatch {
    uri: String,
    expected: String,
    actual: String,
  },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A downloadable, checksummed artifact such as a Maven distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub version: String,
  pub uri: String,
  pub sha256: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub purl: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub cpes: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub licenses: Vec<String>,
}

impl Dependency {
  /// Bill-of-materials entry for a dependency used at build time.
  pub fn bom_entry(&self) -> BomEntry {
    BomEntry {
      name: self.id.clone(),
      version: self.version.clone(),
      purl: self.purl.clone(),
      cpes: self.cpes.clone(),
      licenses: self.licenses.clone(),
      uri: self.uri.clone(),
      sha256: self.sha256.clone(),
      build: true,
      launch: false,
    }
  }
}

/// Provenance record for one resolved dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEntry {
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub purl: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub cpes: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub licenses: Vec<String>,
  pub uri: String,
  pub sha256: String,
  pub build: bool,
  pub launch: bool,
}

/// The dependencies available to this build, read from a TOML file:
///
/// ```toml
/// [[dependencies]]
/// id = "maven"
/// version = "3.9.9"
/// uri = "https://archive.apache.org/dist/maven/maven-3/3.9.9/binaries/apache-maven-3.9.9-bin.tar.gz"
/// sha256 = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCatalog {
  #[serde(default)]
  pub dependencies: Vec<Dependency>,
}

impl DependencyCatalog {
  pub fn load(path: &Path) -> Result<Self, DependencyError> {
    let content = std::fs::read_to_string(path).map_err(|source| DependencyError::ReadCatalog {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|e| DependencyError::ParseCatalog {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }

  /// The highest version of `id` satisfying `constraint`.
  ///
  /// An empty constraint or `*` accepts any version. Versions with fewer than three
  /// components are padded (`3.9` compares as `3.9.0`).
  pub fn resolve(&self, id: &str, constraint: &str) -> Result<Dependency, DependencyError> {
    let constraint = constraint.trim();
    let req = if constraint.is_empty() || constraint == "*" {
      VersionReq::STAR
    } else {
      VersionReq::parse(constraint).map_err(|e| DependencyError::InvalidConstraint {
        id: id.to_string(),
        constraint: constraint.to_string(),
        message: e.to_string(),
      })?
    };

    let mut best: Option<(Version, &Dependency)> = None;
    let mut available = Vec::new();
    for dependency in self.dependencies.iter().filter(|d| d.id == id) {
      available.push(dependency.version.clone());
      let version = parse_version(id, &dependency.version)?;
      if !req.matches(&version) {
        continue;
      }
      if best.as_ref().is_none_or(|(v, _)| version > *v) {
        best = Some((version, dependency));
      }
    }

    best.map(|(_, d)| d.clone()).ok_or_else(|| DependencyError::NoMatch {
      id: id.to_string(),
      constraint: constraint.to_string(),
      available,
    })
  }
}

fn parse_version(id: &str, version: &str) -> Result<Version, DependencyError> {
  let (core, rest) = match version.find(['-', '+']) {
    Some(idx) => version.split_at(idx),
    None => (version, ""),
  };
  let padded = match core.matches('.').count() {
    0 => format!("{}.0.0{}", core, rest),
    1 => format!("{}.0{}", core, rest),
    _ => version.to_string(),
  };
  Version::parse(&padded).map_err(|e| DependencyError::InvalidVersion {
    id: id.to_string(),
    version: version.to_string(),
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dep(id: &str, version: &str) -> Dependency {
    Dependency {
      id: id.to_string(),
      name: None,
      version: version.to_string(),
      uri: format!("https://localhost/{}-{}.tar.gz", id, version),
      sha256: "31ba45356e22aff670af88170f43ff82328e6f323c3ce891ba422bd1031e3308".to_string(),
      purl: Some(format!("pkg:generic/{}@{}", id, version)),
      cpes: vec![],
      licenses: vec![],
    }
  }

  fn catalog() -> DependencyCatalog {
    DependencyCatalog {
      dependencies: vec![
        dep("maven", "3.3.3"),
        dep("maven", "3.9"),
        dep("maven", "5.5.5"),
        dep("mvnd", "1.0.2"),
      ],
    }
  }

  #[test]
  fn resolves_highest_matching_major() {
    assert_eq!(catalog().resolve("maven", "3").unwrap().version, "3.9");
    assert_eq!(catalog().resolve("maven", "5").unwrap().version, "5.5.5");
  }

  #[test]
  fn empty_constraint_matches_anything() {
    assert_eq!(catalog().resolve("maven", "").unwrap().version, "5.5.5");
    assert_eq!(catalog().resolve("mvnd", "*").unwrap().version, "1.0.2");
  }

  #[test]
  fn unmatched_constraint_lists_available_versions() {
    let err = catalog().resolve("maven", "4").unwrap_err();
    match &err {
      DependencyError::NoMatch { available, .. } => assert_eq!(available, &vec!["3.3.3", "3.9", "5.5.5"]),
      other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("3.3.3, 3.9, 5.5.5"));
  }

  #[test]
  fn unknown_id_is_no_match() {
    assert!(matches!(
      catalog().resolve("gradle", ""),
      Err(DependencyError::NoMatch { .. })
    ));
  }

  #[test]
  fn invalid_constraint_is_reported() {
    assert!(matches!(
      catalog().resolve("maven", "three"),
      Err(DependencyError::InvalidConstraint { .. })
    ));
  }

  #[test]
  fn parses_catalog_toml() {
    let catalog: DependencyCatalog = toml::from_str(
      r#"
        [[dependencies]]
        id = "maven"
        name = "Apache Maven"
        version = "3.9.9"
        uri = "https://example.com/apache-maven-3.9.9-bin.tar.gz"
        sha256 = "abc"
        cpes = ["cpe:2.3:a:apache:maven:3.9.9:*:*:*:*:*:*:*"]
      "#,
    )
    .unwrap();
    assert_eq!(catalog.dependencies.len(), 1);
    assert_eq!(catalog.dependencies[0].name.as_deref(), Some("Apache Maven"));
    assert_eq!(catalog.dependencies[0].cpes.len(), 1);
  }

  #[test]
  fn bom_entry_is_build_only() {
    let entry = dep("mvnd", "1.0.2").bom_entry();
    assert_eq!(entry.name, "mvnd");
    assert!(entry.build);
    assert!(!entry.launch);
  }
}

//! Locating the artifact a Maven build produced.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::MavenConfig;
use crate::consts::{DEFAULT_TARGET, MANIFEST_PATH, WEB_INF_DIR};

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("invalid artifact pattern {pattern}: {message}")]
  Pattern { pattern: String, message: String },

  #[error("unable to expand {pattern}: {message}")]
  Glob { pattern: String, message: String },

  #[error("unable to inspect candidate {path}: {message}")]
  Inspect { path: PathBuf, message: String },

  #[error(
    "unable to find built artifact (executable JAR or WAR) in {pattern}, candidates: [{}]",
    .candidates.iter().map(|c| c.display().to_string()).collect::<Vec<_>>().join(", ")
  )]
  NotFound { pattern: String, candidates: Vec<PathBuf> },
}

/// Finds the single build output below an application root.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
  pub pattern: String,
}

impl ArtifactLocator {
  /// The effective pattern: an explicit artifact wins over a module, which scopes the
  /// default target.
  pub fn from_config(config: &MavenConfig) -> Self {
    let pattern = match (&config.built_artifact, &config.built_module) {
      (Some(artifact), _) => artifact.clone(),
      (None, Some(module)) => format!("{}/{}", module.trim_end_matches('/'), DEFAULT_TARGET),
      (None, None) => DEFAULT_TARGET.to_string(),
    };
    Self { pattern }
  }

  pub fn locate(&self, app_path: &Path) -> Result<PathBuf, ArtifactError> {
    let full_pattern = app_path.join(&self.pattern).to_string_lossy().into_owned();
    let mut candidates = expand(&full_pattern)?;
    candidates.sort();
    debug!(pattern = %full_pattern, candidates = ?candidates, "expanded artifact pattern");

    if candidates.len() == 1 {
      return Ok(candidates.remove(0));
    }

    let mut interesting = Vec::new();
    for candidate in &candidates {
      if is_interesting(candidate)? {
        interesting.push(candidate.clone());
      }
    }

    if interesting.len() == 1 {
      debug!(artifact = ?interesting[0], "selected executable or web archive");
      return Ok(interesting.remove(0));
    }

    Err(ArtifactError::NotFound {
      pattern: full_pattern,
      candidates,
    })
  }
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>, ArtifactError> {
  let paths = glob::glob(pattern).map_err(|e| ArtifactError::Pattern {
    pattern: pattern.to_string(),
    message: e.to_string(),
  })?;
  paths
    .map(|entry| {
      entry.map_err(|e| ArtifactError::Glob {
        pattern: pattern.to_string(),
        message: e.to_string(),
      })
    })
    .collect()
}

/// Whether the archive is a web archive or an executable JAR, as opposed to sources,
/// javadoc or a plain library.
fn is_interesting(path: &Path) -> Result<bool, ArtifactError> {
  let inspect_err = |message: String| ArtifactError::Inspect {
    path: path.to_path_buf(),
    message,
  };

  let file = File::open(path).map_err(|e| inspect_err(e.to_string()))?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| inspect_err(e.to_string()))?;

  if archive.file_names().any(|name| name == WEB_INF_DIR) {
    return Ok(true);
  }

  let mut manifest = match archive.by_name(MANIFEST_PATH) {
    Ok(entry) => entry,
    Err(zip::result::ZipError::FileNotFound) => return Ok(false),
    Err(e) => return Err(inspect_err(e.to_string())),
  };
  let mut content = String::new();
  manifest
    .read_to_string(&mut content)
    .map_err(|e| inspect_err(e.to_string()))?;

  Ok(manifest_attributes(&content).iter().any(|(key, _)| key == "Main-Class"))
}

/// Parse manifest main attributes. Lines starting with a space continue the previous
/// value.
fn manifest_attributes(content: &str) -> Vec<(String, String)> {
  let mut attributes: Vec<(String, String)> = Vec::new();
  for line in content.lines() {
    let line = line.trim_end_matches('\r');
    if let Some(continuation) = line.strip_prefix(' ') {
      if let Some((_, value)) = attributes.last_mut() {
        value.push_str(continuation);
      }
      continue;
    }
    if let Some((key, value)) = line.split_once(':') {
      attributes.push((key.trim().to_string(), value.trim().to_string()));
    }
  }
  attributes
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ConfigResolver;
  use crate::util::testutil::{write_executable_jar, write_plain_jar, write_war};
  use tempfile::TempDir;

  fn locator(env: &[(&str, &str)]) -> ArtifactLocator {
    ArtifactLocator::from_config(&MavenConfig::resolve(&ConfigResolver::from_pairs(env.iter().copied())))
  }

  #[test]
  fn pattern_precedence() {
    assert_eq!(locator(&[]).pattern, "target/*.[jw]ar");
    assert_eq!(
      locator(&[("BP_MAVEN_BUILT_MODULE", "api")]).pattern,
      "api/target/*.[jw]ar"
    );
    assert_eq!(
      locator(&[("BP_MAVEN_BUILT_MODULE", "api"), ("BP_MAVEN_BUILT_ARTIFACT", "out/*.jar")]).pattern,
      "out/*.jar"
    );
  }

  #[test]
  fn single_match_returned_without_inspection() {
    let temp = TempDir::new().unwrap();
    // Not even a valid archive: a lone match is never opened
    std::fs::create_dir_all(temp.path().join("target")).unwrap();
    std::fs::write(temp.path().join("target/app.jar"), "not a zip").unwrap();

    let artifact = locator(&[]).locate(temp.path()).unwrap();
    assert_eq!(artifact, temp.path().join("target/app.jar"));
  }

  #[test]
  fn zero_matches_report_empty_candidates() {
    let temp = TempDir::new().unwrap();

    let err = locator(&[]).locate(temp.path()).unwrap_err();
    match err {
      ArtifactError::NotFound { pattern, candidates } => {
        assert!(pattern.ends_with("target/*.[jw]ar"));
        assert!(candidates.is_empty());
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn ambiguous_candidates_listed_sorted() {
    let temp = TempDir::new().unwrap();
    write_plain_jar(&temp.path().join("target/b-sources.jar"));
    write_plain_jar(&temp.path().join("target/a-javadoc.jar"));

    let err = locator(&[]).locate(temp.path()).unwrap_err();
    match &err {
      ArtifactError::NotFound { candidates, .. } => assert_eq!(
        candidates,
        &vec![
          temp.path().join("target/a-javadoc.jar"),
          temp.path().join("target/b-sources.jar"),
        ]
      ),
      other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("unable to find built artifact (executable JAR or WAR)"));
  }

  #[test]
  fn executable_jar_disambiguates() {
    let temp = TempDir::new().unwrap();
    write_plain_jar(&temp.path().join("target/app-sources.jar"));
    write_executable_jar(&temp.path().join("target/app.jar"));

    let artifact = locator(&[]).locate(temp.path()).unwrap();
    assert_eq!(artifact, temp.path().join("target/app.jar"));
  }

  #[test]
  fn war_disambiguates() {
    let temp = TempDir::new().unwrap();
    write_plain_jar(&temp.path().join("target/app-classes.jar"));
    write_war(&temp.path().join("target/app.war"));

    let artifact = locator(&[]).locate(temp.path()).unwrap();
    assert_eq!(artifact, temp.path().join("target/app.war"));
  }

  #[test]
  fn two_interesting_archives_stay_ambiguous() {
    let temp = TempDir::new().unwrap();
    write_executable_jar(&temp.path().join("target/one.jar"));
    write_war(&temp.path().join("target/two.war"));

    let result = locator(&[]).locate(temp.path());
    assert!(matches!(result, Err(ArtifactError::NotFound { .. })));
  }

  #[test]
  fn corrupt_candidate_is_an_error() {
    let temp = TempDir::new().unwrap();
    write_plain_jar(&temp.path().join("target/a.jar"));
    std::fs::write(temp.path().join("target/b.jar"), "corrupt").unwrap();

    let result = locator(&[]).locate(temp.path());
    assert!(matches!(result, Err(ArtifactError::Inspect { .. })));
  }

  #[test]
  fn manifest_continuation_lines_join() {
    let attributes = manifest_attributes("Manifest-Version: 1.0\r\nMain-Class: com.example.Very\r\n LongName\r\n");
    assert_eq!(
      attributes,
      vec![
        ("Manifest-Version".to_string(), "1.0".to_string()),
        ("Main-Class".to_string(), "com.example.VeryLongName".to_string()),
      ]
    );
  }

  #[test]
  fn module_scopes_search() {
    let temp = TempDir::new().unwrap();
    write_executable_jar(&temp.path().join("api/target/api.jar"));
    write_executable_jar(&temp.path().join("target/root.jar"));

    let artifact = locator(&[("BP_MAVEN_BUILT_MODULE", "api")]).locate(temp.path()).unwrap();
    assert_eq!(artifact, temp.path().join("api/target/api.jar"));
  }
}

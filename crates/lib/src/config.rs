//! Environment-style configuration.
//!
//! Every option the build recognises is declared once in [`CONFIGURATIONS`] with a
//! description and an optional default. A [`ConfigResolver`] answers lookups against a
//! snapshot of the environment, and [`MavenConfig`] is the typed view the rest of the
//! crate consumes.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::consts::DEFAULT_TARGET;

/// Names of the recognised configuration keys.
pub mod keys {
  pub const BUILD_ARGUMENTS: &str = "BP_MAVEN_BUILD_ARGUMENTS";
  pub const ADDITIONAL_BUILD_ARGUMENTS: &str = "BP_MAVEN_ADDITIONAL_BUILD_ARGUMENTS";
  pub const ACTIVE_PROFILES: &str = "BP_MAVEN_ACTIVE_PROFILES";
  pub const POM_FILE: &str = "BP_MAVEN_POM_FILE";
  pub const BUILT_MODULE: &str = "BP_MAVEN_BUILT_MODULE";
  pub const BUILT_ARTIFACT: &str = "BP_MAVEN_BUILT_ARTIFACT";
  pub const DAEMON_ENABLED: &str = "BP_MAVEN_DAEMON_ENABLED";
  pub const VERSION: &str = "BP_MAVEN_VERSION";
  pub const SETTINGS_PATH: &str = "BP_MAVEN_SETTINGS_PATH";
  pub const SUPPORT_MULTIPLE_ARTIFACTS: &str = "BP_MAVEN_SUPPORT_MULTIPLE_ARTIFACTS";
  pub const BUILT_ARTIFACT_NATIVE_SOURCE: &str = "BP_MAVEN_BUILT_ARTIFACT_NATIVE_SOURCE";
  pub const INSTALL_NODE: &str = "BP_JAVA_INSTALL_NODE";
  pub const NODE_PROJECT_PATH: &str = "BP_NODE_PROJECT_PATH";
  pub const SERVICE_BINDING_ROOT: &str = "SERVICE_BINDING_ROOT";
  pub const PATH: &str = "PATH";
}

/// Declaration of one configuration option.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Configuration {
  pub name: &'static str,
  pub description: &'static str,
  pub default: Option<&'static str>,
}

/// All options the build recognises, in the order they are reported.
pub const CONFIGURATIONS: &[Configuration] = &[
  Configuration {
    name: keys::BUILD_ARGUMENTS,
    description: "the arguments to pass to Maven",
    default: Some("-Dmaven.test.skip=true package"),
  },
  Configuration {
    name: keys::ADDITIONAL_BUILD_ARGUMENTS,
    description: "the additional arguments appended to the Maven arguments",
    default: None,
  },
  Configuration {
    name: keys::ACTIVE_PROFILES,
    description: "the active profiles (comma separated) to pass to Maven",
    default: None,
  },
  Configuration {
    name: keys::POM_FILE,
    description: "the location of the main pom.xml file, relative to the application root",
    default: Some("pom.xml"),
  },
  Configuration {
    name: keys::BUILT_MODULE,
    description: "the module to find application artifact in",
    default: None,
  },
  Configuration {
    name: keys::BUILT_ARTIFACT,
    description: "the built application artifact explicitly, supersedes BP_MAVEN_BUILT_MODULE",
    default: Some(DEFAULT_TARGET),
  },
  Configuration {
    name: keys::DAEMON_ENABLED,
    description: "use the Maven daemon instead of Maven",
    default: Some("false"),
  },
  Configuration {
    name: keys::VERSION,
    description: "the Maven version to install",
    default: Some("3"),
  },
  Configuration {
    name: keys::SETTINGS_PATH,
    description: "the path to a Maven settings file, used when no binding provides one",
    default: None,
  },
  Configuration {
    name: keys::SUPPORT_MULTIPLE_ARTIFACTS,
    description: "package every built artifact into a single zip archive",
    default: Some("false"),
  },
  Configuration {
    name: keys::BUILT_ARTIFACT_NATIVE_SOURCE,
    description: "the folder the assembled archive is written to",
    default: Some("target"),
  },
  Configuration {
    name: keys::INSTALL_NODE,
    description: "install Node and Yarn for frontend builds driven from Maven",
    default: Some("false"),
  },
  Configuration {
    name: keys::NODE_PROJECT_PATH,
    description: "the subdirectory holding the frontend package.json or yarn.lock",
    default: None,
  },
];

/// Resolves configuration values from a snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
  env: BTreeMap<String, String>,
}

impl ConfigResolver {
  /// Snapshot the current process environment. Entries that are not valid UTF-8 are skipped.
  pub fn from_env() -> Self {
    Self {
      env: std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect(),
    }
  }

  /// Build a resolver from explicit key/value pairs.
  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      env: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  /// The value explicitly set for `name`, if any.
  pub fn lookup(&self, name: &str) -> Option<&str> {
    self.env.get(name).map(String::as_str)
  }

  /// The effective value for `name` and whether the user set it.
  ///
  /// Falls back to the declared default, or the empty string for undeclared keys.
  pub fn resolve(&self, name: &str) -> (String, bool) {
    if let Some(value) = self.lookup(name) {
      return (value.to_string(), true);
    }
    let default = CONFIGURATIONS
      .iter()
      .find(|c| c.name == name)
      .and_then(|c| c.default)
      .unwrap_or_default();
    (default.to_string(), false)
  }

  pub fn resolve_bool(&self, name: &str) -> bool {
    parse_bool(&self.resolve(name).0)
  }

  fn non_empty(&self, name: &str) -> Option<String> {
    self.lookup(name).map(str::trim).filter(|v| !v.is_empty()).map(String::from)
  }
}

fn parse_bool(value: &str) -> bool {
  matches!(
    value.trim().to_ascii_lowercase().as_str(),
    "true" | "t" | "1" | "yes" | "y"
  )
}

/// Typed view of the Maven build configuration.
///
/// Argument strings stay raw here; tokenizing them is the argument assembler's job so
/// that a malformed value only fails the build, never detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenConfig {
  /// `BP_MAVEN_BUILD_ARGUMENTS`, when user-set.
  pub build_arguments: Option<String>,
  pub additional_build_arguments: Option<String>,
  pub active_profiles: Vec<String>,
  /// `BP_MAVEN_POM_FILE`, when user-set. Drives the `--file` flag.
  pub pom_file: Option<String>,
  pub built_module: Option<String>,
  pub built_artifact: Option<String>,
  pub daemon_enabled: bool,
  /// Version constraint for the standard distribution.
  pub maven_version: String,
  pub settings_path: Option<PathBuf>,
  pub support_multiple_artifacts: bool,
  pub native_source: String,
  pub install_node: bool,
  pub node_project_path: Option<String>,
  pub service_binding_root: Option<PathBuf>,
  /// Search path used to discover a `mvn` binary.
  pub search_path: Option<OsString>,
}

impl MavenConfig {
  pub fn resolve(resolver: &ConfigResolver) -> Self {
    Self {
      build_arguments: resolver.lookup(keys::BUILD_ARGUMENTS).map(String::from),
      additional_build_arguments: resolver.non_empty(keys::ADDITIONAL_BUILD_ARGUMENTS),
      active_profiles: resolver
        .lookup(keys::ACTIVE_PROFILES)
        .map(split_profiles)
        .unwrap_or_default(),
      pom_file: resolver.non_empty(keys::POM_FILE),
      built_module: resolver.non_empty(keys::BUILT_MODULE),
      built_artifact: resolver.non_empty(keys::BUILT_ARTIFACT),
      daemon_enabled: resolver.resolve_bool(keys::DAEMON_ENABLED),
      maven_version: resolver.resolve(keys::VERSION).0,
      settings_path: resolver.non_empty(keys::SETTINGS_PATH).map(PathBuf::from),
      support_multiple_artifacts: resolver.resolve_bool(keys::SUPPORT_MULTIPLE_ARTIFACTS),
      native_source: resolver.resolve(keys::BUILT_ARTIFACT_NATIVE_SOURCE).0,
      install_node: resolver.resolve_bool(keys::INSTALL_NODE),
      node_project_path: resolver.non_empty(keys::NODE_PROJECT_PATH),
      service_binding_root: resolver.non_empty(keys::SERVICE_BINDING_ROOT).map(PathBuf::from),
      search_path: resolver.lookup(keys::PATH).map(OsString::from),
    }
  }

  /// The POM location relative to the application root, user-set or default.
  pub fn pom_location(&self) -> &str {
    self.pom_file.as_deref().unwrap_or("pom.xml")
  }
}

fn split_profiles(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(String::from)
    .collect()
}

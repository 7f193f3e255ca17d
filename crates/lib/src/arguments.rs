//! Maven command-line assembly.
//!
//! Arguments are built in a fixed order from the defaults, the `BP_MAVEN_*`
//! configuration and the settings binding. Any settings file that ends up on the
//! command line is hashed into the returned metadata so that editing it invalidates the
//! cached application layer.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::bindings::SettingsBinding;
use crate::config::{MavenConfig, keys};
use crate::consts::{ASSEMBLY_DESCRIPTOR, DEFAULT_ARGUMENTS, SETTINGS_SECURITY_SHA256_KEY, SETTINGS_SHA256_KEY};
use crate::util::hash::{HashError, hash_file};

#[derive(Debug, Error)]
pub enum ArgumentError {
  #[error("unable to tokenize {key}={value:?}: {message}")]
  Tokenize {
    key: &'static str,
    value: String,
    message: String,
  },

  #[error("unable to read settings file {path}: {source}")]
  ReadSettings {
    path: PathBuf,
    #[source]
    source: HashError,
  },

  #[error("unable to write assembly descriptor {path}: {source}")]
  WriteDescriptor {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// The Maven command line plus the metadata it contributes to the layer fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
  pub arguments: Vec<String>,
  pub metadata: Map<String, Value>,
}

/// Inputs to argument assembly.
#[derive(Debug, Clone)]
pub struct ArgumentAssembler<'a> {
  pub config: &'a MavenConfig,
  pub settings: &'a SettingsBinding,
  /// Whether a terminal is attached. Without one Maven runs in batch mode.
  pub interactive: bool,
}

impl<'a> ArgumentAssembler<'a> {
  pub fn new(config: &'a MavenConfig, settings: &'a SettingsBinding, interactive: bool) -> Self {
    Self {
      config,
      settings,
      interactive,
    }
  }

  pub fn assemble(&self) -> Result<Arguments, ArgumentError> {
    let mut metadata = Map::new();

    let mut args = match &self.config.build_arguments {
      Some(raw) => tokenize(keys::BUILD_ARGUMENTS, raw)?,
      None => DEFAULT_ARGUMENTS.iter().map(|s| s.to_string()).collect(),
    };

    if self.config.support_multiple_artifacts {
      args.extend([
        "assembly:single".to_string(),
        format!("-Ddescriptor={}", ASSEMBLY_DESCRIPTOR),
        format!("-Doutput.folder={}", self.config.native_source),
      ]);
    }

    if let Some(pom) = &self.config.pom_file {
      prepend(&mut args, ["--file".to_string(), pom.clone()]);
    }

    if !self.interactive && !args.iter().any(|a| a == "--batch-mode" || a == "-B") {
      prepend(&mut args, ["--batch-mode".to_string()]);
    }

    match self.settings {
      SettingsBinding::SettingsWithSecurity { settings, security } => {
        prepend(&mut args, [settings_flag(settings)]);
        record_digest(&mut metadata, SETTINGS_SHA256_KEY, settings)?;
        prepend(&mut args, [format!("-Dsettings.security={}", security.display())]);
        record_digest(&mut metadata, SETTINGS_SECURITY_SHA256_KEY, security)?;
      }
      SettingsBinding::SettingsOnly { settings } => {
        prepend(&mut args, [settings_flag(settings)]);
        record_digest(&mut metadata, SETTINGS_SHA256_KEY, settings)?;
      }
      SettingsBinding::NoBinding => {
        if let Some(settings) = &self.config.settings_path {
          prepend(&mut args, [settings_flag(settings)]);
          record_digest(&mut metadata, SETTINGS_SHA256_KEY, settings)?;
        }
      }
    }

    if let Some(raw) = &self.config.additional_build_arguments {
      args.extend(tokenize(keys::ADDITIONAL_BUILD_ARGUMENTS, raw)?);
    }

    if !self.config.active_profiles.is_empty() {
      args.push("-P".to_string());
      args.push(self.config.active_profiles.join(","));
    }

    info!(arguments = ?args, "assembled maven arguments");
    Ok(Arguments {
      arguments: args,
      metadata,
    })
  }
}

fn tokenize(key: &'static str, raw: &str) -> Result<Vec<String>, ArgumentError> {
  shell_words::split(raw).map_err(|e| ArgumentError::Tokenize {
    key,
    value: raw.to_string(),
    message: e.to_string(),
  })
}

fn prepend<const N: usize>(args: &mut Vec<String>, front: [String; N]) {
  let mut joined = Vec::from(front);
  joined.append(args);
  *args = joined;
}

fn settings_flag(path: &Path) -> String {
  format!("--settings={}", path.display())
}

fn record_digest(metadata: &mut Map<String, Value>, key: &str, path: &Path) -> Result<(), ArgumentError> {
  let digest = hash_file(path).map_err(|source| ArgumentError::ReadSettings {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(key, path = ?path, digest = %digest, "hashed settings file");
  metadata.insert(key.to_string(), Value::String(digest.0));
  Ok(())
}

const ASSEMBLY_DESCRIPTOR_CONTENT: &str = r#"<assembly xmlns="http://maven.apache.org/ASSEMBLY/2.1.0"
          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
          xsi:schemaLocation="http://maven.apache.org/ASSEMBLY/2.1.0 https://maven.apache.org/xsd/assembly-2.1.0.xsd">
  <id>distribution</id>
  <formats>
    <format>zip</format>
  </formats>
  <includeBaseDirectory>false</includeBaseDirectory>
  <fileSets>
    <fileSet>
      <directory>${output.folder}</directory>
      <outputDirectory>/</outputDirectory>
    </fileSet>
  </fileSets>
</assembly>
"#;

/// Write the assembly descriptor that packs every built artifact into one zip.
pub fn write_assembly_descriptor(app_path: &Path) -> Result<PathBuf, ArgumentError> {
  let path = app_path.join(ASSEMBLY_DESCRIPTOR);
  std::fs::write(&path, ASSEMBLY_DESCRIPTOR_CONTENT).map_err(|source| ArgumentError::WriteDescriptor {
    path: path.clone(),
    source,
  })?;
  debug!(path = ?path, "wrote assembly descriptor");
  Ok(path)
}

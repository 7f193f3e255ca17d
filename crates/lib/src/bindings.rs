//! Platform service bindings.
//!
//! A binding is a directory below the binding root holding a `type` file, an optional
//! `provider` file, and one file per secret. Only the Maven settings binding is
//! consumed here; the platform owns the files and they are only read and hashed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{SETTINGS_FILE, SETTINGS_SECURITY_FILE};

const TYPE_FILE: &str = "type";
const PROVIDER_FILE: &str = "provider";

#[derive(Debug, Error)]
pub enum BindingError {
  #[error("unable to read binding directory {path}: {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unable to read {path}: {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("binding {path} has no type file")]
  MissingType { path: PathBuf },

  #[error("multiple bindings of type {kind} found: {names:?}")]
  Ambiguous { kind: String, names: Vec<String> },
}

/// A single service binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
  pub name: String,
  pub path: PathBuf,
  pub kind: String,
  pub provider: Option<String>,
  /// Names of the secret files present in the binding directory.
  pub secrets: BTreeSet<String>,
}

impl Binding {
  /// Load a binding from its directory.
  pub fn from_path(path: &Path) -> Result<Self, BindingError> {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();

    let type_path = path.join(TYPE_FILE);
    if !type_path.is_file() {
      return Err(BindingError::MissingType { path: path.to_path_buf() });
    }
    let kind = read_trimmed(&type_path)?;

    let provider_path = path.join(PROVIDER_FILE);
    let provider = if provider_path.is_file() {
      Some(read_trimmed(&provider_path)?)
    } else {
      None
    };

    let mut secrets = BTreeSet::new();
    for entry in read_dir(path)? {
      let file_name = entry.file_name().to_string_lossy().to_string();
      if file_name.starts_with('.') || file_name == TYPE_FILE || file_name == PROVIDER_FILE {
        continue;
      }
      if entry.path().is_file() {
        secrets.insert(file_name);
      }
    }

    Ok(Self {
      name,
      path: path.to_path_buf(),
      kind,
      provider,
      secrets,
    })
  }

  /// Path of the secret file `key`, if the binding carries it.
  pub fn secret_file_path(&self, key: &str) -> Option<PathBuf> {
    self.secrets.contains(key).then(|| self.path.join(key))
  }
}

/// All bindings below a binding root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(pub Vec<Binding>);

impl Bindings {
  /// Load every binding below `root`. A missing root means no bindings.
  pub fn load(root: &Path) -> Result<Self, BindingError> {
    if !root.is_dir() {
      debug!(root = %root.display(), "binding root not present");
      return Ok(Self::default());
    }

    let mut entries: Vec<_> = read_dir(root)?
      .into_iter()
      .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
      .filter(|e| e.path().is_dir())
      .collect();
    entries.sort_by_key(|e| e.file_name());

    let bindings = entries
      .iter()
      .map(|e| Binding::from_path(&e.path()))
      .collect::<Result<Vec<_>, _>>()?;

    debug!(root = %root.display(), count = bindings.len(), "loaded bindings");
    Ok(Self(bindings))
  }

  /// The single binding of type `kind` (case-insensitive), if any.
  ///
  /// More than one binding of the same type is an error.
  pub fn resolve_one(&self, kind: &str) -> Result<Option<&Binding>, BindingError> {
    let matches: Vec<&Binding> = self.0.iter().filter(|b| b.kind.eq_ignore_ascii_case(kind)).collect();
    match matches.as_slice() {
      [] => Ok(None),
      [one] => Ok(Some(one)),
      many => Err(BindingError::Ambiguous {
        kind: kind.to_string(),
        names: many.iter().map(|b| b.name.clone()).collect(),
      }),
    }
  }
}

/// The Maven settings files a binding contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SettingsBinding {
  #[default]
  NoBinding,
  SettingsOnly {
    settings: PathBuf,
  },
  SettingsWithSecurity {
    settings: PathBuf,
    security: PathBuf,
  },
}

impl SettingsBinding {
  /// Classify a (possibly absent) Maven binding.
  ///
  /// A security file without `settings.xml` is ignored, as Maven only reads it
  /// alongside a settings file.
  pub fn from_binding(binding: Option<&Binding>) -> Self {
    let Some(binding) = binding else {
      return Self::NoBinding;
    };
    let Some(settings) = binding.secret_file_path(SETTINGS_FILE) else {
      return Self::NoBinding;
    };
    match binding.secret_file_path(SETTINGS_SECURITY_FILE) {
      Some(security) => Self::SettingsWithSecurity { settings, security },
      None => Self::SettingsOnly { settings },
    }
  }
}

fn read_dir(path: &Path) -> Result<Vec<fs::DirEntry>, BindingError> {
  let read_err = |source| BindingError::ReadDir {
    path: path.to_path_buf(),
    source,
  };
  fs::read_dir(path)
    .map_err(read_err)?
    .collect::<Result<Vec<_>, _>>()
    .map_err(read_err)
}

fn read_trimmed(path: &Path) -> Result<String, BindingError> {
  fs::read_to_string(path)
    .map(|s| s.trim().to_string())
    .map_err(|source| BindingError::ReadFile {
      path: path.to_path_buf(),
      source,
    })
}

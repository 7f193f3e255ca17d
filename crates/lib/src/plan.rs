//! Build plan types exchanged with the host platform.
//!
//! Detection offers alternative [`BuildPlan`]s; the platform later hands the build the
//! [`BuildPlanEntry`]s it was assigned, which decide which phases run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{PLAN_ENTRY_JVM_APPLICATION_PACKAGE, PLAN_ENTRY_MAVEN};

/// Arbitrary metadata attached to plan requirements and entries.
pub type PlanMetadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlanProvide {
  pub name: String,
}

impl BuildPlanProvide {
  pub fn new(name: &str) -> Self {
    Self { name: name.to_string() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlanRequire {
  pub name: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub metadata: PlanMetadata,
}

impl BuildPlanRequire {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      metadata: PlanMetadata::new(),
    }
  }

  /// A requirement needed at build time only.
  pub fn build(name: &str) -> Self {
    let mut metadata = PlanMetadata::new();
    metadata.insert("build".to_string(), serde_json::Value::Bool(true));
    Self {
      name: name.to_string(),
      metadata,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub provides: Vec<BuildPlanProvide>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub requires: Vec<BuildPlanRequire>,
}

/// Outcome of detection. A failed detection carries no plans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
  pub pass: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub plans: Vec<BuildPlan>,
}

/// A plan entry assigned to this build by the platform. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlanEntry {
  pub name: String,
  #[serde(default)]
  pub metadata: PlanMetadata,
}

impl BuildPlanEntry {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      metadata: PlanMetadata::new(),
    }
  }
}

/// The entries requested when the host supplies no plan: install Maven and build.
pub fn default_entries() -> Vec<BuildPlanEntry> {
  vec![
    BuildPlanEntry::new(PLAN_ENTRY_MAVEN),
    BuildPlanEntry::new(PLAN_ENTRY_JVM_APPLICATION_PACKAGE),
  ]
}

/// Looks up plan entries by name, merging duplicates.
#[derive(Debug, Clone, Copy)]
pub struct PlanEntryResolver<'a> {
  entries: &'a [BuildPlanEntry],
}

impl<'a> PlanEntryResolver<'a> {
  pub fn new(entries: &'a [BuildPlanEntry]) -> Self {
    Self { entries }
  }

  /// The merged entry named `name`, if any entry has that name.
  ///
  /// Metadata from later entries overrides earlier keys.
  pub fn resolve(&self, name: &str) -> Option<BuildPlanEntry> {
    let mut matching = self.entries.iter().filter(|e| e.name == name).peekable();
    matching.peek()?;

    let mut merged = BuildPlanEntry::new(name);
    for entry in matching {
      merged
        .metadata
        .extend(entry.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Some(merged)
  }
}

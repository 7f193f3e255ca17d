//! Implementation of the `mvnpack detect` command.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use tracing::debug;

use mvnpack_lib::config::{ConfigResolver, MavenConfig};
use mvnpack_lib::detect::detect;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

/// Exit code telling the host the application does not participate.
const DETECT_FAIL: u8 = 100;

pub fn cmd_detect(app: &Path, output: OutputFormat) -> Result<ExitCode> {
  let app = dunce::canonicalize(app).map_err(|e| anyhow!("Application not found: {}: {e}", app.display()))?;
  let config = MavenConfig::resolve(&ConfigResolver::from_env());

  let result = detect(&app, &config).map_err(|e| anyhow!("Failed to detect {}: {e}", app.display()))?;
  debug!(pass = result.pass, plans = result.plans.len(), "detection finished");

  if output.is_json() {
    print_json(&result)?;
  } else if result.pass {
    print_success(&format!("Maven project detected: {}", app.display()));
    for (idx, plan) in result.plans.iter().enumerate() {
      println!();
      println!("Plan {}:", idx + 1);
      let provides: Vec<_> = plan.provides.iter().map(|p| p.name.as_str()).collect();
      let requires: Vec<_> = plan.requires.iter().map(|r| r.name.as_str()).collect();
      print_stat("Provides", &provides.join(", "));
      print_stat("Requires", &requires.join(", "));
    }
  } else {
    print_info("Not a Maven project, or the application is already packaged");
  }

  Ok(if result.pass {
    ExitCode::SUCCESS
  } else {
    ExitCode::from(DETECT_FAIL)
  })
}

use anyhow::Result;

use mvnpack_lib::config::{CONFIGURATIONS, ConfigResolver};

use crate::output::{OutputFormat, print_json};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let resolver = ConfigResolver::from_env();

  if output.is_json() {
    let entries: Vec<_> = CONFIGURATIONS
      .iter()
      .map(|c| {
        let (value, user_set) = resolver.resolve(c.name);
        serde_json::json!({
          "name": c.name,
          "description": c.description,
          "default": c.default,
          "value": value,
          "user_set": user_set,
        })
      })
      .collect();
    return print_json(&entries);
  }

  println!("{} v{}", mvnpack_lib::consts::APP_NAME, env!("CARGO_PKG_VERSION"));
  println!();
  println!("Configuration:");
  for c in CONFIGURATIONS {
    let (value, user_set) = resolver.resolve(c.name);
    let shown = if value.is_empty() { "<unset>" } else { value.as_str() };
    let origin = if user_set { "" } else { " (default)" };
    println!("  {}: {}{}", c.name, shown, origin);
    println!("      {}", c.description);
  }
  Ok(())
}

//! YAML configuration file parsing, the teacher's `config::toml` pattern
//! adapted to `serde_yaml` per §6 ("a YAML file naming the same keys").

use super::Parameters;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse a YAML configuration file into `Parameters`.
pub fn parse_yaml_file(path: &Path) -> Result<Parameters> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    parse_yaml_string(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Parse YAML configuration from a string.
pub fn parse_yaml_string(contents: &str) -> Result<Parameters> {
    let params: Parameters =
        serde_yaml::from_str(contents).context("failed to parse YAML configuration")?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
top: /tmp/fsdrift
workload_table: /tmp/fsdrift/weights.csv
threads: 4
duration_secs: 30
max_files: 500
"#;
        let p = parse_yaml_string(yaml).unwrap();
        assert_eq!(p.threads, 4);
        assert_eq!(p.duration_secs, 30);
        assert_eq!(p.max_files, 500);
        // defaults fill in the rest
        assert_eq!(p.levels, 1);
        assert_eq!(p.fullness_limit_pct, 90);
    }

    #[test]
    fn rejects_missing_required_field() {
        let yaml = "threads: 4\n";
        assert!(parse_yaml_string(yaml).is_err());
    }
}

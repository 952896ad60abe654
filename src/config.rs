//! Configuration file support for spdx-bom.
//!
//! Provides YAML-based configuration through `spdx-bom.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use spdx_bom::application::dto::OutputFormat;
use spdx_bom::shared::Result;

pub const CONFIG_FILENAME: &str = "spdx-bom.config.yml";

/// Upper bound for concurrent inspections
pub const MAX_WORKERS: usize = 64;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub format: Option<String>,
    pub analyze_layers: Option<bool>,
    pub namespace: Option<String>,
    pub document_name: Option<String>,
    /// Extra SPDX creator, e.g. `Organization: Example Inc.`
    pub creator: Option<String>,
    pub workers: Option<usize>,
    pub provenance: Option<Vec<PathBuf>>,
    pub provider_options: Option<BTreeMap<String, String>>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(format) = config.format.as_deref() {
        if let Err(e) = OutputFormat::from_str(format) {
            bail!("Invalid config: {}", e);
        }
    }

    if let Some(workers) = config.workers {
        validate_workers(workers)
            .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    }

    if let Some(creator) = config.creator.as_deref() {
        validate_creator(creator)?;
    }

    if let Some(ref paths) = config.provenance {
        for (i, path) in paths.iter().enumerate() {
            if path.as_os_str().is_empty() {
                bail!(
                    "Invalid config: provenance[{}] must not be empty.\n\n\
                     💡 Hint: Each provenance entry must be the path of an in-toto statement file.",
                    i
                );
            }
        }
    }

    if let Some(ref options) = config.provider_options {
        for key in options.keys() {
            if key.trim().is_empty() {
                bail!("Invalid config: provider_options keys must not be empty.");
            }
        }
    }
    Ok(())
}

/// Checks a worker count is within 1..=MAX_WORKERS
pub fn validate_workers(workers: usize) -> std::result::Result<usize, String> {
    if (1..=MAX_WORKERS).contains(&workers) {
        Ok(workers)
    } else {
        Err(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, workers
        ))
    }
}

/// Checks an SPDX creator has the `Person:`, `Organization:` or `Tool:` form
pub fn validate_creator(creator: &str) -> Result<()> {
    let valid = ["Person:", "Organization:", "Tool:"]
        .iter()
        .any(|prefix| creator.strip_prefix(prefix).is_some_and(|rest| !rest.trim().is_empty()));
    if !valid {
        bail!(
            "Invalid creator '{}'.\n\n\
             💡 Hint: Use the SPDX form 'Person: name', 'Organization: name' or 'Tool: name'.",
            creator
        );
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let mut keys: Vec<&String> = config.unknown_fields.keys().collect();
    keys.sort();
    for key in keys {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
format: tag-value
analyze_layers: true
namespace: https://example.com/spdx/release-1
document_name: release-1
creator: "Organization: Example Inc."
workers: 8
provenance:
  - attestations/build.intoto.json
provider_options:
  platform: linux/arm64
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.format.as_deref(), Some("tag-value"));
        assert_eq!(config.analyze_layers, Some(true));
        assert_eq!(config.namespace.as_deref(), Some("https://example.com/spdx/release-1"));
        assert_eq!(config.document_name.as_deref(), Some("release-1"));
        assert_eq!(config.creator.as_deref(), Some("Organization: Example Inc."));
        assert_eq!(config.workers, Some(8));
        assert_eq!(
            config.provenance.unwrap(),
            vec![PathBuf::from("attestations/build.intoto.json")]
        );
        assert_eq!(
            config.provider_options.unwrap().get("platform").map(String::as_str),
            Some("linux/arm64")
        );
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "format: json\nworkers: 2\n").unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yml");
        fs::write(&config_path, "invalid: yaml: [[[broken").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "format: cyclonedx\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Invalid format: cyclonedx"));
    }

    #[test]
    fn test_workers_out_of_range_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");

        for workers in ["0", "65"] {
            fs::write(&config_path, format!("workers: {}\n", workers)).unwrap();
            let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
            assert!(err.contains("workers must be between 1 and 64"));
        }
    }

    #[test]
    fn test_invalid_creator_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "creator: Example Inc.\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Invalid creator"));
    }

    #[test]
    fn test_empty_provenance_entry_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "provenance:\n  - \"\"\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("provenance[0] must not be empty"));
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
format: json
check_cve: true
exclude_packages: [pip]
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("check_cve"));
        assert!(config.unknown_fields.contains_key("exclude_packages"));
    }

    #[test]
    fn test_validate_workers() {
        assert_eq!(validate_workers(1), Ok(1));
        assert_eq!(validate_workers(64), Ok(64));
        assert!(validate_workers(0).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert!(config.format.is_none());
        assert!(config.workers.is_none());
        assert!(config.provenance.is_none());
        assert!(config.unknown_fields.is_empty());
    }
}

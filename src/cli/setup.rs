use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");
const EXAMPLE_RECORDS: &str = include_str!("../../docs/example_transactions.yaml");

/// File name the example config points its `records` entry at.
const EXAMPLE_RECORDS_FILE: &str = "transactions.yaml";

/// Creates the example config and records at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates the example config at `path`, plus an example records file next
/// to it unless one is already there
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    let parent = path.parent().unwrap_or(Path::new(""));
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;
    tracing::info!("Created default configuration at {}", path.display());

    let records_path = parent.join(EXAMPLE_RECORDS_FILE);
    if records_path.exists() {
        tracing::info!("Keeping existing records at {}", records_path.display());
    } else {
        std::fs::write(&records_path, EXAMPLE_RECORDS).with_context(|| {
            format!("Failed to write records file to {}", records_path.display())
        })?;
        tracing::info!("Created example records at {}", records_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::report::{ReportRequest, build_report};
    use crate::core::{AmountPolicy, Granularity};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_setup_creates_config_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        setup_at_path(&config_path)?;

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path)?;
        assert!(content.contains("# Example configuration file for tallybook"));
        assert!(content.contains("granularity:"));
        assert!(content.contains("currency:"));
        assert!(config_path.with_file_name("transactions.yaml").exists());

        Ok(())
    }

    #[test]
    fn test_setup_output_builds_a_report() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        setup_at_path(&config_path)?;

        let config = AppConfig::load_from_path(&config_path)?;
        let output = build_report(&config, &ReportRequest::default())?;
        assert!(output.rejected.is_empty());
        assert_eq!(output.report.transaction_count(), 4);
        assert_eq!(
            output
                .report
                .buckets
                .iter()
                .map(|b| b.period_key.as_str())
                .collect::<Vec<_>>(),
            vec!["2024-01", "2024-02"]
        );
        Ok(())
    }

    #[test]
    fn test_setup_keeps_existing_records() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let records_path = temp_dir.path().join("transactions.yaml");
        fs::write(&records_path, "[]")?;

        setup_at_path(temp_dir.path().join("config.yaml"))?;
        assert_eq!(fs::read_to_string(&records_path)?, "[]");
        Ok(())
    }

    #[test]
    fn test_setup_fails_if_config_exists() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");

        std::fs::write(&config_path, "test")?;

        let result = setup_at_path(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&config_path)?, "test");

        Ok(())
    }

    #[test]
    fn test_example_config_is_valid_yaml() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG)
            .context("Failed to parse example config as YAML")?;

        assert_eq!(config.currency.code, "USD");
        assert_eq!(config.granularity, Granularity::Monthly);
        assert_eq!(config.amount_policy, AmountPolicy::Lenient);
        assert!(config.records.is_some());
        assert!(config.budget.is_some());

        Ok(())
    }
}

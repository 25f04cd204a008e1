use crate::core::aggregate::AggregateOptions;
use crate::core::budget::Budget;
use crate::core::currency::CurrencyTag;
use crate::core::period::{Granularity, WeekScheme};
use crate::core::record::AmountPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Reporting currency when records carry none.
    #[serde(default)]
    pub currency: CurrencyTag,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub week_scheme: WeekScheme,
    #[serde(default)]
    pub amount_policy: AmountPolicy,
    /// Path to the transaction records file. A relative path read from a
    /// config file is taken relative to that file's directory.
    pub records: Option<String>,
    pub budget: Option<Budget>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "tallybook", "tallybook")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        if let (Some(records), Some(dir)) = (config.records.as_deref(), path.as_ref().parent()) {
            if Path::new(records).is_relative() && !dir.as_os_str().is_empty() {
                let resolved = dir.join(records).to_string_lossy().into_owned();
                debug!("Resolved records path {records} to {resolved}");
                config.records = Some(resolved);
            }
        }
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            granularity: self.granularity,
            week_scheme: self.week_scheme,
            default_currency: self.currency.clone(),
        }
    }
}

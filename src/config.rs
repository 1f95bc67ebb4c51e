use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fmt::Debug, fs, ops::RangeBounds, path::Path};

use crate::analytics::MAX_PERIODS;

/// Service configuration.
///
/// Defaults are overlaid by an optional YAML file (path in
/// `CSVSTATS_CONFIG`) and then by environment variables. See
/// [`Config::load`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the HTTP server binds on all interfaces.
    pub port: u16,
    /// Default `tracing` filter directive.
    pub log_level: String,

    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: u64,

    /// Age after which cached datasets are evicted. `None` keeps them forever.
    pub dataset_ttl_secs: Option<u64>,
    /// Seconds between eviction sweeps.
    pub eviction_interval_secs: u64,

    /// Moving-average window when the request names none.
    pub default_window: usize,
    /// Forecast length when the request names none.
    pub default_forecast_periods: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            log_level: "info".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            dataset_ttl_secs: None,
            eviction_interval_secs: 60,
            default_window: 3,
            default_forecast_periods: 3,
        }
    }
}

impl Config {
    /// Build the effective configuration from file and environment.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or deserialized,
    /// an environment override does not parse, or a value is out of range.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var("CSVSTATS_CONFIG") {
            Ok(path) => Self::from_file(&path).with_context(|| format!("failed to load {path}"))?,
            Err(_) => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        cfg.validate().context("failed to validate config")?;
        Ok(cfg)
    }

    /// Load a [`Config`] from a YAML file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to deserialize config")
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().with_context(|| format!("invalid PORT {port:?}"))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(bytes) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = bytes
                .parse()
                .with_context(|| format!("invalid MAX_UPLOAD_BYTES {bytes:?}"))?;
        }
        if let Some(ttl) = lookup("DATASET_TTL_SECS") {
            self.dataset_ttl_secs = Some(
                ttl.parse()
                    .with_context(|| format!("invalid DATASET_TTL_SECS {ttl:?}"))?,
            );
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.max_upload_bytes, 1..=1 << 32).context("invalid max upload size")?;
        if let Some(ttl) = self.dataset_ttl_secs {
            check_num(ttl, 1..).context("invalid dataset ttl")?;
        }
        check_num(self.eviction_interval_secs, 1..=86_400)
            .context("invalid eviction interval")?;
        check_num(self.default_window, 1..10_000).context("invalid default window")?;
        check_num(self.default_forecast_periods, 0..=MAX_PERIODS)
            .context("invalid default forecast length")?;
        Ok(())
    }

    pub fn dataset_ttl(&self) -> Option<chrono::Duration> {
        self.dataset_ttl_secs
            .and_then(|secs| chrono::Duration::try_seconds(secs as i64))
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

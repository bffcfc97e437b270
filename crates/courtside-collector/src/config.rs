//! Collector configuration.
//!
//! Built-in defaults, overlaid by an optional TOML file, overlaid by
//! `COURTSIDE_*` environment variables with `__` between nested keys, e.g.
//! `COURTSIDE_DATABASE__POOL_SIZE=4` or `COURTSIDE_PROVIDER__API_KEY=...`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, Source};
use courtside_core::{metrics::MetricConfig, season::SeasonId};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  pace::DelayRange,
  retry::RetryPolicy,
  schedule::BatchSchedule,
  source::EndpointConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub path:      PathBuf,
  pub pool_size: usize,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self { path: PathBuf::from("courtside.db"), pool_size: 4 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  pub api: RetryPolicy,
  pub web: RetryPolicy,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self { api: RetryPolicy::provider_api(), web: RetryPolicy::web_page() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
  pub database:             DatabaseConfig,
  pub provider:             EndpointConfig,
  pub web:                  EndpointConfig,
  pub retry:                RetryConfig,
  pub pacing:               BatchSchedule,
  /// Season collected when none is given on the command line.
  pub season:               SeasonId,
  /// Also fetch per-player biographical detail during the players stage.
  pub fetch_player_details: bool,
  pub metrics:              MetricConfig,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    Self {
      database:             DatabaseConfig::default(),
      provider:             EndpointConfig::provider(),
      web:                  EndpointConfig::web(),
      retry:                RetryConfig::default(),
      pacing:               BatchSchedule::default(),
      season:               SeasonId::starting(2024),
      fetch_player_details: true,
      metrics:              MetricConfig::default(),
    }
  }
}

impl CollectorConfig {
  /// Load from `path` (if it exists) and the environment, then validate.
  pub fn load(path: &Path) -> Result<Self> {
    Self::from_file(File::from(path).required(false))
  }

  fn from_file(file: impl Source + Send + Sync + 'static) -> Result<Self> {
    let cfg: Self = Config::builder()
      .add_source(Config::try_from(&Self::default())?)
      .add_source(file)
      .add_source(
        Environment::with_prefix("COURTSIDE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject settings that would make a run fail or misbehave later.
  pub fn validate(&self) -> Result<()> {
    let invalid = |msg: String| Err(Error::Config(msg));

    if self.database.pool_size == 0 {
      return invalid("database.pool_size must be at least 1".into());
    }
    for (name, endpoint) in [("provider", &self.provider), ("web", &self.web)] {
      if endpoint.base_url.trim().is_empty() {
        return invalid(format!("{name}.base_url is empty"));
      }
      if let Err(e) = endpoint.base() {
        return invalid(format!("{name}.base_url: {e}"));
      }
      let has_key = endpoint.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
      if endpoint.api_key_required && !has_key {
        return invalid(format!("{name}.api_key is required but not set"));
      }
    }
    if self.pacing.batch_size == 0 {
      return invalid("pacing.batch_size must be at least 1".into());
    }

    let ranges: [(&str, DelayRange); 4] = [
      ("pacing.item_delay", self.pacing.item_delay),
      ("pacing.batch_delay", self.pacing.batch_delay),
      ("retry.api.jitter", self.retry.api.jitter),
      ("retry.web.jitter", self.retry.web.jitter),
    ];
    if let Some((name, _)) = ranges.iter().find(|(_, r)| !r.is_valid()) {
      return invalid(format!("{name}: min_ms exceeds max_ms"));
    }
    for (name, policy) in [("retry.api", &self.retry.api), ("retry.web", &self.retry.web)] {
      if policy.max_attempts == 0 {
        return invalid(format!("{name}.max_attempts must be at least 1"));
      }
    }
    Ok(())
  }
}

//! Error types for `courtside-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid season label: {0:?}")]
  InvalidSeason(String),

  #[error("percentage {0} is outside [0, 1]")]
  PercentageOutOfRange(f64),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

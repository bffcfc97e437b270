//! Error types for the courtside-normalize layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing field {field} in {record}")]
  MissingField { field: &'static str, record: String },

  #[error("invalid {field} value {value} in {record}")]
  InvalidValue {
    field:  &'static str,
    value:  String,
    record: String,
  },

  #[error("unparseable date {value:?} in {record}")]
  InvalidDate { value: String, record: String },

  #[error("malformed row {index}: {reason}")]
  MalformedRow { index: usize, reason: String },

  #[error("unexpected response shape: {0}")]
  UnexpectedShape(String),

  #[error("core error: {0}")]
  Core(#[from] courtside_core::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

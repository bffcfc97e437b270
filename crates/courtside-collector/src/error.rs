//! Error types for `courtside-collector`.

use thiserror::Error;

/// A failed upstream request.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("could not connect to {url}: {message}")]
  Connect { url: String, message: String },

  #[error("request to {url} timed out")]
  Timeout { url: String },

  #[error("{url} answered HTTP {status}")]
  Status { url: String, status: u16 },

  /// The connection dropped or the body could not be read.
  #[error("transport error from {url}: {message}")]
  Transport { url: String, message: String },

  #[error("invalid request URL: {0}")]
  InvalidUrl(String),

  #[error("undecodable body from {url}: {message}")]
  Decode { url: String, message: String },

  #[error("unexpected response shape: {0}")]
  Shape(#[from] courtside_normalize::Error),
}

impl FetchError {
  /// Whether retrying the same request might succeed: connection failures,
  /// timeouts, rate limiting, and server errors.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Connect { .. } | Self::Timeout { .. } | Self::Transport { .. } => {
        true
      }
      Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
      Self::InvalidUrl(_) | Self::Decode { .. } | Self::Shape(_) => false,
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  /// A transaction-level store failure. Row-level failures never get here;
  /// the store counts them instead.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("failed to load configuration: {0}")]
  ConfigLoad(#[from] config::ConfigError),

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Whether the error must end the run rather than just the current item.
  pub fn is_fatal(&self) -> bool { !matches!(self, Self::Fetch(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  fn status(status: u16) -> FetchError {
    FetchError::Status { url: "https://example.test/".into(), status }
  }

  #[test]
  fn rate_limits_and_server_errors_are_transient() {
    assert!(status(429).is_transient());
    assert!(status(500).is_transient());
    assert!(status(503).is_transient());
    assert!(!status(400).is_transient());
    assert!(!status(404).is_transient());
    assert!(FetchError::Timeout { url: "u".into() }.is_transient());
  }

  #[test]
  fn bad_bodies_are_not_transient() {
    let e = FetchError::Decode { url: "u".into(), message: "eof".into() };
    assert!(!e.is_transient());
    assert!(!FetchError::InvalidUrl("::".into()).is_transient());
  }

  #[test]
  fn only_fetch_failures_are_item_local() {
    assert!(!Error::from(status(500)).is_fatal());
    assert!(Error::Config("empty".into()).is_fatal());
  }
}

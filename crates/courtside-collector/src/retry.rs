//! Retry with exponential backoff and jitter.
//!
//! The delay before attempt `n` (for `n >= 2`) is
//! `base_delay * 2^(n-1)` plus a jitter drawn from the policy's range. Only
//! transient errors are retried; the error from the last attempt is returned
//! unchanged. A successful empty result is a result, not a failure.

use std::{fmt::Display, future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  error::{Error, FetchError},
  pace::{DelayRange, Jitter, Pacer, Sleeper},
};

/// Errors that can tell whether a retry might help.
pub trait Transient {
  fn is_transient(&self) -> bool;
}

impl Transient for FetchError {
  fn is_transient(&self) -> bool { FetchError::is_transient(self) }
}

impl Transient for Error {
  fn is_transient(&self) -> bool {
    match self {
      Error::Fetch(e) => e.is_transient(),
      _ => false,
    }
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts, including the first.
  pub max_attempts:  u32,
  pub base_delay_ms: u64,
  pub jitter:        DelayRange,
}

impl RetryPolicy {
  /// Statistics API calls.
  pub const fn provider_api() -> Self {
    Self {
      max_attempts:  5,
      base_delay_ms: 1_000,
      jitter:        DelayRange::new(0, 1_000),
    }
  }

  /// Page fetches from the secondary web source, which blocks aggressive
  /// clients.
  pub const fn web_page() -> Self {
    Self {
      max_attempts:  5,
      base_delay_ms: 2_000,
      jitter:        DelayRange::new(1_000, 3_000),
    }
  }

  /// Backoff before `attempt`, without jitter.
  pub fn backoff(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << exponent))
  }
}

impl Default for RetryPolicy {
  fn default() -> Self { Self::provider_api() }
}

// ─── Executor ────────────────────────────────────────────────────────────────

pub struct RetryExecutor<'a, S, J> {
  policy: &'a RetryPolicy,
  pacer:  &'a Pacer<S, J>,
}

impl<'a, S: Sleeper, J: Jitter> RetryExecutor<'a, S, J> {
  pub fn new(policy: &'a RetryPolicy, pacer: &'a Pacer<S, J>) -> Self {
    Self { policy, pacer }
  }

  /// Run `op` until it succeeds, fails with a non-transient error, or the
  /// policy's attempts are used up.
  pub async fn execute<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
  {
    let max_attempts = self.policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_transient() && attempt < max_attempts => {
          attempt += 1;
          let delay =
            self.policy.backoff(attempt) + self.pacer.jitter(self.policy.jitter);
          debug!(
            label,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "retrying"
          );
          self.pacer.sleep(delay).await;
        }
        Err(e) => {
          if e.is_transient() {
            warn!(label, attempts = attempt, error = %e, "giving up");
          }
          return Err(e);
        }
      }
    }
  }
}

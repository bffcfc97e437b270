//! Sleep-based pacing.
//!
//! Every delay in a run goes through a [`Pacer`], which draws a duration from
//! a [`DelayRange`] with a [`Jitter`] source and waits on a [`Sleeper`]. Both
//! are traits so tests can record delays without waiting for them.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ─── DelayRange ──────────────────────────────────────────────────────────────

/// An inclusive range of milliseconds to draw a delay from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
  pub min_ms: u64,
  pub max_ms: u64,
}

impl DelayRange {
  pub const ZERO: Self = Self::new(0, 0);

  pub const fn new(min_ms: u64, max_ms: u64) -> Self { Self { min_ms, max_ms } }

  pub fn is_valid(&self) -> bool { self.min_ms <= self.max_ms }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

pub trait Sleeper: Send + Sync {
  fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) { tokio::time::sleep(duration).await }
}

pub trait Jitter: Send + Sync {
  /// A duration within `range`.
  fn draw(&self, range: DelayRange) -> Duration;
}

/// Uniform draw from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformJitter;

impl Jitter for UniformJitter {
  fn draw(&self, range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
      return Duration::from_millis(range.min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(range.min_ms..=range.max_ms))
  }
}

// ─── Pacer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Pacer<S = TokioSleeper, J = UniformJitter> {
  sleeper: S,
  jitter:  J,
}

impl<S: Sleeper, J: Jitter> Pacer<S, J> {
  pub fn new(sleeper: S, jitter: J) -> Self { Self { sleeper, jitter } }

  pub fn jitter(&self, range: DelayRange) -> Duration { self.jitter.draw(range) }

  /// Sleep for a duration drawn from `range`, and return it.
  pub async fn pause(&self, range: DelayRange) -> Duration {
    let delay = self.jitter.draw(range);
    self.sleep(delay).await;
    delay
  }

  pub async fn sleep(&self, delay: Duration) {
    if delay.is_zero() {
      return;
    }
    debug!(delay_ms = delay.as_millis() as u64, "pausing");
    self.sleeper.sleep(delay).await;
  }
}

// ─── StopSignal ──────────────────────────────────────────────────────────────

/// Shared flag asking a run to stop launching new batches.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
  pub fn new() -> Self { Self::default() }

  pub fn stop(&self) { self.0.store(true, Ordering::SeqCst) }

  pub fn is_stopped(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

// ─── Test doubles ────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn uniform_draws_stay_in_range() {
    let range = DelayRange::new(200, 400);
    for _ in 0..100 {
      let d = UniformJitter.draw(range);
      assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(400));
    }
    assert_eq!(UniformJitter.draw(DelayRange::new(50, 50)), Duration::from_millis(50));
  }

  #[test]
  fn inverted_range_is_invalid() {
    assert!(DelayRange::new(1, 1).is_valid());
    assert!(!DelayRange::new(5, 1).is_valid());
  }

  #[tokio::test]
  async fn zero_delays_are_not_slept() {
    let (pacer, sleeper) = fake::recording_pacer();
    pacer.pause(DelayRange::ZERO).await;
    pacer.pause(DelayRange::new(30, 90)).await;
    assert_eq!(sleeper.slept(), [Duration::from_millis(30)]);
  }

  #[test]
  fn stop_signal_is_shared_between_clones() {
    let signal = StopSignal::new();
    let handle = signal.clone();
    assert!(!signal.is_stopped());
    handle.stop();
    assert!(signal.is_stopped());
  }
}

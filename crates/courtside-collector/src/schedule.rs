//! Batched, paced processing of a work list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  Error,
  pace::{DelayRange, Jitter, Pacer, Sleeper, StopSignal},
};

/// How a work list is split up and paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSchedule {
  pub batch_size:  usize,
  /// Between two items of the same batch.
  pub item_delay:  DelayRange,
  /// Between two batches.
  pub batch_delay: DelayRange,
}

impl Default for BatchSchedule {
  fn default() -> Self {
    Self {
      batch_size:  25,
      item_delay:  DelayRange::new(600, 1_200),
      batch_delay: DelayRange::new(5_000, 10_000),
    }
  }
}

/// An item failure, which is either counted or ends the run.
pub trait ItemFailure: std::fmt::Display {
  fn is_fatal(&self) -> bool;
}

impl ItemFailure for Error {
  fn is_fatal(&self) -> bool { Error::is_fatal(self) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRun {
  pub batch_sizes: Vec<usize>,
  pub succeeded:   usize,
  pub failed:      usize,
  /// The stop signal was raised before every batch had started.
  pub stopped:     bool,
}

impl BatchRun {
  pub fn attempted(&self) -> usize { self.succeeded + self.failed }
}

/// Feed `items` to `worker` in consecutive batches of `schedule.batch_size`.
///
/// Items within a batch are separated by `item_delay`; batches by
/// `batch_delay`, never after the last one. A non-fatal worker error is
/// logged and counted and the next item proceeds. A fatal one ends the run
/// and is returned. `stop` is checked before each batch.
pub async fn run_batches<T, E, S, J>(
  label: &str,
  items: Vec<T>,
  schedule: &BatchSchedule,
  pacer: &Pacer<S, J>,
  stop: &StopSignal,
  mut worker: impl AsyncFnMut(T) -> Result<(), E>,
) -> Result<BatchRun, E>
where
  E: ItemFailure,
  S: Sleeper,
  J: Jitter,
{
  let batch_size = schedule.batch_size.max(1);
  let total = items.len();
  let batches = total.div_ceil(batch_size);
  let mut run = BatchRun::default();
  let mut items = items.into_iter();

  for index in 0..batches {
    if stop.is_stopped() {
      info!(label, completed = index, batches, "stop requested");
      run.stopped = true;
      break;
    }
    if index > 0 {
      pacer.pause(schedule.batch_delay).await;
    }

    let batch: Vec<T> = items.by_ref().take(batch_size).collect();
    debug!(label, batch = index + 1, batches, size = batch.len(), "starting batch");
    run.batch_sizes.push(batch.len());

    for (position, item) in batch.into_iter().enumerate() {
      if position > 0 {
        pacer.pause(schedule.item_delay).await;
      }
      match worker(item).await {
        Ok(()) => run.succeeded += 1,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
          warn!(label, error = %e, "item failed");
          run.failed += 1;
        }
      }
    }
  }

  Ok(run)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::pace::fake::recording_pacer;

  #[derive(Debug)]
  struct Failure {
    fatal: bool,
  }

  impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str(if self.fatal { "fatal" } else { "item" })
    }
  }

  impl ItemFailure for Failure {
    fn is_fatal(&self) -> bool { self.fatal }
  }

  fn schedule(batch_size: usize) -> BatchSchedule {
    BatchSchedule {
      batch_size,
      item_delay: DelayRange::new(1, 1),
      batch_delay: DelayRange::new(100, 100),
    }
  }

  #[tokio::test]
  async fn twelve_items_in_fives() {
    let (pacer, sleeper) = recording_pacer();
    let mut seen = Vec::new();
    let run = run_batches(
      "numbers",
      (0..12).collect(),
      &schedule(5),
      &pacer,
      &StopSignal::new(),
      async |n: i32| {
        seen.push(n);
        Ok::<_, Failure>(())
      },
    )
    .await
    .unwrap();

    assert_eq!(run.batch_sizes, [5, 5, 2]);
    assert_eq!(run.succeeded, 12);
    assert_eq!(seen, (0..12).collect::<Vec<_>>());

    let slept = sleeper.slept();
    let batch_pauses = slept.iter().filter(|d| **d == Duration::from_millis(100));
    assert_eq!(batch_pauses.count(), 2);
    // 4 + 4 + 1 gaps inside the batches.
    assert_eq!(slept.len(), 11);
    assert_ne!(slept.last(), Some(&Duration::from_millis(100)));
  }

  #[tokio::test]
  async fn item_failures_are_counted_and_skipped() {
    let (pacer, _) = recording_pacer();
    let run = run_batches(
      "odd ones fail",
      (0..6).collect(),
      &schedule(4),
      &pacer,
      &StopSignal::new(),
      async |n: i32| {
        if n % 2 == 1 { Err(Failure { fatal: false }) } else { Ok(()) }
      },
    )
    .await
    .unwrap();
    assert_eq!((run.succeeded, run.failed), (3, 3));
    assert_eq!(run.attempted(), 6);
  }

  #[tokio::test]
  async fn fatal_failure_ends_the_run() {
    let (pacer, _) = recording_pacer();
    let mut calls = 0;
    let result = run_batches(
      "store lost",
      (0..6).collect(),
      &schedule(2),
      &pacer,
      &StopSignal::new(),
      async |n: i32| {
        calls += 1;
        if n == 2 { Err(Failure { fatal: true }) } else { Ok(()) }
      },
    )
    .await;
    assert!(matches!(result, Err(Failure { fatal: true })));
    assert_eq!(calls, 3);
  }

  #[tokio::test]
  async fn stop_signal_is_honoured_between_batches() {
    let (pacer, _) = recording_pacer();
    let stop = StopSignal::new();
    let handle = stop.clone();
    let run = run_batches(
      "interrupted",
      (0..10).collect(),
      &schedule(3),
      &pacer,
      &stop,
      async |n: i32| {
        // The batch in flight still finishes.
        if n == 1 {
          handle.stop();
        }
        Ok::<_, Failure>(())
      },
    )
    .await
    .unwrap();
    assert!(run.stopped);
    assert_eq!(run.batch_sizes, [3]);
    assert_eq!(run.succeeded, 3);
  }

  #[tokio::test]
  async fn empty_work_list_does_nothing() {
    let (pacer, sleeper) = recording_pacer();
    let run = run_batches(
      "nothing",
      Vec::<i32>::new(),
      &schedule(5),
      &pacer,
      &StopSignal::new(),
      async |_| Ok::<_, Failure>(()),
    )
    .await
    .unwrap();
    assert_eq!(run, BatchRun::default());
    assert!(sleeper.slept().is_empty());
  }
}

//! Per-stage counts.

use std::fmt;

use courtside_core::{stage::Stage, store::BatchOutcome};
use tracing::info;

use crate::schedule::BatchRun;

/// What one stage attempted and how it went.
///
/// Every record ends up in exactly one bucket: stored, failed to store,
/// unparseable, rejected by the resolver, or skipped by the calculator.
/// `requests_failed` counts upstream requests that failed after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
  pub stage:           Stage,
  pub requests_failed: usize,
  /// Raw records received, or metric inputs read.
  pub fetched:         usize,
  pub unparseable:     usize,
  pub rejected:        usize,
  pub skipped:         usize,
  pub stored:          BatchOutcome,
  /// The stop signal cut the stage short.
  pub stopped:         bool,
}

impl StageReport {
  pub fn new(stage: Stage) -> Self {
    Self {
      stage,
      requests_failed: 0,
      fetched: 0,
      unparseable: 0,
      rejected: 0,
      skipped: 0,
      stored: BatchOutcome::default(),
      stopped: false,
    }
  }

  pub fn succeeded(&self) -> usize { self.stored.succeeded }

  pub fn failed(&self) -> usize {
    self.requests_failed + self.unparseable + self.rejected + self.stored.failed
  }

  pub fn attempted(&self) -> usize { self.succeeded() + self.failed() + self.skipped }

  /// Fold in the failures and stop state of a batched pass. Successful
  /// items have already written into `stored`.
  pub(crate) fn absorb(&mut self, run: &BatchRun) {
    self.requests_failed += run.failed;
    self.stopped |= run.stopped;
  }

  pub fn log(&self) {
    info!(
      stage = %self.stage,
      attempted = self.attempted(),
      succeeded = self.succeeded(),
      failed = self.failed(),
      unparseable = self.unparseable,
      rejected = self.rejected,
      skipped = self.skipped,
      requests_failed = self.requests_failed,
      stopped = self.stopped,
      "{}",
      self
    );
  }
}

impl fmt::Display for StageReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}: {} succeeded, {} failed",
      self.stage,
      self.succeeded(),
      self.failed()
    )?;
    if self.skipped > 0 {
      write!(f, ", {} skipped", self.skipped)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub stages:  Vec<StageReport>,
  pub stopped: bool,
}

impl RunSummary {
  pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
    self.stages.iter().find(|r| r.stage == stage)
  }

  pub fn failed(&self) -> usize { self.stages.iter().map(StageReport::failed).sum() }
}

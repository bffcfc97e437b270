//! The `StatsStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `courtside-store-sqlite`).
//! The collector depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  entity::{
    Contract, Game, GameStatLine, Player, PlayerId, SalaryCap, SeasonStatLine,
    Team, TeamId, ValueAnalysis,
  },
  metrics::ValueInput,
  resolve::ReferenceSet,
  season::SeasonId,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Row counts for one transactional batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
  pub succeeded: usize,
  pub failed:    usize,
}

impl BatchOutcome {
  pub fn attempted(&self) -> usize { self.succeeded + self.failed }

  pub fn merge(&mut self, other: BatchOutcome) {
    self.succeeded += other.succeeded;
    self.failed += other.failed;
  }
}

/// Row count for one table, as reported by [`StatsStore::table_counts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
  pub table: &'static str,
  pub rows:  u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store.
///
/// Every `upsert_*` method writes its whole slice in one transaction. A row
/// that fails on its own (constraint or type violation) is skipped and
/// counted in [`BatchOutcome::failed`]; the rest of the batch still commits.
/// A transaction-level failure (e.g. a lost connection) rolls the whole batch
/// back and is returned as `Err`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait StatsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Snapshot of every persisted team, player, and game, for resolving
  /// references on one page of upstream records.
  fn reference_snapshot(
    &self,
  ) -> impl Future<Output = Result<ReferenceSet, Self::Error>> + Send + '_;

  fn team_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamId>, Self::Error>> + Send + '_;

  fn active_player_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<PlayerId>, Self::Error>> + Send + '_;

  /// Retrieve a player by id. Returns `None` if not found.
  fn get_player(
    &self,
    player_id: PlayerId,
  ) -> impl Future<Output = Result<Option<Player>, Self::Error>> + Send + '_;

  /// Joined season statistics, contract, and position for every player with
  /// a season row in `season`.
  fn value_inputs(
    &self,
    season: SeasonId,
  ) -> impl Future<Output = Result<Vec<ValueInput>, Self::Error>> + Send + '_;

  fn table_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<TableCount>, Self::Error>> + Send + '_;

  // ── Upserts ───────────────────────────────────────────────────────────

  /// Full overwrite of every non-key column.
  fn upsert_teams(
    &self,
    rows: Vec<Team>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  /// Roster columns overwrite; biographical columns keep their stored value
  /// when the incoming value is null or empty.
  fn upsert_players(
    &self,
    rows: Vec<Player>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn upsert_games(
    &self,
    rows: Vec<Game>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn upsert_game_stats(
    &self,
    rows: Vec<GameStatLine>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn upsert_season_stats(
    &self,
    rows: Vec<SeasonStatLine>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn upsert_salary_caps(
    &self,
    rows: Vec<SalaryCap>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn upsert_contracts(
    &self,
    rows: Vec<Contract>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  // ── Derived ───────────────────────────────────────────────────────────

  /// Delete every value-analysis row for `season` and insert `rows` in its
  /// place, atomically.
  fn replace_value_analysis(
    &self,
    season: SeasonId,
    rows: Vec<ValueAnalysis>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;
}

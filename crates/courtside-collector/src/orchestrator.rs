//! The collection run.
//!
//! Stages run in dependency order (teams, players, market data,
//! observations, metrics), each finishing before the next begins, because
//! every stage resolves references against rows the earlier ones stored.
//! Every write is an upsert, so a run can be repeated from any stage.

use std::collections::HashSet;

use chrono::Utc;
use courtside_core::{
  entity::{PlayerId, TeamId},
  metrics::{self, MetricConfig},
  record::RawRecord,
  resolve::{ReferenceSet, Resolve},
  season::SeasonId,
  stage::Stage,
  store::StatsStore,
};
use courtside_normalize::{
  normalize_all, normalize_contract, normalize_player, normalize_player_game,
  normalize_salary_cap, normalize_season_stat, normalize_team,
  normalize_team_game, prefer_aggregate,
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  config::{CollectorConfig, RetryConfig},
  error::FetchError,
  pace::{Jitter, Pacer, Sleeper, StopSignal, TokioSleeper, UniformJitter},
  report::{RunSummary, StageReport},
  retry::RetryExecutor,
  schedule::{BatchSchedule, run_batches},
  source::{OperationClass, Page, Request, StatsSource},
};

pub struct Orchestrator<St, Src, S = TokioSleeper, J = UniformJitter> {
  store:                St,
  source:               Src,
  pacer:                Pacer<S, J>,
  retry:                RetryConfig,
  schedule:             BatchSchedule,
  season:               SeasonId,
  fetch_player_details: bool,
  metrics:              MetricConfig,
  stop:                 StopSignal,
}

impl<St, Src, S, J> Orchestrator<St, Src, S, J>
where
  St: StatsStore,
  Src: StatsSource,
  S: Sleeper,
  J: Jitter,
{
  pub fn new(store: St, source: Src, pacer: Pacer<S, J>, cfg: &CollectorConfig) -> Self {
    Self {
      store,
      source,
      pacer,
      retry: cfg.retry,
      schedule: cfg.pacing,
      season: cfg.season.clone(),
      fetch_player_details: cfg.fetch_player_details,
      metrics: cfg.metrics.clone(),
      stop: StopSignal::new(),
    }
  }

  pub fn with_season(mut self, season: SeasonId) -> Self {
    self.season = season;
    self
  }

  pub fn season(&self) -> &SeasonId { &self.season }

  pub fn store(&self) -> &St { &self.store }

  /// A handle that stops the run before its next batch.
  pub fn stop_signal(&self) -> StopSignal { self.stop.clone() }

  /// Run `from` and every stage after it.
  pub async fn run(&self, from: Stage) -> Result<RunSummary> {
    info!(season = %self.season, from = %from, "collection starting");
    let mut summary = RunSummary::default();
    for stage in from.from_here() {
      if self.stop.is_stopped() {
        summary.stopped = true;
        break;
      }
      let report = self.run_stage(stage).await?;
      report.log();
      let stopped = report.stopped;
      summary.stages.push(report);
      if stopped {
        summary.stopped = true;
        break;
      }
    }
    info!(
      stages = summary.stages.len(),
      failed = summary.failed(),
      stopped = summary.stopped,
      "collection finished"
    );
    Ok(summary)
  }

  pub async fn run_stage(&self, stage: Stage) -> Result<StageReport> {
    debug!(stage = %stage, "stage starting");
    match stage {
      Stage::Teams => self.collect_teams().await,
      Stage::Players => self.collect_players().await,
      Stage::Market => self.collect_market().await,
      Stage::Observations => self.collect_observations().await,
      Stage::Metrics => self.compute_metrics().await,
    }
  }

  // ── Stages ────────────────────────────────────────────────────────────────

  async fn collect_teams(&self) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Teams);
    let Some(page) = self.fetch_counted(&Request::Teams, &mut report).await else {
      return Ok(report);
    };
    let teams = normalize_page(&mut report, &page, normalize_team);
    let outcome = self.store.upsert_teams(teams).await.map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(report)
  }

  async fn collect_players(&self) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Players);
    let request = Request::Players { season: self.season.clone() };
    if let Some(page) = self.fetch_counted(&request, &mut report).await {
      let records = normalize_page(&mut report, &page, normalize_player);
      let refs = self.snapshot().await?;
      let players = resolve_page(&mut report, records, &refs);
      let outcome = self.store.upsert_players(players).await.map_err(Error::store)?;
      report.stored.merge(outcome);
    }

    if self.fetch_player_details {
      let ids = self.store.active_player_ids().await.map_err(Error::store)?;
      // Detail rows only reference teams, which this stage never writes.
      let refs = self.snapshot().await?;
      let run = run_batches(
        "player details",
        ids,
        &self.schedule,
        &self.pacer,
        &self.stop,
        async |player_id| self.player_detail(player_id, &refs, &mut report).await,
      )
      .await?;
      report.absorb(&run);
    }
    Ok(report)
  }

  async fn collect_market(&self) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Market);
    let season = self.season.clone();

    let request = Request::SalaryCap { season: season.clone() };
    if let Some(page) = self.fetch_counted(&request, &mut report).await {
      let caps =
        normalize_page(&mut report, &page, |raw| normalize_salary_cap(raw, &season));
      let outcome = self.store.upsert_salary_caps(caps).await.map_err(Error::store)?;
      report.stored.merge(outcome);
    }

    self.pacer.pause(self.schedule.item_delay).await;

    let request = Request::Contracts { season: season.clone() };
    if let Some(page) = self.fetch_counted(&request, &mut report).await {
      let records =
        normalize_page(&mut report, &page, |raw| normalize_contract(raw, &season));
      let refs = self.snapshot().await?;
      let contracts = resolve_page(&mut report, records, &refs);
      let outcome = self.store.upsert_contracts(contracts).await.map_err(Error::store)?;
      report.stored.merge(outcome);
    }
    Ok(report)
  }

  async fn collect_observations(&self) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Observations);

    let teams = self.store.team_ids().await.map_err(Error::store)?;
    let run = run_batches(
      "team games",
      teams,
      &self.schedule,
      &self.pacer,
      &self.stop,
      async |team_id| self.team_games(team_id, &mut report).await,
    )
    .await?;
    report.absorb(&run);
    if report.stopped {
      return Ok(report);
    }

    let players = self.store.active_player_ids().await.map_err(Error::store)?;
    let run = run_batches(
      "player game logs",
      players.clone(),
      &self.schedule,
      &self.pacer,
      &self.stop,
      async |player_id| self.player_game_log(player_id, &mut report).await,
    )
    .await?;
    report.absorb(&run);
    if report.stopped {
      return Ok(report);
    }

    let run = run_batches(
      "career stats",
      players,
      &self.schedule,
      &self.pacer,
      &self.stop,
      async |player_id| self.player_career(player_id, &mut report).await,
    )
    .await?;
    report.absorb(&run);
    Ok(report)
  }

  async fn compute_metrics(&self) -> Result<StageReport> {
    let mut report = StageReport::new(Stage::Metrics);
    let inputs = self
      .store
      .value_inputs(self.season.clone())
      .await
      .map_err(Error::store)?;
    report.fetched = inputs.len();

    let computed_at = Utc::now();
    let mut rows = Vec::with_capacity(inputs.len());
    for input in &inputs {
      match metrics::compute(input, &self.metrics, computed_at) {
        Ok(row) => rows.push(row),
        Err(skip) => {
          debug!(player_id = input.player_id, reason = %skip, "no value metric");
          report.skipped += 1;
        }
      }
    }

    let outcome = self
      .store
      .replace_value_analysis(self.season.clone(), rows)
      .await
      .map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(report)
  }

  // ── Per-item work ─────────────────────────────────────────────────────────

  async fn player_detail(
    &self,
    player_id: PlayerId,
    refs: &ReferenceSet,
    report: &mut StageReport,
  ) -> Result<()> {
    let page = self.fetch(&Request::PlayerDetail { player_id }).await?;
    let records = normalize_page(report, &page, normalize_player);
    let players = resolve_page(report, records, refs);
    let outcome = self.store.upsert_players(players).await.map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(())
  }

  async fn team_games(&self, team_id: TeamId, report: &mut StageReport) -> Result<()> {
    let request = Request::TeamGames { team_id, season: self.season.clone() };
    let page = self.fetch(&request).await?;
    let records =
      normalize_page(report, &page, |raw| normalize_team_game(raw, &self.season));
    let refs = self.snapshot().await?;

    // A game log may repeat a game; keep its first row.
    let mut seen = HashSet::new();
    let games: Vec<_> = resolve_page(report, records, &refs)
      .into_iter()
      .filter(|game| seen.insert(game.game_id.clone()))
      .collect();

    let outcome = self.store.upsert_games(games).await.map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(())
  }

  async fn player_game_log(
    &self,
    player_id: PlayerId,
    report: &mut StageReport,
  ) -> Result<()> {
    let request = Request::PlayerGameLog { player_id, season: self.season.clone() };
    let page = self.fetch(&request).await?;
    let records =
      normalize_page(report, &page, |raw| normalize_player_game(raw, &self.season));
    let refs = self.snapshot().await?;
    let lines = resolve_page(report, records, &refs);
    let outcome = self.store.upsert_game_stats(lines).await.map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(())
  }

  async fn player_career(&self, player_id: PlayerId, report: &mut StageReport) -> Result<()> {
    let page = self.fetch(&Request::PlayerCareer { player_id }).await?;
    // Per-team rows of a traded player give way to the season total.
    let records = prefer_aggregate(normalize_page(report, &page, normalize_season_stat));

    let refs = self.snapshot().await?;
    let lines = resolve_page(report, records, &refs);
    let outcome = self.store.upsert_season_stats(lines).await.map_err(Error::store)?;
    report.stored.merge(outcome);
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch(&self, request: &Request) -> Result<Page, FetchError> {
    let policy = match request.class() {
      OperationClass::ProviderApi => &self.retry.api,
      OperationClass::WebPage => &self.retry.web,
    };
    let label = request.to_string();
    let page = RetryExecutor::new(policy, &self.pacer)
      .execute(&label, || self.source.fetch(request))
      .await?;
    debug!(
      request = %request,
      rows = page.records.len(),
      malformed = page.rejected.len(),
      "fetched"
    );
    Ok(page)
  }

  /// Fetch a stage-level request. A failure is counted and logged, and the
  /// stage carries on without it.
  async fn fetch_counted(
    &self,
    request: &Request,
    report: &mut StageReport,
  ) -> Option<Page> {
    match self.fetch(request).await {
      Ok(page) => Some(page),
      Err(e) => {
        warn!(request = %request, error = %e, "request failed");
        report.requests_failed += 1;
        None
      }
    }
  }

  async fn snapshot(&self) -> Result<ReferenceSet> {
    let refs = self.store.reference_snapshot().await.map_err(Error::store)?;
    debug!(
      teams = refs.team_count(),
      players = refs.player_count(),
      games = refs.game_count(),
      "reference snapshot taken"
    );
    Ok(refs)
  }
}

/// Normalize the decoded rows of `page`. Rows that failed to decode and rows
/// that fail to normalize both count as unparseable.
fn normalize_page<T>(
  report: &mut StageReport,
  page: &Page,
  normalize: impl Fn(&RawRecord) -> courtside_normalize::Result<T>,
) -> Vec<T> {
  report.fetched += page.records.len() + page.rejected.len();
  let normalized = normalize_all(&page.records, normalize);
  for e in page.rejected.iter().chain(&normalized.rejected) {
    warn!(stage = %report.stage, error = %e, "unparseable record skipped");
  }
  report.unparseable += page.rejected.len() + normalized.rejected.len();
  normalized.records
}

fn resolve_page<R: Resolve>(
  report: &mut StageReport,
  records: Vec<R>,
  refs: &ReferenceSet,
) -> Vec<R::Resolved> {
  let mut resolved = Vec::with_capacity(records.len());
  for record in records {
    match record.resolve(refs) {
      Ok(r) => resolved.push(r),
      Err(rejection) => {
        warn!(
          stage = %report.stage,
          reason = %rejection.reason,
          key = %rejection.key,
          record = %rejection.record,
          "record rejected"
        );
        report.rejected += 1;
      }
    }
  }
  resolved
}

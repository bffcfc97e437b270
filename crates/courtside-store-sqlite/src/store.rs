//! [`SqliteStore`], the SQLite implementation of [`StatsStore`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Statement};
use tracing::{debug, warn};

use courtside_core::{
  entity::{
    Contract, Game, GameStatLine, Player, PlayerId, SalaryCap, SeasonStatLine,
    Team, TeamId, ValueAnalysis,
  },
  metrics::ValueInput,
  resolve::ReferenceSet,
  season::SeasonId,
  store::{BatchOutcome, StatsStore, TableCount},
};

use crate::{
  Error, Result,
  encode::{
    RawPlayer, RawValueInput, encode_counts, encode_date, encode_dt,
    encode_season, encode_shooting,
  },
  error::is_row_level,
  pool::Pool,
  schema::{REQUIRED_TABLES, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Courtside statistics store backed by one SQLite database.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Pool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with `pool_size` connections.
  pub async fn open(path: impl AsRef<Path>, pool_size: usize) -> Result<Self> {
    let store = Self { pool: Pool::open(path, pool_size).await? };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory(pool_size: usize) -> Result<Self> {
    let store = Self { pool: Pool::open_in_memory(pool_size).await? };
    store.init_schema().await?;
    Ok(store)
  }

  pub fn pool(&self) -> &Pool { &self.pool }

  async fn init_schema(&self) -> Result<()> {
    let conn = self.pool.acquire()?;
    let present: HashSet<String> = conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let mut stmt =
          conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(names)
      })
      .await?;

    match REQUIRED_TABLES.iter().copied().find(|t| !present.contains(*t)) {
      Some(missing) => Err(Error::MissingTable(missing)),
      None => Ok(()),
    }
  }

  /// Write `rows` in one transaction with `sql`, skipping rows that fail on
  /// their own.
  pub(crate) async fn write_batch<T: Keyed + Send + 'static>(
    &self,
    table: &'static str,
    sql: &'static str,
    rows: Vec<T>,
    bind: Binder<T>,
  ) -> Result<BatchOutcome> {
    if rows.is_empty() {
      return Ok(BatchOutcome::default());
    }
    let conn = self.pool.acquire()?;
    let updated_at = encode_dt(Utc::now());

    let outcome = conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = {
          let mut stmt = tx.prepare(sql)?;
          apply_rows(table, &mut stmt, &rows, &updated_at, bind)?
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    debug!(
      table,
      succeeded = outcome.succeeded,
      failed = outcome.failed,
      "batch committed"
    );
    Ok(outcome)
  }
}

// ─── Row binding ─────────────────────────────────────────────────────────────

/// Binds one row to a prepared upsert and executes it. The `&str` is the
/// batch's `updated_at` timestamp.
pub(crate) type Binder<T> = fn(&mut Statement<'_>, &T, &str) -> rusqlite::Result<usize>;

/// Identifying columns of a row, for skip diagnostics.
pub(crate) trait Keyed {
  fn key(&self) -> String;
}

/// Execute `bind` for each row. Row-level failures are logged and counted;
/// any other failure is returned and the caller's transaction rolls back.
fn apply_rows<T: Keyed>(
  table: &'static str,
  stmt: &mut Statement<'_>,
  rows: &[T],
  updated_at: &str,
  bind: Binder<T>,
) -> rusqlite::Result<BatchOutcome> {
  let mut outcome = BatchOutcome::default();
  for row in rows {
    match bind(stmt, row, updated_at) {
      Ok(_) => outcome.succeeded += 1,
      Err(e) if is_row_level(&e) => {
        warn!(table, row = %row.key(), error = %e, "skipping row");
        outcome.failed += 1;
      }
      Err(e) => return Err(e),
    }
  }
  Ok(outcome)
}

impl Keyed for Team {
  fn key(&self) -> String { format!("team_id={}", self.team_id) }
}

impl Keyed for Player {
  fn key(&self) -> String { format!("player_id={}", self.player_id) }
}

impl Keyed for Game {
  fn key(&self) -> String { format!("game_id={}", self.game_id) }
}

impl Keyed for GameStatLine {
  fn key(&self) -> String {
    format!("game_id={} player_id={}", self.game_id, self.player_id)
  }
}

impl Keyed for SeasonStatLine {
  fn key(&self) -> String {
    format!("player_id={} season_id={}", self.player_id, self.season_id)
  }
}

impl Keyed for SalaryCap {
  fn key(&self) -> String { format!("season_id={}", self.season_id) }
}

impl Keyed for Contract {
  fn key(&self) -> String {
    format!("player_id={} season_id={}", self.player_id, self.season_id)
  }
}

impl Keyed for ValueAnalysis {
  fn key(&self) -> String {
    format!("player_id={} season_id={}", self.player_id, self.season_id)
  }
}

// ─── Upsert statements ───────────────────────────────────────────────────────

pub(crate) const UPSERT_TEAM: &str = "
  INSERT INTO teams (
    team_id, full_name, abbreviation, nickname, city, state, year_founded,
    updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
  ON CONFLICT (team_id) DO UPDATE SET
    full_name    = excluded.full_name,
    abbreviation = excluded.abbreviation,
    nickname     = excluded.nickname,
    city         = excluded.city,
    state        = excluded.state,
    year_founded = excluded.year_founded,
    updated_at   = excluded.updated_at";

pub(crate) fn bind_team(stmt: &mut Statement<'_>, t: &Team, at: &str) -> rusqlite::Result<usize> {
  stmt.execute(rusqlite::params![
    t.team_id,
    t.full_name,
    t.abbreviation,
    t.nickname,
    t.city,
    t.state,
    t.year_founded,
    at,
  ])
}

// Roster columns overwrite. Biographical columns and `is_active` merge on
// null; empty text counts as null.
const UPSERT_PLAYER: &str = "
  INSERT INTO players (
    player_id, full_name, is_active, team_id,
    first_name, last_name, birthdate, college, country, height, weight,
    position, jersey, draft_year, from_year, to_year, updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
  ON CONFLICT (player_id) DO UPDATE SET
    full_name  = excluded.full_name,
    team_id    = excluded.team_id,
    is_active  = COALESCE(excluded.is_active, players.is_active),
    first_name = COALESCE(NULLIF(excluded.first_name, ''), players.first_name),
    last_name  = COALESCE(NULLIF(excluded.last_name, ''),  players.last_name),
    birthdate  = COALESCE(NULLIF(excluded.birthdate, ''),  players.birthdate),
    college    = COALESCE(NULLIF(excluded.college, ''),    players.college),
    country    = COALESCE(NULLIF(excluded.country, ''),    players.country),
    height     = COALESCE(NULLIF(excluded.height, ''),     players.height),
    weight     = COALESCE(excluded.weight,                 players.weight),
    position   = COALESCE(NULLIF(excluded.position, ''),   players.position),
    jersey     = COALESCE(NULLIF(excluded.jersey, ''),     players.jersey),
    draft_year = COALESCE(excluded.draft_year,             players.draft_year),
    from_year  = COALESCE(excluded.from_year,              players.from_year),
    to_year    = COALESCE(excluded.to_year,                players.to_year),
    updated_at = excluded.updated_at";

fn bind_player(stmt: &mut Statement<'_>, p: &Player, at: &str) -> rusqlite::Result<usize> {
  let b = &p.bio;
  stmt.execute(rusqlite::params![
    p.player_id,
    p.full_name,
    p.is_active,
    p.team_id,
    b.first_name,
    b.last_name,
    b.birthdate.map(encode_date),
    b.college,
    b.country,
    b.height,
    b.weight,
    b.position,
    b.jersey,
    b.draft_year,
    b.from_year,
    b.to_year,
    at,
  ])
}

const UPSERT_GAME: &str = "
  INSERT INTO games (
    game_id, season_id, game_date, home_team_id, away_team_id,
    home_team_score, away_team_score, updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
  ON CONFLICT (game_id) DO UPDATE SET
    season_id       = excluded.season_id,
    game_date       = excluded.game_date,
    home_team_id    = excluded.home_team_id,
    away_team_id    = excluded.away_team_id,
    home_team_score = excluded.home_team_score,
    away_team_score = excluded.away_team_score,
    updated_at      = excluded.updated_at";

fn bind_game(stmt: &mut Statement<'_>, g: &Game, at: &str) -> rusqlite::Result<usize> {
  stmt.execute(rusqlite::params![
    g.game_id,
    encode_season(&g.season_id),
    encode_date(g.game_date),
    g.home_team_id,
    g.away_team_id,
    g.home_team_score,
    g.away_team_score,
    at,
  ])
}

const UPSERT_GAME_STAT: &str = "
  INSERT INTO player_game_stats (
    game_id, player_id, team_id, season_id, minutes,
    points, rebounds, assists, steals, blocks, turnovers,
    fgm, fga, fg3m, fg3a, ftm, fta,
    fg_pct, fg3_pct, ft_pct, plus_minus, updated_at
  ) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
    ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
  )
  ON CONFLICT (game_id, player_id) DO UPDATE SET
    team_id    = excluded.team_id,
    season_id  = excluded.season_id,
    minutes    = excluded.minutes,
    points     = excluded.points,
    rebounds   = excluded.rebounds,
    assists    = excluded.assists,
    steals     = excluded.steals,
    blocks     = excluded.blocks,
    turnovers  = excluded.turnovers,
    fgm        = excluded.fgm,
    fga        = excluded.fga,
    fg3m       = excluded.fg3m,
    fg3a       = excluded.fg3a,
    ftm        = excluded.ftm,
    fta        = excluded.fta,
    fg_pct     = excluded.fg_pct,
    fg3_pct    = excluded.fg3_pct,
    ft_pct     = excluded.ft_pct,
    plus_minus = excluded.plus_minus,
    updated_at = excluded.updated_at";

fn bind_game_stat(
  stmt: &mut Statement<'_>,
  s: &GameStatLine,
  at: &str,
) -> rusqlite::Result<usize> {
  let [pts, reb, ast, stl, blk, tov, fgm, fga, fg3m, fg3a, ftm, fta] =
    encode_counts(&s.counts);
  let [fg_pct, fg3_pct, ft_pct] = encode_shooting(&s.shooting);
  stmt.execute(rusqlite::params![
    s.game_id,
    s.player_id,
    s.team_id,
    encode_season(&s.season_id),
    s.minutes,
    pts,
    reb,
    ast,
    stl,
    blk,
    tov,
    fgm,
    fga,
    fg3m,
    fg3a,
    ftm,
    fta,
    fg_pct,
    fg3_pct,
    ft_pct,
    s.plus_minus,
    at,
  ])
}

const UPSERT_SEASON_STAT: &str = "
  INSERT INTO player_season_stats (
    player_id, season_id, team_id, games_played, games_started, minutes,
    points, rebounds, assists, steals, blocks, turnovers,
    fgm, fga, fg3m, fg3a, ftm, fta,
    fg_pct, fg3_pct, ft_pct, updated_at
  ) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
    ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
  )
  ON CONFLICT (player_id, season_id) DO UPDATE SET
    team_id       = excluded.team_id,
    games_played  = excluded.games_played,
    games_started = excluded.games_started,
    minutes       = excluded.minutes,
    points        = excluded.points,
    rebounds      = excluded.rebounds,
    assists       = excluded.assists,
    steals        = excluded.steals,
    blocks        = excluded.blocks,
    turnovers     = excluded.turnovers,
    fgm           = excluded.fgm,
    fga           = excluded.fga,
    fg3m          = excluded.fg3m,
    fg3a          = excluded.fg3a,
    ftm           = excluded.ftm,
    fta           = excluded.fta,
    fg_pct        = excluded.fg_pct,
    fg3_pct       = excluded.fg3_pct,
    ft_pct        = excluded.ft_pct,
    updated_at    = excluded.updated_at";

fn bind_season_stat(
  stmt: &mut Statement<'_>,
  s: &SeasonStatLine,
  at: &str,
) -> rusqlite::Result<usize> {
  let [pts, reb, ast, stl, blk, tov, fgm, fga, fg3m, fg3a, ftm, fta] =
    encode_counts(&s.counts);
  let [fg_pct, fg3_pct, ft_pct] = encode_shooting(&s.shooting);
  stmt.execute(rusqlite::params![
    s.player_id,
    encode_season(&s.season_id),
    s.team_id,
    s.games_played,
    s.games_started,
    s.minutes,
    pts,
    reb,
    ast,
    stl,
    blk,
    tov,
    fgm,
    fga,
    fg3m,
    fg3a,
    ftm,
    fta,
    fg_pct,
    fg3_pct,
    ft_pct,
    at,
  ])
}

const UPSERT_SALARY_CAP: &str = "
  INSERT INTO salary_caps (
    season_id, salary_cap, luxury_tax, first_apron, second_apron,
    minimum_salary, updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
  ON CONFLICT (season_id) DO UPDATE SET
    salary_cap     = excluded.salary_cap,
    luxury_tax     = excluded.luxury_tax,
    first_apron    = excluded.first_apron,
    second_apron   = excluded.second_apron,
    minimum_salary = excluded.minimum_salary,
    updated_at     = excluded.updated_at";

fn bind_salary_cap(
  stmt: &mut Statement<'_>,
  c: &SalaryCap,
  at: &str,
) -> rusqlite::Result<usize> {
  stmt.execute(rusqlite::params![
    encode_season(&c.season_id),
    c.salary_cap,
    c.luxury_tax,
    c.first_apron,
    c.second_apron,
    c.minimum_salary,
    at,
  ])
}

const UPSERT_CONTRACT: &str = "
  INSERT INTO player_contracts (player_id, season_id, salary, team_id, updated_at)
  VALUES (?1, ?2, ?3, ?4, ?5)
  ON CONFLICT (player_id, season_id) DO UPDATE SET
    salary     = excluded.salary,
    team_id    = excluded.team_id,
    updated_at = excluded.updated_at";

fn bind_contract(
  stmt: &mut Statement<'_>,
  c: &Contract,
  at: &str,
) -> rusqlite::Result<usize> {
  stmt.execute(rusqlite::params![
    c.player_id,
    encode_season(&c.season_id),
    c.salary,
    c.team_id,
    at,
  ])
}

const INSERT_VALUE_ANALYSIS: &str = "
  INSERT INTO player_value_analysis (
    player_id, season_id, salary, total_improvement, value_per_dollar,
    efficiency_rating, cost_efficiency_score, value_vs_average, computed_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

fn bind_value_analysis(
  stmt: &mut Statement<'_>,
  v: &ValueAnalysis,
  _at: &str,
) -> rusqlite::Result<usize> {
  stmt.execute(rusqlite::params![
    v.player_id,
    encode_season(&v.season_id),
    v.salary,
    v.total_improvement,
    v.value_per_dollar,
    v.efficiency_rating,
    v.cost_efficiency_score,
    v.value_vs_average,
    encode_dt(v.computed_at),
  ])
}

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn reference_snapshot(&self) -> Result<ReferenceSet> {
    let conn = self.pool.acquire()?;
    let set = conn
      .call(|conn| {
        let mut set = ReferenceSet::new();

        let mut stmt = conn.prepare("SELECT team_id, abbreviation FROM teams")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          let abbr: String = row.get(1)?;
          set.add_team(row.get(0)?, &abbr);
        }

        let mut stmt = conn.prepare("SELECT player_id, full_name FROM players")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          let name: String = row.get(1)?;
          set.add_player(row.get(0)?, &name);
        }

        let mut stmt = conn.prepare("SELECT game_id FROM games")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          set.add_game(row.get::<_, String>(0)?);
        }

        Ok(set)
      })
      .await?;
    Ok(set)
  }

  async fn team_ids(&self) -> Result<Vec<TeamId>> {
    let conn = self.pool.acquire()?;
    let ids = conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT team_id FROM teams ORDER BY team_id")?;
        let ids = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<TeamId>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn active_player_ids(&self) -> Result<Vec<PlayerId>> {
    let conn = self.pool.acquire()?;
    let ids = conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT player_id FROM players WHERE is_active = 1 ORDER BY player_id",
        )?;
        let ids = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<PlayerId>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
    let conn = self.pool.acquire()?;
    let raw: Option<RawPlayer> = conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM players WHERE player_id = ?1",
          RawPlayer::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![player_id], RawPlayer::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlayer::into_player).transpose()
  }

  async fn value_inputs(&self, season: SeasonId) -> Result<Vec<ValueInput>> {
    let season_str = encode_season(&season);
    let conn = self.pool.acquire()?;

    let raws: Vec<RawValueInput> = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             s.player_id, s.season_id, p.position, s.games_played,
             s.points, s.rebounds, s.assists, s.steals, s.blocks, s.turnovers,
             s.fg_pct, s.fg3_pct, s.ft_pct,
             c.salary
           FROM player_season_stats s
           JOIN players p ON p.player_id = s.player_id
           LEFT JOIN player_contracts c
             ON c.player_id = s.player_id AND c.season_id = s.season_id
           WHERE s.season_id = ?1
           ORDER BY s.player_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![season_str], RawValueInput::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawValueInput::into_value_input).collect()
  }

  async fn table_counts(&self) -> Result<Vec<TableCount>> {
    let conn = self.pool.acquire()?;
    let counts = conn
      .call(|conn| {
        let mut counts = Vec::with_capacity(REQUIRED_TABLES.len());
        for &table in REQUIRED_TABLES {
          let rows: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          counts.push(TableCount { table, rows: rows.max(0) as u64 });
        }
        Ok(counts)
      })
      .await?;
    Ok(counts)
  }

  // ── Upserts ───────────────────────────────────────────────────────────────

  async fn upsert_teams(&self, rows: Vec<Team>) -> Result<BatchOutcome> {
    self.write_batch("teams", UPSERT_TEAM, rows, bind_team).await
  }

  async fn upsert_players(&self, rows: Vec<Player>) -> Result<BatchOutcome> {
    self.write_batch("players", UPSERT_PLAYER, rows, bind_player).await
  }

  async fn upsert_games(&self, rows: Vec<Game>) -> Result<BatchOutcome> {
    self.write_batch("games", UPSERT_GAME, rows, bind_game).await
  }

  async fn upsert_game_stats(&self, rows: Vec<GameStatLine>) -> Result<BatchOutcome> {
    self
      .write_batch("player_game_stats", UPSERT_GAME_STAT, rows, bind_game_stat)
      .await
  }

  async fn upsert_season_stats(
    &self,
    rows: Vec<SeasonStatLine>,
  ) -> Result<BatchOutcome> {
    self
      .write_batch("player_season_stats", UPSERT_SEASON_STAT, rows, bind_season_stat)
      .await
  }

  async fn upsert_salary_caps(&self, rows: Vec<SalaryCap>) -> Result<BatchOutcome> {
    self
      .write_batch("salary_caps", UPSERT_SALARY_CAP, rows, bind_salary_cap)
      .await
  }

  async fn upsert_contracts(&self, rows: Vec<Contract>) -> Result<BatchOutcome> {
    self
      .write_batch("player_contracts", UPSERT_CONTRACT, rows, bind_contract)
      .await
  }

  // ── Derived ───────────────────────────────────────────────────────────────

  async fn replace_value_analysis(
    &self,
    season: SeasonId,
    rows: Vec<ValueAnalysis>,
  ) -> Result<BatchOutcome> {
    let (rows, foreign): (Vec<_>, Vec<_>) =
      rows.into_iter().partition(|r| r.season_id == season);
    for r in &foreign {
      warn!(
        table = "player_value_analysis",
        row = %r.key(),
        season = %season,
        "skipping row from another season"
      );
    }

    let season_str = encode_season(&season);
    let conn = self.pool.acquire()?;
    let mut outcome = conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM player_value_analysis WHERE season_id = ?1",
          rusqlite::params![season_str],
        )?;
        let outcome = {
          let mut stmt = tx.prepare(INSERT_VALUE_ANALYSIS)?;
          apply_rows(
            "player_value_analysis",
            &mut stmt,
            &rows,
            "",
            bind_value_analysis,
          )?
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    outcome.failed += foreign.len();
    debug!(
      season = %season,
      succeeded = outcome.succeeded,
      failed = outcome.failed,
      "value analysis replaced"
    );
    Ok(outcome)
  }
}

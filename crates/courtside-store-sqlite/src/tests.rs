//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use courtside_core::{
  entity::{
    Contract, Game, GameStatLine, Pct, Player, PlayerBio, SalaryCap,
    SeasonStatLine, Shooting, StatCounts, Team, ValueAnalysis,
  },
  record::{PlayerRef, TeamRef},
  season::SeasonId,
  store::StatsStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(2)
    .await
    .expect("in-memory store")
}

fn season() -> SeasonId { SeasonId::starting(2024) }

fn team(id: i64, abbr: &str) -> Team {
  Team {
    team_id:      id,
    full_name:    format!("Team {abbr}"),
    abbreviation: abbr.into(),
    nickname:     Some(format!("{abbr}s")),
    city:         None,
    state:        None,
    year_founded: Some(1948),
  }
}

fn player(id: i64, name: &str, team_id: Option<i64>) -> Player {
  Player {
    player_id: id,
    full_name: name.into(),
    is_active: Some(true),
    team_id,
    bio: PlayerBio::default(),
  }
}

fn game(id: &str, home: i64, away: i64) -> Game {
  Game {
    game_id:         id.into(),
    season_id:       season(),
    game_date:       NaiveDate::from_ymd_opt(2025, 4, 11).unwrap(),
    home_team_id:    home,
    away_team_id:    away,
    home_team_score: Some(110),
    away_team_score: Some(103),
  }
}

fn line(game_id: &str, player_id: i64, team_id: i64, points: i64) -> GameStatLine {
  GameStatLine {
    game_id: game_id.into(),
    player_id,
    team_id,
    season_id: season(),
    minutes: 34.5,
    counts: StatCounts { points, ..StatCounts::default() },
    shooting: Shooting {
      fg_pct: Some(Pct::new(0.5).unwrap()),
      ..Shooting::default()
    },
    plus_minus: Some(7),
  }
}

fn season_line(player_id: i64, games_played: i32, points: i64) -> SeasonStatLine {
  SeasonStatLine {
    player_id,
    season_id: season(),
    team_id: Some(1),
    games_played,
    games_started: games_played,
    minutes: 2000.0,
    counts: StatCounts { points, rebounds: 300, ..StatCounts::default() },
    shooting: Shooting {
      fg_pct:  Some(Pct::new(0.48).unwrap()),
      fg3_pct: None,
      ft_pct:  Some(Pct::new(0.8).unwrap()),
    },
  }
}

fn analysis(player_id: i64, season_id: SeasonId) -> ValueAnalysis {
  ValueAnalysis {
    player_id,
    season_id,
    salary: 10_000_000,
    total_improvement: 20.0,
    value_per_dollar: 2.0,
    efficiency_rating: 0.5,
    cost_efficiency_score: 1.0,
    value_vs_average: 2.5,
    computed_at: Utc::now(),
  }
}

/// A store with two teams and one active player on team 1.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.upsert_teams(vec![team(1, "LAL"), team(2, "BOS")]).await.unwrap();
  s.upsert_players(vec![player(10, "LeBron James", Some(1))])
    .await
    .unwrap();
  s
}

async fn count(s: &SqliteStore, table: &str) -> u64 {
  s.table_counts()
    .await
    .unwrap()
    .into_iter()
    .find(|c| c.table == table)
    .map(|c| c.rows)
    .unwrap()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn opening_reports_every_table_empty() {
  let s = store().await;
  let counts = s.table_counts().await.unwrap();
  assert_eq!(counts.len(), 8);
  assert!(counts.iter().all(|c| c.rows == 0));
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
  let s = store().await;
  let outcome = s.upsert_teams(vec![]).await.unwrap();
  assert_eq!(outcome.attempted(), 0);
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn upserting_twice_leaves_one_row() {
  let s = store().await;
  s.upsert_teams(vec![team(1, "LAL")]).await.unwrap();
  let outcome = s.upsert_teams(vec![team(1, "LAL")]).await.unwrap();
  assert_eq!(outcome.succeeded, 1);
  assert_eq!(count(&s, "teams").await, 1);
}

#[tokio::test]
async fn team_upsert_overwrites_every_column() {
  let s = store().await;
  s.upsert_teams(vec![team(1, "LAL")]).await.unwrap();

  let mut renamed = team(1, "LAL");
  renamed.full_name = "Los Angeles Lakers".into();
  renamed.nickname = None;
  s.upsert_teams(vec![renamed]).await.unwrap();

  let conn = s.pool().acquire().unwrap();
  let (name, nickname): (String, Option<String>) = conn
    .call(|c| {
      Ok(c.query_row(
        "SELECT full_name, nickname FROM teams WHERE team_id = 1",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(name, "Los Angeles Lakers");
  assert_eq!(nickname, None);
}

#[tokio::test]
async fn restated_game_line_updates_in_place() {
  let s = seeded().await;
  s.upsert_games(vec![game("0022400001", 1, 2)]).await.unwrap();
  s.upsert_game_stats(vec![line("0022400001", 10, 1, 28)])
    .await
    .unwrap();
  s.upsert_game_stats(vec![line("0022400001", 10, 1, 30)])
    .await
    .unwrap();

  assert_eq!(count(&s, "player_game_stats").await, 1);
  let conn = s.pool().acquire().unwrap();
  let points: i64 = conn
    .call(|c| {
      Ok(c.query_row("SELECT points FROM player_game_stats", [], |r| r.get(0))?)
    })
    .await
    .unwrap();
  assert_eq!(points, 30);
}

// ─── Merge-on-null ───────────────────────────────────────────────────────────

#[tokio::test]
async fn null_college_keeps_stored_value() {
  let s = seeded().await;
  let mut detailed = player(10, "LeBron James", Some(1));
  detailed.bio.college = Some("Duke".into());
  detailed.bio.birthdate = NaiveDate::from_ymd_opt(1984, 12, 30);
  s.upsert_players(vec![detailed]).await.unwrap();

  let mut sparse = player(10, "LeBron James", Some(2));
  sparse.is_active = None;
  s.upsert_players(vec![sparse]).await.unwrap();

  let p = s.get_player(10).await.unwrap().unwrap();
  assert_eq!(p.bio.college.as_deref(), Some("Duke"));
  assert_eq!(p.bio.birthdate, NaiveDate::from_ymd_opt(1984, 12, 30));
  assert_eq!(p.is_active, Some(true));
  assert_eq!(p.team_id, Some(2), "roster team is authoritative");
}

#[tokio::test]
async fn activity_flag_merges_on_null_and_overwrites_otherwise() {
  let s = seeded().await;

  let mut unreported = player(10, "LeBron James", Some(1));
  unreported.is_active = None;
  s.upsert_players(vec![unreported]).await.unwrap();
  assert_eq!(s.get_player(10).await.unwrap().unwrap().is_active, Some(true));

  let mut retired = player(10, "LeBron James", None);
  retired.is_active = Some(false);
  s.upsert_players(vec![retired]).await.unwrap();
  let p = s.get_player(10).await.unwrap().unwrap();
  assert_eq!(p.is_active, Some(false));
  assert_eq!(p.team_id, None);
}

#[tokio::test]
async fn empty_string_counts_as_null() {
  let s = seeded().await;
  let mut detailed = player(10, "LeBron James", Some(1));
  detailed.bio.college = Some("Duke".into());
  s.upsert_players(vec![detailed]).await.unwrap();

  let mut blank = player(10, "LeBron James", Some(1));
  blank.bio.college = Some(String::new());
  s.upsert_players(vec![blank]).await.unwrap();

  let p = s.get_player(10).await.unwrap().unwrap();
  assert_eq!(p.bio.college.as_deref(), Some("Duke"));
}

#[tokio::test]
async fn new_value_replaces_old_bio_value() {
  let s = seeded().await;
  let mut first = player(10, "LeBron James", Some(1));
  first.bio.weight = Some(240);
  s.upsert_players(vec![first]).await.unwrap();

  let mut second = player(10, "LeBron James", Some(1));
  second.bio.weight = Some(250);
  s.upsert_players(vec![second]).await.unwrap();

  let p = s.get_player(10).await.unwrap().unwrap();
  assert_eq!(p.bio.weight, Some(250));
}

// ─── Row-level failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn dangling_reference_is_skipped_without_partial_row() {
  let s = seeded().await;
  s.upsert_games(vec![game("0022400001", 1, 2)]).await.unwrap();

  let outcome = s
    .upsert_game_stats(vec![
      line("0022400001", 10, 1, 30),
      line("0022499999", 10, 1, 12), // unknown game
      line("0022400001", 99, 1, 12), // unknown player
    ])
    .await
    .unwrap();

  assert_eq!(outcome.succeeded, 1);
  assert_eq!(outcome.failed, 2);
  assert_eq!(count(&s, "player_game_stats").await, 1);
}

#[tokio::test]
async fn check_violation_is_counted_not_raised() {
  let s = seeded().await;
  let outcome = s
    .upsert_contracts(vec![
      Contract { player_id: 10, season_id: season(), salary: -1, team_id: None },
      Contract {
        player_id: 10,
        season_id: SeasonId::starting(2023),
        salary:    47_607_350,
        team_id:   Some(1),
      },
    ])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);
  assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn self_matchup_game_is_rejected_by_the_store() {
  let s = seeded().await;
  let outcome = s.upsert_games(vec![game("1", 1, 1)]).await.unwrap();
  assert_eq!(outcome.failed, 1);
  assert_eq!(count(&s, "games").await, 0);
}

#[tokio::test]
async fn duplicate_abbreviation_is_a_row_failure() {
  let s = store().await;
  let outcome = s
    .upsert_teams(vec![team(1, "LAL"), team(2, "LAL")])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);
  assert_eq!(outcome.failed, 1);
}

/// Writes every team except id 2, which fails the statement outright.
fn bind_failing_on_second(
  stmt: &mut rusqlite::Statement<'_>,
  t: &Team,
  at: &str,
) -> rusqlite::Result<usize> {
  if t.team_id == 2 {
    return Err(rusqlite::Error::InvalidQuery);
  }
  crate::store::bind_team(stmt, t, at)
}

#[tokio::test]
async fn statement_failure_rolls_back_the_whole_batch() {
  let s = store().await;
  let result = s
    .write_batch(
      "teams",
      crate::store::UPSERT_TEAM,
      vec![team(1, "LAL"), team(2, "BOS"), team(3, "NYK")],
      bind_failing_on_second,
    )
    .await;

  assert!(matches!(result, Err(Error::Database(_))), "got {result:?}");
  // Team 1 was written before the failure and must not survive it.
  assert_eq!(count(&s, "teams").await, 0);
}

// ─── Market data ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn salary_cap_upsert_is_idempotent() {
  let s = store().await;
  let cap = SalaryCap {
    season_id:      season(),
    salary_cap:     140_588_000,
    luxury_tax:     Some(170_814_000),
    first_apron:    Some(178_132_000),
    second_apron:   Some(188_931_000),
    minimum_salary: None,
  };
  s.upsert_salary_caps(vec![cap.clone()]).await.unwrap();
  s.upsert_salary_caps(vec![cap]).await.unwrap();
  assert_eq!(count(&s, "salary_caps").await, 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_holds_every_reference() {
  let s = seeded().await;
  s.upsert_games(vec![game("0022400001", 1, 2)]).await.unwrap();

  let refs = s.reference_snapshot().await.unwrap();
  assert_eq!(refs.team(&TeamRef::Abbreviation("BOS".into())), Some(2));
  assert_eq!(refs.team(&TeamRef::Id(1)), Some(1));
  assert_eq!(refs.team(&TeamRef::Abbreviation("NYK".into())), None);
  assert!(refs.has_player(10));
  assert!(refs.has_game("0022400001"));
  assert_eq!(refs.player(&PlayerRef::Name("lebron james".into())), Ok(10));
  assert_eq!(
    (refs.team_count(), refs.player_count(), refs.game_count()),
    (2, 1, 1)
  );
}

#[tokio::test]
async fn active_players_only() {
  let s = seeded().await;
  let mut retired = player(11, "Kobe Bryant", None);
  retired.is_active = Some(false);
  s.upsert_players(vec![retired]).await.unwrap();

  assert_eq!(s.active_player_ids().await.unwrap(), vec![10]);
  assert_eq!(s.team_ids().await.unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn missing_player_is_none() {
  let s = store().await;
  assert!(s.get_player(42).await.unwrap().is_none());
}

#[tokio::test]
async fn value_inputs_join_contract_and_position() {
  let s = seeded().await;
  let mut with_position = player(10, "LeBron James", Some(1));
  with_position.bio.position = Some("Forward".into());
  s.upsert_players(vec![with_position, player(11, "Rookie", Some(2))])
    .await
    .unwrap();
  s.upsert_season_stats(vec![season_line(10, 70, 1800), season_line(11, 5, 20)])
    .await
    .unwrap();
  s.upsert_contracts(vec![Contract {
    player_id: 10,
    season_id: season(),
    salary:    48_728_845,
    team_id:   Some(1),
  }])
  .await
  .unwrap();

  let inputs = s.value_inputs(season()).await.unwrap();
  assert_eq!(inputs.len(), 2);

  let lebron = &inputs[0];
  assert_eq!(lebron.player_id, 10);
  assert_eq!(lebron.position.as_deref(), Some("Forward"));
  assert_eq!(lebron.salary, Some(48_728_845));
  assert!((lebron.rates.points.unwrap() - 1800.0 / 70.0).abs() < 1e-9);
  assert_eq!(lebron.shooting.fg3_pct, None);

  assert_eq!(inputs[1].salary, None);
  assert!(s.value_inputs(SeasonId::starting(2019)).await.unwrap().is_empty());
}

// ─── Derived metrics ─────────────────────────────────────────────────────────

#[tokio::test]
async fn value_analysis_is_replaced_per_season() {
  let s = seeded().await;
  s.upsert_players(vec![player(11, "Rookie", Some(2))])
    .await
    .unwrap();
  let prior = SeasonId::starting(2023);

  s.replace_value_analysis(prior.clone(), vec![analysis(10, prior.clone())])
    .await
    .unwrap();
  s.replace_value_analysis(season(), vec![analysis(10, season()), analysis(11, season())])
    .await
    .unwrap();
  assert_eq!(count(&s, "player_value_analysis").await, 3);

  let outcome = s
    .replace_value_analysis(season(), vec![analysis(11, season())])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);
  // Player 10's current-season row is gone; the prior season is untouched.
  assert_eq!(count(&s, "player_value_analysis").await, 2);
}

#[tokio::test]
async fn value_analysis_for_another_season_is_refused() {
  let s = seeded().await;
  let outcome = s
    .replace_value_analysis(season(), vec![analysis(10, SeasonId::starting(2023))])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 0);
  assert_eq!(outcome.failed, 1);
  assert_eq!(count(&s, "player_value_analysis").await, 0);
}

// ─── Pool ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exhausted_pool_fails_store_calls_immediately() {
  let s = store().await;
  let _a = s.pool().acquire().unwrap();
  let _b = s.pool().acquire().unwrap();
  assert!(matches!(
    s.team_ids().await,
    Err(Error::PoolExhausted { size: 2 })
  ));
}

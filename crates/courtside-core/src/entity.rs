//! Persisted entity types.
//!
//! Every type here is in its final, resolved shape: all references point at
//! rows that were present in the reference snapshot when the record was
//! resolved. Records that still carry unresolved references live in
//! [`crate::record`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, season::SeasonId};

pub type TeamId = i64;
pub type PlayerId = i64;
pub type GameId = String;

// ─── Percentages ─────────────────────────────────────────────────────────────

/// A shooting percentage stored as a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Pct(f64);

impl Pct {
  pub fn new(value: f64) -> Result<Self> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::PercentageOutOfRange(value))
    }
  }

  pub fn get(self) -> f64 { self.0 }
}

impl TryFrom<f64> for Pct {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::new(value) }
}

impl From<Pct> for f64 {
  fn from(p: Pct) -> Self { p.0 }
}

/// Field-goal, three-point, and free-throw percentages. `None` means the
/// provider did not report the value; it is never coerced to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Shooting {
  pub fg_pct:  Option<Pct>,
  pub fg3_pct: Option<Pct>,
  pub ft_pct:  Option<Pct>,
}

// ─── Counting stats ──────────────────────────────────────────────────────────

/// Counted box-score statistics. Missing counts normalize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounts {
  pub points:    i64,
  pub rebounds:  i64,
  pub assists:   i64,
  pub steals:    i64,
  pub blocks:    i64,
  pub turnovers: i64,
  pub fgm:       i64,
  pub fga:       i64,
  pub fg3m:      i64,
  pub fg3a:      i64,
  pub ftm:       i64,
  pub fta:       i64,
}

// ─── Reference entity ────────────────────────────────────────────────────────

/// A franchise. Never deleted; every sighting overwrites its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
  pub team_id:      TeamId,
  pub full_name:    String,
  pub abbreviation: String,
  pub nickname:     Option<String>,
  pub city:         Option<String>,
  pub state:        Option<String>,
  pub year_founded: Option<i32>,
}

// ─── Subject entity ──────────────────────────────────────────────────────────

/// Biographical attributes. Upserts keep the stored value when the incoming
/// value is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerBio {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub birthdate:  Option<NaiveDate>,
  pub college:    Option<String>,
  pub country:    Option<String>,
  pub height:     Option<String>,
  pub weight:     Option<i32>,
  pub position:   Option<String>,
  pub jersey:     Option<String>,
  pub draft_year: Option<i32>,
  pub from_year:  Option<i32>,
  pub to_year:    Option<i32>,
}

/// A player. `full_name` and `team_id` are roster fields and always
/// overwrite; `is_active` and the [`PlayerBio`] fields merge on null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
  pub player_id: PlayerId,
  pub full_name: String,
  pub is_active: Option<bool>,
  pub team_id:   Option<TeamId>,
  pub bio:       PlayerBio,
}

// ─── Event record ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
  pub game_id:         GameId,
  pub season_id:       SeasonId,
  pub game_date:       NaiveDate,
  pub home_team_id:    TeamId,
  pub away_team_id:    TeamId,
  pub home_team_score: Option<i32>,
  pub away_team_score: Option<i32>,
}

// ─── Observation records ─────────────────────────────────────────────────────

/// One player's line in one game, keyed by `(game_id, player_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatLine {
  pub game_id:    GameId,
  pub player_id:  PlayerId,
  pub team_id:    TeamId,
  pub season_id:  SeasonId,
  pub minutes:    f64,
  pub counts:     StatCounts,
  pub shooting:   Shooting,
  pub plus_minus: Option<i32>,
}

/// One player's aggregated season, keyed by `(player_id, season_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStatLine {
  pub player_id:     PlayerId,
  pub season_id:     SeasonId,
  /// `None` for the aggregate row of a player who changed teams mid-season.
  pub team_id:       Option<TeamId>,
  pub games_played:  i32,
  pub games_started: i32,
  pub minutes:       f64,
  pub counts:        StatCounts,
  pub shooting:      Shooting,
}

// ─── Market reference data ───────────────────────────────────────────────────

/// League salary thresholds for a season, in whole dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryCap {
  pub season_id:      SeasonId,
  pub salary_cap:     i64,
  pub luxury_tax:     Option<i64>,
  pub first_apron:    Option<i64>,
  pub second_apron:   Option<i64>,
  pub minimum_salary: Option<i64>,
}

/// A player's compensation for a season, keyed by `(player_id, season_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
  pub player_id: PlayerId,
  pub season_id: SeasonId,
  pub salary:    i64,
  pub team_id:   Option<TeamId>,
}

// ─── Derived metric ──────────────────────────────────────────────────────────

/// Value analysis for `(player_id, season_id)`; recomputed in full on every
/// metrics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAnalysis {
  pub player_id:             PlayerId,
  pub season_id:             SeasonId,
  pub salary:                i64,
  pub total_improvement:     f64,
  pub value_per_dollar:      f64,
  pub efficiency_rating:     f64,
  pub cost_efficiency_score: f64,
  pub value_vs_average:      f64,
  pub computed_at:           DateTime<Utc>,
}

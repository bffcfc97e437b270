//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, seasons
//! are their `YYYY-YY` label, and percentages are fractions in `[0, 1]`.

use chrono::{DateTime, NaiveDate, Utc};
use courtside_core::{
  entity::{Pct, Player, PlayerBio, Shooting, StatCounts},
  metrics::{PerGameRates, ValueInput},
  season::SeasonId,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_season(s: &SeasonId) -> String { s.to_string() }

pub fn decode_season(s: &str) -> Result<SeasonId> { Ok(SeasonId::parse(s)?) }

pub fn encode_pct(p: Option<Pct>) -> Option<f64> { p.map(Pct::get) }

pub fn decode_pct(v: Option<f64>) -> Result<Option<Pct>> {
  Ok(v.map(Pct::new).transpose()?)
}

// ─── Stat groups ─────────────────────────────────────────────────────────────

/// Counting stats in column order: points, rebounds, assists, steals,
/// blocks, turnovers, fgm, fga, fg3m, fg3a, ftm, fta.
pub fn encode_counts(c: &StatCounts) -> [i64; 12] {
  [
    c.points, c.rebounds, c.assists, c.steals, c.blocks, c.turnovers, c.fgm,
    c.fga, c.fg3m, c.fg3a, c.ftm, c.fta,
  ]
}

pub fn encode_shooting(s: &Shooting) -> [Option<f64>; 3] {
  [encode_pct(s.fg_pct), encode_pct(s.fg3_pct), encode_pct(s.ft_pct)]
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `players` row as read from SQLite, before decoding.
pub struct RawPlayer {
  pub player_id:  i64,
  pub full_name:  String,
  pub is_active:  Option<bool>,
  pub team_id:    Option<i64>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub birthdate:  Option<String>,
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

impl RawPlayer {
  pub const COLUMNS: &'static str = "player_id, full_name, is_active, team_id, \
     first_name, last_name, birthdate, college, country, height, weight, \
     position, jersey, draft_year, from_year, to_year";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:  row.get(0)?,
      full_name:  row.get(1)?,
      is_active:  row.get(2)?,
      team_id:    row.get(3)?,
      first_name: row.get(4)?,
      last_name:  row.get(5)?,
      birthdate:  row.get(6)?,
      college:    row.get(7)?,
      country:    row.get(8)?,
      height:     row.get(9)?,
      weight:     row.get(10)?,
      position:   row.get(11)?,
      jersey:     row.get(12)?,
      draft_year: row.get(13)?,
      from_year:  row.get(14)?,
      to_year:    row.get(15)?,
    })
  }

  pub fn into_player(self) -> Result<Player> {
    Ok(Player {
      player_id: self.player_id,
      full_name: self.full_name,
      is_active: self.is_active,
      team_id:   self.team_id,
      bio:       PlayerBio {
        first_name: self.first_name,
        last_name:  self.last_name,
        birthdate:  self.birthdate.as_deref().map(decode_date).transpose()?,
        college:    self.college,
        country:    self.country,
        height:     self.height,
        weight:     self.weight,
        position:   self.position,
        jersey:     self.jersey,
        draft_year: self.draft_year,
        from_year:  self.from_year,
        to_year:    self.to_year,
      },
    })
  }
}

/// One joined season-stats / contract / position row.
pub struct RawValueInput {
  pub player_id:    i64,
  pub season_id:    String,
  pub position:     Option<String>,
  pub games_played: i32,
  pub totals:       StatCounts,
  pub fg_pct:       Option<f64>,
  pub fg3_pct:      Option<f64>,
  pub ft_pct:       Option<f64>,
  pub salary:       Option<i64>,
}

impl RawValueInput {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:    row.get(0)?,
      season_id:    row.get(1)?,
      position:     row.get(2)?,
      games_played: row.get(3)?,
      totals:       StatCounts {
        points:    row.get(4)?,
        rebounds:  row.get(5)?,
        assists:   row.get(6)?,
        steals:    row.get(7)?,
        blocks:    row.get(8)?,
        turnovers: row.get(9)?,
        ..StatCounts::default()
      },
      fg_pct:       row.get(10)?,
      fg3_pct:      row.get(11)?,
      ft_pct:       row.get(12)?,
      salary:       row.get(13)?,
    })
  }

  pub fn into_value_input(self) -> Result<ValueInput> {
    Ok(ValueInput {
      player_id:    self.player_id,
      season_id:    decode_season(&self.season_id)?,
      position:     self.position,
      games_played: self.games_played,
      rates:        PerGameRates::from_totals(&self.totals, self.games_played),
      shooting:     Shooting {
        fg_pct:  decode_pct(self.fg_pct)?,
        fg3_pct: decode_pct(self.fg3_pct)?,
        ft_pct:  decode_pct(self.ft_pct)?,
      },
      salary:       self.salary,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_round_trip_in_iso_form() {
    let d = NaiveDate::from_ymd_opt(1984, 12, 30).unwrap();
    assert_eq!(encode_date(d), "1984-12-30");
    assert_eq!(decode_date("1984-12-30").unwrap(), d);
    assert!(decode_date("Dec 30, 1984").is_err());
  }

  #[test]
  fn stored_percentages_are_range_checked() {
    assert!(decode_pct(Some(0.5)).unwrap().is_some());
    assert!(decode_pct(None).unwrap().is_none());
    assert!(matches!(decode_pct(Some(45.0)), Err(Error::Core(_))));
  }
}

//! Stage-tagged records.
//!
//! Data moves through three shapes before it is persisted:
//!
//! ```text
//! RawRecord ──normalize──▶ *Record (references unresolved)
//!                            └──resolve──▶ entity::* (references checked)
//! ```
//!
//! Only the resolved entity types are accepted by [`crate::store::StatsStore`],
//! so a record with a dangling reference cannot reach the persistence layer.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  entity::{GameId, PlayerBio, PlayerId, Shooting, StatCounts, TeamId},
  season::SeasonId,
};

// ─── Raw ─────────────────────────────────────────────────────────────────────

/// One row exactly as the upstream source returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
  pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }

  /// A compact rendering of the identifier-like fields (those whose name
  /// ends in `ID` or equals `MATCHUP`/`PLAYER`), for diagnostics.
  pub fn identifiers(&self) -> String {
    let parts: Vec<String> = self
      .0
      .iter()
      .filter(|(k, _)| {
        let upper = k.to_ascii_uppercase();
        upper.ends_with("ID") || upper == "MATCHUP" || upper == "PLAYER"
      })
      .map(|(k, v)| format!("{k}={v}"))
      .collect();
    if parts.is_empty() {
      "<no identifiers>".to_string()
    } else {
      parts.join(" ")
    }
  }
}

impl From<Map<String, Value>> for RawRecord {
  fn from(map: Map<String, Value>) -> Self { Self(map) }
}

// ─── Unresolved references ───────────────────────────────────────────────────

/// A reference to a team as it appeared upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TeamRef {
  Id(TeamId),
  Abbreviation(String),
}

impl fmt::Display for TeamRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(id) => write!(f, "team #{id}"),
      Self::Abbreviation(abbr) => write!(f, "team {abbr:?}"),
    }
  }
}

/// A reference to a player as it appeared upstream. Secondary web sources
/// often carry only a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlayerRef {
  Id(PlayerId),
  Name(String),
}

impl fmt::Display for PlayerRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(id) => write!(f, "player #{id}"),
      Self::Name(name) => write!(f, "player {name:?}"),
    }
  }
}

// ─── Normalized ──────────────────────────────────────────────────────────────

/// A player sighting with its current-team reference still unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
  pub player_id: PlayerId,
  pub full_name: String,
  pub is_active: Option<bool>,
  pub team:      Option<TeamRef>,
  pub bio:       PlayerBio,
}

/// One team's view of one game, taken from a team game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRecord {
  pub game_id:        GameId,
  pub season_id:      SeasonId,
  pub game_date:      NaiveDate,
  pub team:           TeamRef,
  pub opponent:       TeamRef,
  pub is_home:        bool,
  pub team_score:     Option<i32>,
  pub opponent_score: Option<i32>,
}

/// One player's line from a player game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameRecord {
  pub game_id:    GameId,
  pub player_id:  PlayerId,
  pub season_id:  SeasonId,
  pub team:       TeamRef,
  pub minutes:    f64,
  pub counts:     StatCounts,
  pub shooting:   Shooting,
  pub plus_minus: Option<i32>,
}

/// One row of a career-stats response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStatRecord {
  pub player_id:     PlayerId,
  pub season_id:     SeasonId,
  pub team:          Option<TeamRef>,
  /// The provider's `TOT` row for a player who played for several teams.
  pub is_aggregate:  bool,
  pub games_played:  i32,
  pub games_started: i32,
  pub minutes:       f64,
  pub counts:        StatCounts,
  pub shooting:      Shooting,
}

/// A salary row from the secondary market source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
  pub player:    PlayerRef,
  pub season_id: SeasonId,
  pub salary:    i64,
  pub team:      Option<TeamRef>,
}

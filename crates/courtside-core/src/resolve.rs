//! Reference resolution against a snapshot of persisted rows.
//!
//! A [`ReferenceSet`] is loaded once per page of upstream records (see
//! [`crate::store::StatsStore::reference_snapshot`]) and every record on the
//! page is resolved against it. A record whose reference is missing is
//! rejected as a whole; nothing of it reaches the store.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use thiserror::Error;

use crate::{
  entity::{
    Contract, Game, GameId, GameStatLine, Player, PlayerId, SeasonStatLine,
    TeamId,
  },
  record::{
    ContractRecord, PlayerGameRecord, PlayerRecord, PlayerRef, SeasonStatRecord,
    TeamGameRecord, TeamRef,
  },
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The persisted reference rows a record may point at.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
  teams:        HashMap<TeamId, String>,
  team_abbrs:   HashMap<String, TeamId>,
  players:      HashSet<PlayerId>,
  player_names: HashMap<String, Vec<PlayerId>>,
  games:        HashSet<GameId>,
}

impl ReferenceSet {
  pub fn new() -> Self { Self::default() }

  pub fn add_team(&mut self, team_id: TeamId, abbreviation: &str) {
    let abbr = abbreviation.trim().to_ascii_uppercase();
    self.team_abbrs.insert(abbr.clone(), team_id);
    self.teams.insert(team_id, abbr);
  }

  pub fn add_player(&mut self, player_id: PlayerId, full_name: &str) {
    if self.players.insert(player_id) {
      self
        .player_names
        .entry(name_key(full_name))
        .or_default()
        .push(player_id);
    }
  }

  pub fn add_game(&mut self, game_id: impl Into<GameId>) {
    self.games.insert(game_id.into());
  }

  pub fn team_count(&self) -> usize { self.teams.len() }

  pub fn player_count(&self) -> usize { self.players.len() }

  pub fn game_count(&self) -> usize { self.games.len() }

  pub fn has_player(&self, player_id: PlayerId) -> bool {
    self.players.contains(&player_id)
  }

  pub fn has_game(&self, game_id: &str) -> bool { self.games.contains(game_id) }

  /// Look up a team by id or abbreviation.
  pub fn team(&self, team: &TeamRef) -> Option<TeamId> {
    match team {
      TeamRef::Id(id) => self.teams.contains_key(id).then_some(*id),
      TeamRef::Abbreviation(abbr) => self
        .team_abbrs
        .get(&abbr.trim().to_ascii_uppercase())
        .copied(),
    }
  }

  /// Look up a player by id or by name. Names that match more than one
  /// player yield [`RejectReason::AmbiguousPlayer`].
  pub fn player(&self, player: &PlayerRef) -> Result<PlayerId, RejectReason> {
    match player {
      PlayerRef::Id(id) if self.players.contains(id) => Ok(*id),
      PlayerRef::Id(_) => Err(RejectReason::UnknownPlayer),
      PlayerRef::Name(name) => match self.player_names.get(&name_key(name)) {
        Some(ids) if ids.len() == 1 => Ok(ids[0]),
        Some(_) => Err(RejectReason::AmbiguousPlayer),
        None => Err(RejectReason::UnknownPlayer),
      },
    }
  }
}

/// Case- and punctuation-insensitive key for matching display names.
pub fn name_key(name: &str) -> String {
  name
    .split_whitespace()
    .map(|word| {
      word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect::<String>()
    })
    .filter(|w| !w.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

// ─── Rejection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
  UnknownTeam,
  UnknownPlayer,
  AmbiguousPlayer,
  UnknownGame,
  /// Both sides of a game resolved to the same team.
  SelfMatchup,
}

impl fmt::Display for RejectReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::UnknownTeam => "unknown team",
      Self::UnknownPlayer => "unknown player",
      Self::AmbiguousPlayer => "ambiguous player name",
      Self::UnknownGame => "unknown game",
      Self::SelfMatchup => "team plays itself",
    })
  }
}

/// A record that could not be resolved, with the offending key and the
/// owning record's identifiers for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} {key} in {record}")]
pub struct Rejection {
  pub reason: RejectReason,
  pub key:    String,
  pub record: String,
}

impl Rejection {
  fn new(reason: RejectReason, key: impl fmt::Display, record: String) -> Self {
    Self { reason, key: key.to_string(), record }
  }
}

// ─── Resolve ─────────────────────────────────────────────────────────────────

/// A normalized record that can be checked against a [`ReferenceSet`].
pub trait Resolve {
  type Resolved;

  fn resolve(self, refs: &ReferenceSet) -> Result<Self::Resolved, Rejection>;
}

/// Resolve `record` against `refs`.
pub fn resolve<R: Resolve>(
  record: R,
  refs: &ReferenceSet,
) -> Result<R::Resolved, Rejection> {
  record.resolve(refs)
}

fn require_team(
  refs: &ReferenceSet,
  team: &TeamRef,
  record: impl FnOnce() -> String,
) -> Result<TeamId, Rejection> {
  refs
    .team(team)
    .ok_or_else(|| Rejection::new(RejectReason::UnknownTeam, team, record()))
}

impl Resolve for PlayerRecord {
  type Resolved = Player;

  fn resolve(self, refs: &ReferenceSet) -> Result<Player, Rejection> {
    let team_id = match &self.team {
      Some(team) => {
        Some(require_team(refs, team, || format!("player #{}", self.player_id))?)
      }
      None => None,
    };
    Ok(Player {
      player_id: self.player_id,
      full_name: self.full_name,
      is_active: self.is_active,
      team_id,
      bio: self.bio,
    })
  }
}

impl Resolve for TeamGameRecord {
  type Resolved = Game;

  fn resolve(self, refs: &ReferenceSet) -> Result<Game, Rejection> {
    let record = || format!("game {}", self.game_id);
    let team_id = require_team(refs, &self.team, record)?;
    let opponent_id = require_team(refs, &self.opponent, record)?;
    if team_id == opponent_id {
      return Err(Rejection::new(RejectReason::SelfMatchup, &self.opponent, record()));
    }

    let (home_team_id, away_team_id, home_team_score, away_team_score) =
      if self.is_home {
        (team_id, opponent_id, self.team_score, self.opponent_score)
      } else {
        (opponent_id, team_id, self.opponent_score, self.team_score)
      };

    Ok(Game {
      game_id: self.game_id,
      season_id: self.season_id,
      game_date: self.game_date,
      home_team_id,
      away_team_id,
      home_team_score,
      away_team_score,
    })
  }
}

impl Resolve for PlayerGameRecord {
  type Resolved = GameStatLine;

  fn resolve(self, refs: &ReferenceSet) -> Result<GameStatLine, Rejection> {
    let record = || format!("game {} player #{}", self.game_id, self.player_id);
    if !refs.has_player(self.player_id) {
      return Err(Rejection::new(
        RejectReason::UnknownPlayer,
        PlayerRef::Id(self.player_id),
        record(),
      ));
    }
    if !refs.has_game(&self.game_id) {
      return Err(Rejection::new(RejectReason::UnknownGame, &self.game_id, record()));
    }
    let team_id = require_team(refs, &self.team, record)?;

    Ok(GameStatLine {
      game_id: self.game_id,
      player_id: self.player_id,
      team_id,
      season_id: self.season_id,
      minutes: self.minutes,
      counts: self.counts,
      shooting: self.shooting,
      plus_minus: self.plus_minus,
    })
  }
}

impl Resolve for SeasonStatRecord {
  type Resolved = SeasonStatLine;

  fn resolve(self, refs: &ReferenceSet) -> Result<SeasonStatLine, Rejection> {
    let record = || format!("season {} player #{}", self.season_id, self.player_id);
    if !refs.has_player(self.player_id) {
      return Err(Rejection::new(
        RejectReason::UnknownPlayer,
        PlayerRef::Id(self.player_id),
        record(),
      ));
    }
    let team_id = match &self.team {
      Some(team) => Some(require_team(refs, team, record)?),
      None => None,
    };

    Ok(SeasonStatLine {
      player_id: self.player_id,
      season_id: self.season_id,
      team_id,
      games_played: self.games_played,
      games_started: self.games_started,
      minutes: self.minutes,
      counts: self.counts,
      shooting: self.shooting,
    })
  }
}

impl Resolve for ContractRecord {
  type Resolved = Contract;

  fn resolve(self, refs: &ReferenceSet) -> Result<Contract, Rejection> {
    let record = || format!("contract {} {}", self.season_id, self.player);
    let player_id = refs
      .player(&self.player)
      .map_err(|reason| Rejection::new(reason, &self.player, record()))?;
    let team_id = match &self.team {
      Some(team) => Some(require_team(refs, team, record)?),
      None => None,
    };

    Ok(Contract {
      player_id,
      season_id: self.season_id,
      salary: self.salary,
      team_id,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    entity::{PlayerBio, Shooting, StatCounts},
    season::SeasonId,
  };

  fn refs() -> ReferenceSet {
    let mut refs = ReferenceSet::new();
    refs.add_team(1610612747, "LAL");
    refs.add_team(1610612738, "BOS");
    refs.add_player(2544, "LeBron James");
    refs.add_player(1628369, "Jayson Tatum");
    refs.add_player(1, "Marcus Morris");
    refs.add_player(2, "Marcus  Morris");
    refs.add_game("0022400001");
    refs
  }

  fn team_game(opponent: &str, is_home: bool) -> TeamGameRecord {
    TeamGameRecord {
      game_id:        "0022400001".into(),
      season_id:      SeasonId::starting(2024),
      game_date:      NaiveDate::from_ymd_opt(2024, 10, 22).unwrap(),
      team:           TeamRef::Id(1610612747),
      opponent:       TeamRef::Abbreviation(opponent.into()),
      is_home,
      team_score:     Some(110),
      opponent_score: Some(102),
    }
  }

  fn stat_line(team: &str) -> PlayerGameRecord {
    PlayerGameRecord {
      game_id:    "0022400001".into(),
      player_id:  2544,
      season_id:  SeasonId::starting(2024),
      team:       TeamRef::Abbreviation(team.into()),
      minutes:    35.0,
      counts:     StatCounts { points: 30, ..StatCounts::default() },
      shooting:   Shooting::default(),
      plus_minus: Some(8),
    }
  }

  #[test]
  fn home_game_keeps_orientation() {
    let game = resolve(team_game("BOS", true), &refs()).unwrap();
    assert_eq!(game.home_team_id, 1610612747);
    assert_eq!(game.away_team_id, 1610612738);
    assert_eq!(game.home_team_score, Some(110));
    assert_eq!(game.away_team_score, Some(102));
  }

  #[test]
  fn away_game_swaps_sides_and_scores() {
    let game = resolve(team_game("bos", false), &refs()).unwrap();
    assert_eq!(game.home_team_id, 1610612738);
    assert_eq!(game.away_team_id, 1610612747);
    assert_eq!(game.home_team_score, Some(102));
    assert_eq!(game.away_team_score, Some(110));
  }

  #[test]
  fn unknown_opponent_is_rejected_with_key_and_record() {
    let err = resolve(team_game("XYZ", true), &refs()).unwrap_err();
    assert_eq!(err.reason, RejectReason::UnknownTeam);
    assert!(err.key.contains("XYZ"));
    assert!(err.record.contains("0022400001"));
  }

  #[test]
  fn self_matchup_is_rejected() {
    let err = resolve(team_game("LAL", true), &refs()).unwrap_err();
    assert_eq!(err.reason, RejectReason::SelfMatchup);
  }

  #[test]
  fn stat_line_resolves_team_abbreviation() {
    let line = resolve(stat_line("LAL"), &refs()).unwrap();
    assert_eq!(line.team_id, 1610612747);
    assert_eq!(line.counts.points, 30);
  }

  #[test]
  fn stat_line_with_absent_team_is_rejected() {
    let err = resolve(stat_line("SEA"), &refs()).unwrap_err();
    assert_eq!(err.reason, RejectReason::UnknownTeam);
  }

  #[test]
  fn stat_line_for_unknown_game_is_rejected() {
    let mut rec = stat_line("LAL");
    rec.game_id = "0022499999".into();
    let err = resolve(rec, &refs()).unwrap_err();
    assert_eq!(err.reason, RejectReason::UnknownGame);
  }

  #[test]
  fn player_with_unknown_team_is_rejected() {
    let rec = PlayerRecord {
      player_id: 99,
      full_name: "Nobody".into(),
      is_active: Some(true),
      team:      Some(TeamRef::Id(42)),
      bio:       PlayerBio::default(),
    };
    assert_eq!(
      resolve(rec, &refs()).unwrap_err().reason,
      RejectReason::UnknownTeam
    );
  }

  #[test]
  fn contract_resolves_by_name_ignoring_case_and_punctuation() {
    let rec = ContractRecord {
      player:    PlayerRef::Name("lebron  JAMES.".into()),
      season_id: SeasonId::starting(2024),
      salary:    48_728_845,
      team:      None,
    };
    assert_eq!(resolve(rec, &refs()).unwrap().player_id, 2544);
  }

  #[test]
  fn ambiguous_name_is_rejected() {
    let rec = ContractRecord {
      player:    PlayerRef::Name("Marcus Morris".into()),
      season_id: SeasonId::starting(2024),
      salary:    1,
      team:      None,
    };
    assert_eq!(
      resolve(rec, &refs()).unwrap_err().reason,
      RejectReason::AmbiguousPlayer
    );
  }

  #[test]
  fn name_key_normalizes() {
    assert_eq!(name_key("  Shai Gilgeous-Alexander "), "shai gilgeousalexander");
    assert_eq!(name_key("D'Angelo Russell"), "dangelo russell");
  }
}

//! Prioritized field-name aliases.
//!
//! Upstream responses spell the same logical field several ways
//! (`GAME_ID`, `Game_ID`, `game_id`, ...). Each canonical [`Field`] lists its
//! accepted spellings in priority order; the first one present with a
//! non-null value wins. Matching is exact, so the table alone decides what is
//! accepted.

use courtside_core::record::RawRecord;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  // ── Teams ───────────────────────────────────────────────────────────────
  TeamId,
  TeamAbbreviation,
  TeamName,
  Nickname,
  City,
  State,
  YearFounded,
  OpponentTeamId,

  // ── Players ─────────────────────────────────────────────────────────────
  PlayerId,
  PlayerName,
  FirstName,
  LastName,
  IsActive,
  Birthdate,
  College,
  Country,
  Height,
  Weight,
  Position,
  Jersey,
  DraftYear,
  FromYear,
  ToYear,

  // ── Games ───────────────────────────────────────────────────────────────
  GameId,
  GameDate,
  SeasonId,
  Matchup,
  OpponentPoints,

  // ── Box score ───────────────────────────────────────────────────────────
  Minutes,
  Points,
  Rebounds,
  Assists,
  Steals,
  Blocks,
  Turnovers,
  FieldGoalsMade,
  FieldGoalsAttempted,
  ThreesMade,
  ThreesAttempted,
  FreeThrowsMade,
  FreeThrowsAttempted,
  FieldGoalPct,
  ThreePct,
  FreeThrowPct,
  PlusMinus,
  GamesPlayed,
  GamesStarted,

  // ── Market ──────────────────────────────────────────────────────────────
  Salary,
  SalaryCap,
  LuxuryTax,
  FirstApron,
  SecondApron,
  MinimumSalary,
}

impl Field {
  /// Canonical name used in diagnostics.
  pub fn name(self) -> &'static str { self.aliases()[0] }

  /// Accepted spellings, highest priority first.
  pub fn aliases(self) -> &'static [&'static str] {
    match self {
      Self::TeamId => &["TEAM_ID", "Team_ID", "team_id", "teamId"],
      Self::TeamAbbreviation => &[
        "TEAM_ABBREVIATION",
        "Team_Abbreviation",
        "team_abbreviation",
        "abbreviation",
        "ABBREVIATION",
      ],
      Self::TeamName => &["TEAM_NAME", "full_name", "FULL_NAME", "teamName"],
      Self::Nickname => &["NICKNAME", "nickname", "TEAM_NICKNAME"],
      Self::City => &["CITY", "city", "TEAM_CITY"],
      Self::State => &["STATE", "state"],
      Self::YearFounded => &["YEAR_FOUNDED", "year_founded", "yearFounded"],
      Self::OpponentTeamId => {
        &["OPPONENT_TEAM_ID", "Opponent_Team_ID", "opponent_team_id"]
      }

      Self::PlayerId => {
        &["PLAYER_ID", "Player_ID", "PERSON_ID", "player_id", "playerId"]
      }
      Self::PlayerName => &[
        "DISPLAY_FIRST_LAST",
        "PLAYER_NAME",
        "Player_Name",
        "player_name",
        "PLAYER",
        "Player",
        "full_name",
      ],
      Self::FirstName => &["FIRST_NAME", "first_name", "firstName"],
      Self::LastName => &["LAST_NAME", "last_name", "lastName"],
      Self::IsActive => &["IS_ACTIVE", "is_active", "ROSTERSTATUS", "isActive"],
      Self::Birthdate => &["BIRTHDATE", "birthdate", "birth_date"],
      Self::College => &["SCHOOL", "COLLEGE", "school", "college"],
      Self::Country => &["COUNTRY", "country"],
      Self::Height => &["HEIGHT", "height"],
      Self::Weight => &["WEIGHT", "weight"],
      Self::Position => &["POSITION", "position", "pos"],
      Self::Jersey => &["JERSEY", "jersey"],
      Self::DraftYear => &["DRAFT_YEAR", "draft_year"],
      Self::FromYear => &["FROM_YEAR", "from_year"],
      Self::ToYear => &["TO_YEAR", "to_year"],

      Self::GameId => &["GAME_ID", "Game_ID", "game_id", "gameId"],
      Self::GameDate => &["GAME_DATE", "Game_Date", "game_date", "gameDate"],
      Self::SeasonId => {
        &["SEASON_ID", "Season_ID", "season_id", "SEASON", "season"]
      }
      Self::Matchup => &["MATCHUP", "Matchup", "matchup"],
      Self::OpponentPoints => &["OPPONENT_PTS", "OPP_PTS", "opponent_pts"],

      Self::Minutes => &["MIN", "Min", "min", "minutes"],
      Self::Points => &["PTS", "pts", "points"],
      Self::Rebounds => &["REB", "reb", "rebounds"],
      Self::Assists => &["AST", "ast", "assists"],
      Self::Steals => &["STL", "stl", "steals"],
      Self::Blocks => &["BLK", "blk", "blocks"],
      Self::Turnovers => &["TOV", "TO", "tov", "turnovers"],
      Self::FieldGoalsMade => &["FGM", "fgm"],
      Self::FieldGoalsAttempted => &["FGA", "fga"],
      Self::ThreesMade => &["FG3M", "fg3m", "3PM"],
      Self::ThreesAttempted => &["FG3A", "fg3a", "3PA"],
      Self::FreeThrowsMade => &["FTM", "ftm"],
      Self::FreeThrowsAttempted => &["FTA", "fta"],
      Self::FieldGoalPct => &["FG_PCT", "fg_pct", "FG%"],
      Self::ThreePct => &["FG3_PCT", "fg3_pct", "3P%"],
      Self::FreeThrowPct => &["FT_PCT", "ft_pct", "FT%"],
      Self::PlusMinus => &["PLUS_MINUS", "plus_minus", "+/-"],
      Self::GamesPlayed => &["GP", "gp", "games_played"],
      Self::GamesStarted => &["GS", "gs", "games_started"],

      Self::Salary => &["SALARY", "Salary", "salary", "amount"],
      Self::SalaryCap => &["SALARY_CAP", "salary_cap", "Salary Cap"],
      Self::LuxuryTax => &["LUXURY_TAX", "luxury_tax", "Luxury Tax"],
      Self::FirstApron => &["FIRST_APRON", "first_apron", "First Apron"],
      Self::SecondApron => &["SECOND_APRON", "second_apron", "Second Apron"],
      Self::MinimumSalary => {
        &["MINIMUM_SALARY", "minimum_salary", "Minimum Salary"]
      }
    }
  }
}

/// The first alias of `field` present in `record` with a non-null value.
pub fn lookup(record: &RawRecord, field: Field) -> Option<&Value> {
  field
    .aliases()
    .iter()
    .filter_map(|alias| record.get(alias))
    .find(|v| !v.is_null())
}

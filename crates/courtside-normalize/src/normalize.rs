//! Per-entity normalizers: one [`RawRecord`] in, one stage-tagged record out.

use std::collections::HashMap;

use courtside_core::{
  entity::{PlayerBio, SalaryCap, Team},
  record::{
    ContractRecord, PlayerGameRecord, PlayerRecord, PlayerRef, RawRecord,
    SeasonStatRecord, TeamGameRecord, TeamRef,
  },
  season::SeasonId,
};

use crate::{Error, Result, alias::Field, fields::Fields, value};

/// Abbreviation the provider uses for a traded player's combined season row.
const AGGREGATE_TEAM: &str = "TOT";

// ─── Matchup ─────────────────────────────────────────────────────────────────

/// A parsed `MATCHUP` string: `"LAL vs. BOS"` (home) or `"LAL @ BOS"` (away).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
  pub team:     String,
  pub opponent: String,
  pub is_home:  bool,
}

pub fn parse_matchup(s: &str) -> Option<Matchup> {
  let tokens: Vec<&str> = s.split_whitespace().collect();
  let [team, sep, opponent] = tokens.as_slice() else { return None };
  let is_home = match sep.to_ascii_lowercase().as_str() {
    "vs." | "vs" => true,
    "@" | "at" => false,
    _ => return None,
  };
  Some(Matchup {
    team: team.to_ascii_uppercase(),
    opponent: opponent.to_ascii_uppercase(),
    is_home,
  })
}

fn matchup(f: &Fields<'_>) -> Result<Option<Matchup>> {
  let Some(text) = f.text(Field::Matchup) else { return Ok(None) };
  parse_matchup(&text).map(Some).ok_or_else(|| Error::InvalidValue {
    field:  Field::Matchup.name(),
    value:  text,
    record: f.raw().identifiers(),
  })
}

// ─── References ──────────────────────────────────────────────────────────────

/// The record's team reference. A team id of `0` means "no team" and does not
/// fall through to the abbreviation.
fn team_ref(f: &Fields<'_>) -> Result<Option<TeamRef>> {
  if let Some(id) = f.optional_int(Field::TeamId)? {
    return Ok((id != 0).then_some(TeamRef::Id(id)));
  }
  Ok(
    f.text(Field::TeamAbbreviation)
      .map(|abbr| TeamRef::Abbreviation(abbr.to_ascii_uppercase())),
  )
}

/// `field`, or the bare `id` key the static team and player lists use.
fn entity_id(f: &Fields<'_>, field: Field) -> Result<i64> {
  if let Some(id) = f.optional_int(field)? {
    return Ok(id);
  }
  f.raw()
    .get("id")
    .and_then(value::integer)
    .ok_or_else(|| Error::MissingField {
      field:  field.name(),
      record: f.raw().identifiers(),
    })
}

// ─── Teams ───────────────────────────────────────────────────────────────────

pub fn normalize_team(raw: &RawRecord) -> Result<Team> {
  let f = Fields::new(raw);
  let team_id = entity_id(&f, Field::TeamId)?;

  Ok(Team {
    team_id,
    full_name: f.required_text(Field::TeamName)?,
    abbreviation: f.required_text(Field::TeamAbbreviation)?.to_ascii_uppercase(),
    nickname: f.text(Field::Nickname),
    city: f.text(Field::City),
    state: f.text(Field::State),
    year_founded: f.optional_i32(Field::YearFounded)?,
  })
}

// ─── Players ─────────────────────────────────────────────────────────────────

pub fn normalize_player(raw: &RawRecord) -> Result<PlayerRecord> {
  let f = Fields::new(raw);
  let player_id = entity_id(&f, Field::PlayerId)?;

  let first_name = f.text(Field::FirstName);
  let last_name = f.text(Field::LastName);
  let full_name = match f.text(Field::PlayerName) {
    Some(name) => name,
    None => match (&first_name, &last_name) {
      (Some(first), Some(last)) => format!("{first} {last}"),
      (Some(only), None) | (None, Some(only)) => only.clone(),
      (None, None) => {
        return Err(Error::MissingField {
          field:  Field::PlayerName.name(),
          record: raw.identifiers(),
        });
      }
    },
  };

  let bio = PlayerBio {
    first_name,
    last_name,
    birthdate: f.optional_date(Field::Birthdate)?,
    college: f.text(Field::College),
    country: f.text(Field::Country),
    height: f.text(Field::Height),
    weight: f.loose_i32(Field::Weight),
    position: f.text(Field::Position),
    jersey: f.text(Field::Jersey),
    draft_year: f.loose_i32(Field::DraftYear),
    from_year: f.loose_i32(Field::FromYear),
    to_year: f.loose_i32(Field::ToYear),
  };

  Ok(PlayerRecord {
    player_id,
    full_name,
    is_active: f.optional_bool(Field::IsActive)?,
    team: team_ref(&f)?,
    bio,
  })
}

// ─── Games ───────────────────────────────────────────────────────────────────

/// One row of a team game log. `season` is used when the row carries no
/// season of its own.
pub fn normalize_team_game(
  raw: &RawRecord,
  season: &SeasonId,
) -> Result<TeamGameRecord> {
  let f = Fields::new(raw);
  let game_id = f.required_text(Field::GameId)?;
  let game_date = f.required_date(Field::GameDate)?;
  let matchup = matchup(&f)?.ok_or_else(|| Error::MissingField {
    field:  Field::Matchup.name(),
    record: raw.identifiers(),
  })?;

  let team = team_ref(&f)?.unwrap_or(TeamRef::Abbreviation(matchup.team));
  let opponent = match f.optional_int(Field::OpponentTeamId)? {
    Some(id) if id != 0 => TeamRef::Id(id),
    _ => TeamRef::Abbreviation(matchup.opponent),
  };

  let team_score = f.optional_i32(Field::Points)?;
  // A margin that cannot be subtracted leaves the opponent score unknown.
  let opponent_score = match f.optional_i32(Field::OpponentPoints)? {
    Some(pts) => Some(pts),
    None => match (team_score, f.optional_i32(Field::PlusMinus)?) {
      (Some(pts), Some(margin)) => pts.checked_sub(margin),
      _ => None,
    },
  };

  Ok(TeamGameRecord {
    game_id,
    season_id: f.season_or(season)?,
    game_date,
    team,
    opponent,
    is_home: matchup.is_home,
    team_score,
    opponent_score,
  })
}

// ─── Observations ────────────────────────────────────────────────────────────

/// One row of a player game log. The team comes from `TEAM_ID`, then
/// `TEAM_ABBREVIATION`, then the first token of `MATCHUP`.
pub fn normalize_player_game(
  raw: &RawRecord,
  season: &SeasonId,
) -> Result<PlayerGameRecord> {
  let f = Fields::new(raw);
  let game_id = f.required_text(Field::GameId)?;
  let player_id = f.required_id(Field::PlayerId)?;

  let team = match team_ref(&f)? {
    Some(team) => team,
    None => match matchup(&f)? {
      Some(m) => TeamRef::Abbreviation(m.team),
      None => {
        return Err(Error::MissingField {
          field:  Field::TeamId.name(),
          record: raw.identifiers(),
        });
      }
    },
  };

  Ok(PlayerGameRecord {
    game_id,
    player_id,
    season_id: f.season_or(season)?,
    team,
    minutes: f.minutes()?,
    counts: f.counts()?,
    shooting: f.shooting()?,
    plus_minus: f.optional_i32(Field::PlusMinus)?,
  })
}

/// One row of a career-stats response. Season is mandatory here: career rows
/// span many seasons.
pub fn normalize_season_stat(raw: &RawRecord) -> Result<SeasonStatRecord> {
  let f = Fields::new(raw);
  let player_id = f.required_id(Field::PlayerId)?;
  let season_id = f.optional_season()?.ok_or_else(|| Error::MissingField {
    field:  Field::SeasonId.name(),
    record: raw.identifiers(),
  })?;

  let is_aggregate = f
    .text(Field::TeamAbbreviation)
    .is_some_and(|abbr| abbr.eq_ignore_ascii_case(AGGREGATE_TEAM));
  let team = if is_aggregate { None } else { team_ref(&f)? };

  Ok(SeasonStatRecord {
    player_id,
    season_id,
    team,
    is_aggregate,
    games_played: f.optional_i32(Field::GamesPlayed)?.unwrap_or(0),
    games_started: f.optional_i32(Field::GamesStarted)?.unwrap_or(0),
    minutes: f.minutes()?,
    counts: f.counts()?,
    shooting: f.shooting()?,
  })
}

/// Keep one row per `(player, season)`: the aggregate row when there is one,
/// otherwise the row with the most games played. Input order is preserved
/// for the survivors.
pub fn prefer_aggregate(rows: Vec<SeasonStatRecord>) -> Vec<SeasonStatRecord> {
  let mut best: HashMap<(i64, SeasonId), usize> = HashMap::new();
  for (i, row) in rows.iter().enumerate() {
    let key = (row.player_id, row.season_id.clone());
    match best.get(&key) {
      Some(&j) => {
        let held = &rows[j];
        let better = (row.is_aggregate && !held.is_aggregate)
          || (row.is_aggregate == held.is_aggregate
            && row.games_played > held.games_played);
        if better {
          best.insert(key, i);
        }
      }
      None => {
        best.insert(key, i);
      }
    }
  }

  let mut keep: Vec<usize> = best.into_values().collect();
  keep.sort_unstable();
  let mut rows: Vec<Option<SeasonStatRecord>> = rows.into_iter().map(Some).collect();
  keep.into_iter().filter_map(|i| rows[i].take()).collect()
}

// ─── Market ──────────────────────────────────────────────────────────────────

pub fn normalize_salary_cap(raw: &RawRecord, season: &SeasonId) -> Result<SalaryCap> {
  let f = Fields::new(raw);
  Ok(SalaryCap {
    season_id:      f.season_or(season)?,
    salary_cap:     f.required_money(Field::SalaryCap)?,
    luxury_tax:     f.optional_money(Field::LuxuryTax)?,
    first_apron:    f.optional_money(Field::FirstApron)?,
    second_apron:   f.optional_money(Field::SecondApron)?,
    minimum_salary: f.optional_money(Field::MinimumSalary)?,
  })
}

/// A contract row. Web sources often identify the player by name only; the
/// name is resolved later against the player snapshot.
pub fn normalize_contract(raw: &RawRecord, season: &SeasonId) -> Result<ContractRecord> {
  let f = Fields::new(raw);
  let player = match f.optional_int(Field::PlayerId)? {
    Some(id) => PlayerRef::Id(id),
    None => f
      .text(Field::PlayerName)
      .map(PlayerRef::Name)
      .ok_or_else(|| Error::MissingField {
        field:  Field::PlayerId.name(),
        record: raw.identifiers(),
      })?,
  };

  Ok(ContractRecord {
    player,
    season_id: f.season_or(season)?,
    salary: f.required_money(Field::Salary)?,
    team: team_ref(&f)?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use serde_json::{Value, json};

  use super::*;

  fn record(v: Value) -> RawRecord {
    let Value::Object(map) = v else { panic!("object expected") };
    RawRecord::from(map)
  }

  fn season() -> SeasonId { SeasonId::starting(2024) }

  #[test]
  fn matchup_forms() {
    assert_eq!(
      parse_matchup("LAL vs. BOS"),
      Some(Matchup { team: "LAL".into(), opponent: "BOS".into(), is_home: true })
    );
    assert_eq!(
      parse_matchup("LAL @ BOS"),
      Some(Matchup { team: "LAL".into(), opponent: "BOS".into(), is_home: false })
    );
    assert_eq!(parse_matchup("LAL BOS"), None);
    assert_eq!(parse_matchup(""), None);
  }

  #[test]
  fn static_team_row() {
    let raw = record(json!({
      "id": 1610612747,
      "full_name": "Los Angeles Lakers",
      "abbreviation": "LAL",
      "nickname": "Lakers",
      "city": "Los Angeles",
      "state": "California",
      "year_founded": 1948
    }));
    let team = normalize_team(&raw).unwrap();
    assert_eq!(team.team_id, 1610612747);
    assert_eq!(team.abbreviation, "LAL");
    assert_eq!(team.year_founded, Some(1948));
  }

  #[test]
  fn player_detail_row() {
    let raw = record(json!({
      "PERSON_ID": 2544,
      "FIRST_NAME": "LeBron",
      "LAST_NAME": "James",
      "DISPLAY_FIRST_LAST": "LeBron James",
      "BIRTHDATE": "1984-12-30T00:00:00",
      "SCHOOL": "St. Vincent-St. Mary HS (OH)",
      "WEIGHT": "250",
      "DRAFT_YEAR": "2003",
      "ROSTERSTATUS": "Active",
      "TEAM_ID": 1610612747
    }));
    let player = normalize_player(&raw).unwrap();
    assert_eq!(player.full_name, "LeBron James");
    assert_eq!(player.is_active, Some(true));
    assert_eq!(player.team, Some(TeamRef::Id(1610612747)));
    assert_eq!(player.bio.birthdate, NaiveDate::from_ymd_opt(1984, 12, 30));
    assert_eq!(player.bio.weight, Some(250));
    assert_eq!(player.bio.draft_year, Some(2003));
  }

  #[test]
  fn team_id_zero_means_no_team() {
    let raw = record(json!({
      "PERSON_ID": 76001,
      "DISPLAY_FIRST_LAST": "Alaa Abdelnaby",
      "TEAM_ID": 0,
      "TEAM_ABBREVIATION": ""
    }));
    assert_eq!(normalize_player(&raw).unwrap().team, None);
  }

  #[test]
  fn undrafted_is_absent_not_an_error() {
    let raw = record(json!({
      "PERSON_ID": 1,
      "DISPLAY_FIRST_LAST": "A Player",
      "DRAFT_YEAR": "Undrafted",
      "WEIGHT": ""
    }));
    let player = normalize_player(&raw).unwrap();
    assert_eq!(player.bio.draft_year, None);
    assert_eq!(player.bio.weight, None);
  }

  #[test]
  fn home_team_game() {
    let raw = record(json!({
      "Team_ID": 1610612747,
      "Game_ID": "0022400001",
      "GAME_DATE": "OCT 22, 2024",
      "MATCHUP": "LAL vs. MIN",
      "PTS": 110,
      "PLUS_MINUS": 7
    }));
    let game = normalize_team_game(&raw, &season()).unwrap();
    assert!(game.is_home);
    assert_eq!(game.team, TeamRef::Id(1610612747));
    assert_eq!(game.opponent, TeamRef::Abbreviation("MIN".into()));
    assert_eq!(game.team_score, Some(110));
    assert_eq!(game.opponent_score, Some(103));
    assert_eq!(game.game_date, NaiveDate::from_ymd_opt(2024, 10, 22).unwrap());
  }

  #[test]
  fn explicit_opponent_points_win() {
    let raw = record(json!({
      "GAME_ID": "1",
      "GAME_DATE": "2025-01-01",
      "MATCHUP": "BOS @ NYK",
      "PTS": 100,
      "PLUS_MINUS": 3,
      "OPPONENT_PTS": 95
    }));
    let game = normalize_team_game(&raw, &season()).unwrap();
    assert!(!game.is_home);
    assert_eq!(game.team, TeamRef::Abbreviation("BOS".into()));
    assert_eq!(game.opponent_score, Some(95));
  }

  #[test]
  fn out_of_range_margin_leaves_opponent_score_unknown() {
    let raw = record(json!({
      "GAME_ID": "1",
      "GAME_DATE": "2025-01-01",
      "MATCHUP": "BOS vs. NYK",
      "PTS": i32::MIN,
      "PLUS_MINUS": 1
    }));
    let game = normalize_team_game(&raw, &season()).unwrap();
    assert_eq!(game.team_score, Some(i32::MIN));
    assert_eq!(game.opponent_score, None);
  }

  #[test]
  fn unparseable_game_date_rejects_row() {
    let raw = record(json!({
      "GAME_ID": "1",
      "GAME_DATE": "13/45/2025",
      "MATCHUP": "BOS @ NYK"
    }));
    assert!(matches!(
      normalize_team_game(&raw, &season()),
      Err(Error::InvalidDate { .. })
    ));
  }

  #[test]
  fn player_game_takes_team_from_matchup() {
    let raw = record(json!({
      "SEASON_ID": "22024",
      "Player_ID": 2544,
      "Game_ID": "0022400001",
      "MATCHUP": "LAL vs. MIN",
      "MIN": "35:30",
      "PTS": 16,
      "FG_PCT": 0.5,
      "FG3_PCT": null,
      "PLUS_MINUS": 7
    }));
    let line = normalize_player_game(&raw, &SeasonId::starting(2023)).unwrap();
    assert_eq!(line.team, TeamRef::Abbreviation("LAL".into()));
    assert_eq!(line.season_id, SeasonId::starting(2024));
    assert_eq!(line.minutes, 35.5);
    assert_eq!(line.counts.points, 16);
    assert_eq!(line.counts.rebounds, 0);
    assert_eq!(line.shooting.fg3_pct, None);
  }

  fn season_row(team: &str, gp: i32) -> RawRecord {
    let team_id = if team == "TOT" { 0 } else { 10 };
    record(json!({
      "PLAYER_ID": 1,
      "SEASON_ID": "2024-25",
      "TEAM_ID": team_id,
      "TEAM_ABBREVIATION": team,
      "GP": gp,
      "MIN": 1000.0,
      "PTS": 500
    }))
  }

  #[test]
  fn aggregate_row_is_preferred() {
    let rows: Vec<_> = [season_row("LAL", 20), season_row("TOT", 50), season_row("BOS", 30)]
      .iter()
      .map(|r| normalize_season_stat(r).unwrap())
      .collect();
    let kept = prefer_aggregate(rows);
    assert_eq!(kept.len(), 1);
    assert!(kept[0].is_aggregate);
    assert_eq!(kept[0].team, None);
    assert_eq!(kept[0].games_played, 50);
  }

  #[test]
  fn single_team_season_is_kept() {
    let rows = vec![normalize_season_stat(&season_row("LAL", 70)).unwrap()];
    let kept = prefer_aggregate(rows);
    assert_eq!(kept[0].team, Some(TeamRef::Id(10)));
  }

  #[test]
  fn salary_cap_money_strings() {
    let raw = record(json!({
      "Salary Cap": "$140,588,000",
      "Luxury Tax": "$170,814,000"
    }));
    let cap = normalize_salary_cap(&raw, &season()).unwrap();
    assert_eq!(cap.salary_cap, 140_588_000);
    assert_eq!(cap.luxury_tax, Some(170_814_000));
    assert_eq!(cap.first_apron, None);
    assert_eq!(cap.season_id, season());
  }

  #[test]
  fn contract_by_name() {
    let raw = record(json!({ "Player": "LeBron James", "Salary": "$48,728,845" }));
    let contract = normalize_contract(&raw, &season()).unwrap();
    assert_eq!(contract.player, PlayerRef::Name("LeBron James".into()));
    assert_eq!(contract.salary, 48_728_845);
    assert_eq!(contract.team, None);
  }

  #[test]
  fn contract_without_player_is_rejected() {
    let raw = record(json!({ "Salary": 100 }));
    assert!(matches!(
      normalize_contract(&raw, &season()),
      Err(Error::MissingField { field: "PLAYER_ID", .. })
    ));
  }
}

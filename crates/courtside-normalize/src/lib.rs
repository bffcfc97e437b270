//! Field normalization for Courtside.
//!
//! Turns loosely-shaped upstream rows ([`RawRecord`]) into the stage-tagged
//! records of [`courtside_core::record`]. Pure synchronous; no HTTP or
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use courtside_core::season::SeasonId;
//! use courtside_normalize::{normalize_player_game, records_from_json};
//!
//! let body = serde_json::json!({
//!   "resultSets": [{
//!     "headers": ["Player_ID", "Game_ID", "MATCHUP", "PTS"],
//!     "rowSet": [[2544, "0022400001", "LAL vs. MIN", 16]]
//!   }]
//! });
//! let season = SeasonId::starting(2024);
//! for raw in records_from_json(&body).unwrap().records {
//!   let line = normalize_player_game(&raw, &season).unwrap();
//!   println!("{} scored {}", line.player_id, line.counts.points);
//! }
//! ```

pub mod alias;
pub mod date;
pub mod error;
pub mod fields;
mod normalize;
mod tabular;
pub mod value;

use courtside_core::record::RawRecord;
pub use error::{Error, Result};
pub use normalize::{
  Matchup, normalize_contract, normalize_player, normalize_player_game,
  normalize_salary_cap, normalize_season_stat, normalize_team,
  normalize_team_game, parse_matchup, prefer_aggregate,
};
pub use tabular::{records_from_json, records_from_named_set};

/// Rows that normalized, and the errors for those that did not.
#[derive(Debug)]
pub struct Normalized<T> {
  pub records:  Vec<T>,
  pub rejected: Vec<Error>,
}

impl<T> Default for Normalized<T> {
  fn default() -> Self {
    Self { records: Vec::new(), rejected: Vec::new() }
  }
}

/// Apply `normalize` to every row. A failing row is collected into
/// [`Normalized::rejected`] without affecting the others.
pub fn normalize_all<T>(
  raws: &[RawRecord],
  normalize: impl Fn(&RawRecord) -> Result<T>,
) -> Normalized<T> {
  let mut records = Vec::with_capacity(raws.len());
  let mut rejected = Vec::new();
  for raw in raws {
    match normalize(raw) {
      Ok(record) => records.push(record),
      Err(e) => rejected.push(e),
    }
  }
  Normalized { records, rejected }
}

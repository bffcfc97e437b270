//! Collection stages in dependency order.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// One stage of a collection run. Later stages resolve references against
/// rows written by earlier ones, so they always run in declaration order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumIter,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  /// Teams.
  Teams,
  /// Players.
  Players,
  /// Salary cap and player contracts from the secondary source.
  Market,
  /// Games, per-game stat lines, and season stat lines.
  Observations,
  /// Value analysis.
  Metrics,
}

impl Stage {
  /// This stage and every stage after it.
  pub fn from_here(self) -> impl Iterator<Item = Stage> {
    Stage::iter().filter(move |s| *s >= self)
  }
}

//! Season identifiers.
//!
//! The canonical form is the provider's display label, e.g. `2024-25`. The
//! provider also emits numeric ids such as `22024`, where the leading digit is
//! the season type (pre-season, regular, all-star, playoffs, play-in) and the
//! remaining four digits are the starting year; both spellings normalize to
//! the same [`SeasonId`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A season label in `YYYY-YY` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeasonId {
  start_year: i32,
}

impl SeasonId {
  /// The season starting in `start_year`.
  pub fn starting(start_year: i32) -> Self { Self { start_year } }

  pub fn start_year(&self) -> i32 { self.start_year }

  /// Parse any of the accepted spellings: `2024-25`, `22024`, or `2024`.
  pub fn parse(raw: &str) -> Result<Self> {
    let s = raw.trim();
    let invalid = || Error::InvalidSeason(raw.to_string());

    if let Some((start, end)) = s.split_once('-') {
      let start_year: i32 = parse_digits(start, 4).ok_or_else(invalid)?;
      let end_year: i32 = parse_digits(end, 2).ok_or_else(invalid)?;
      if end_year != (start_year + 1) % 100 {
        return Err(invalid());
      }
      return Ok(Self { start_year });
    }

    match s.len() {
      4 => parse_digits(s, 4).map(Self::starting).ok_or_else(invalid),
      5 => {
        let kind = s.as_bytes()[0];
        if !(b'1'..=b'5').contains(&kind) {
          return Err(invalid());
        }
        parse_digits(&s[1..], 4).map(Self::starting).ok_or_else(invalid)
      }
      _ => Err(invalid()),
    }
  }
}

fn parse_digits(s: &str, width: usize) -> Option<i32> {
  if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

impl fmt::Display for SeasonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{:02}", self.start_year, (self.start_year + 1) % 100)
  }
}

impl FromStr for SeasonId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for SeasonId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<SeasonId> for String {
  fn from(id: SeasonId) -> Self { id.to_string() }
}

//! Date parsing across the formats upstream sources are known to emit.
//!
//! Formats are attempted in a fixed order: ISO first, then long-form month
//! names, then slash-delimited. A string that matches none of them is an
//! error; there is no fallback date.

use chrono::NaiveDate;

/// The format family that produced a parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
  /// `2025-04-11`, optionally followed by a `T...` time component.
  Iso,
  /// `Apr 11, 2025` or `April 11, 2025`, any case.
  MonthName,
  /// `04/11/2025` (month first) or `2025/04/11`.
  Slash,
}

const ATTEMPTS: &[(DateFormat, &str)] = &[
  (DateFormat::Iso, "%Y-%m-%d"),
  (DateFormat::MonthName, "%b %d, %Y"),
  (DateFormat::MonthName, "%B %d, %Y"),
  (DateFormat::MonthName, "%b %d %Y"),
  (DateFormat::Slash, "%m/%d/%Y"),
  (DateFormat::Slash, "%Y/%m/%d"),
];

/// Parse `value` with the first matching format.
pub fn parse_date(value: &str) -> Option<(NaiveDate, DateFormat)> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return None;
  }
  // ISO timestamps such as `1984-12-30T00:00:00` keep only the date part.
  let candidate = match trimmed.split_once('T') {
    Some((date, _)) if date.len() == 10 && date.as_bytes()[4] == b'-' => date,
    _ => trimmed,
  };

  ATTEMPTS.iter().find_map(|(kind, fmt)| {
    NaiveDate::parse_from_str(candidate, fmt)
      .ok()
      .map(|d| (d, *kind))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn iso_is_tried_first() {
    assert_eq!(
      parse_date("2025-04-11"),
      Some((ymd(2025, 4, 11), DateFormat::Iso))
    );
  }

  #[test]
  fn iso_timestamp_keeps_date() {
    assert_eq!(
      parse_date("1984-12-30T00:00:00"),
      Some((ymd(1984, 12, 30), DateFormat::Iso))
    );
  }

  #[test]
  fn long_month_name() {
    assert_eq!(
      parse_date("Apr 11, 2025"),
      Some((ymd(2025, 4, 11), DateFormat::MonthName))
    );
    assert_eq!(
      parse_date("APR 11, 2025"),
      Some((ymd(2025, 4, 11), DateFormat::MonthName))
    );
    assert_eq!(
      parse_date("April 11, 2025"),
      Some((ymd(2025, 4, 11), DateFormat::MonthName))
    );
  }

  #[test]
  fn slash_forms() {
    assert_eq!(
      parse_date("04/11/2025"),
      Some((ymd(2025, 4, 11), DateFormat::Slash))
    );
    assert_eq!(
      parse_date("2025/04/11"),
      Some((ymd(2025, 4, 11), DateFormat::Slash))
    );
  }

  #[test]
  fn invalid_under_all_formats() {
    assert_eq!(parse_date("13/45/2025"), None);
    assert_eq!(parse_date("2025-02-30"), None);
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("yesterday"), None);
  }
}

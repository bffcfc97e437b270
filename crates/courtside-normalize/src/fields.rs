//! Typed access to a [`RawRecord`] through the alias table.

use chrono::NaiveDate;
use courtside_core::{
  entity::{Pct, Shooting, StatCounts},
  record::RawRecord,
  season::SeasonId,
};
use serde_json::Value;

use crate::{
  Error, Result,
  alias::{Field, lookup},
  date::parse_date,
  value,
};

/// A raw record viewed through canonical field names.
///
/// `required_*` accessors fail when the field is absent or unreadable;
/// `optional_*` accessors return `None` when absent and fail only when a
/// value is present but unreadable.
pub struct Fields<'a> {
  raw: &'a RawRecord,
}

impl<'a> Fields<'a> {
  pub fn new(raw: &'a RawRecord) -> Self { Self { raw } }

  pub fn raw(&self) -> &'a RawRecord { self.raw }

  /// The field's value. Blank strings read as absent.
  pub fn get(&self, field: Field) -> Option<&'a Value> {
    lookup(self.raw, field)
      .filter(|v| !matches!(v, Value::String(s) if s.trim().is_empty()))
  }

  fn missing(&self, field: Field) -> Error {
    Error::MissingField { field: field.name(), record: self.raw.identifiers() }
  }

  fn invalid(&self, field: Field, v: &Value) -> Error {
    Error::InvalidValue {
      field:  field.name(),
      value:  v.to_string(),
      record: self.raw.identifiers(),
    }
  }

  /// Read an optional field with `read`; present-but-unreadable is an error.
  fn optional<T>(
    &self,
    field: Field,
    read: impl FnOnce(&Value) -> Option<T>,
  ) -> Result<Option<T>> {
    match self.get(field) {
      None => Ok(None),
      Some(v) => read(v).map(Some).ok_or_else(|| self.invalid(field, v)),
    }
  }

  fn required<T>(
    &self,
    field: Field,
    read: impl FnOnce(&Value) -> Option<T>,
  ) -> Result<T> {
    self.optional(field, read)?.ok_or_else(|| self.missing(field))
  }

  // ── Text ────────────────────────────────────────────────────────────────

  pub fn required_text(&self, field: Field) -> Result<String> {
    self.required(field, value::text)
  }

  /// Text fields never fail: anything that is not text reads as absent.
  pub fn text(&self, field: Field) -> Option<String> {
    self.get(field).and_then(value::text)
  }

  // ── Numbers ─────────────────────────────────────────────────────────────

  pub fn required_id(&self, field: Field) -> Result<i64> {
    self.required(field, value::integer)
  }

  pub fn optional_int(&self, field: Field) -> Result<Option<i64>> {
    self.optional(field, value::integer)
  }

  pub fn optional_i32(&self, field: Field) -> Result<Option<i32>> {
    self.optional(field, |v| value::integer(v).and_then(|i| i32::try_from(i).ok()))
  }

  /// Unreadable values read as absent. For descriptive fields where the
  /// provider puts placeholder text (`"Undrafted"`) in a numeric column.
  pub fn loose_i32(&self, field: Field) -> Option<i32> {
    self
      .get(field)
      .and_then(value::integer)
      .and_then(|i| i32::try_from(i).ok())
  }

  /// A counting stat; absent reads as zero.
  pub fn count(&self, field: Field) -> Result<i64> {
    Ok(self.optional_int(field)?.unwrap_or(0))
  }

  pub fn minutes(&self) -> Result<f64> {
    Ok(self.optional(Field::Minutes, value::minutes)?.unwrap_or(0.0))
  }

  pub fn optional_money(&self, field: Field) -> Result<Option<i64>> {
    self.optional(field, value::money)
  }

  pub fn required_money(&self, field: Field) -> Result<i64> {
    self.required(field, value::money)
  }

  pub fn pct(&self, field: Field) -> Result<Option<Pct>> {
    self.optional(field, value::pct)
  }

  pub fn optional_bool(&self, field: Field) -> Result<Option<bool>> {
    self.optional(field, value::boolean)
  }

  // ── Dates and seasons ───────────────────────────────────────────────────

  pub fn optional_date(&self, field: Field) -> Result<Option<NaiveDate>> {
    let Some(v) = self.get(field) else { return Ok(None) };
    let Some(s) = value::text(v) else { return Ok(None) };
    parse_date(&s)
      .map(|(d, _)| Some(d))
      .ok_or_else(|| Error::InvalidDate { value: s, record: self.raw.identifiers() })
  }

  pub fn required_date(&self, field: Field) -> Result<NaiveDate> {
    self.optional_date(field)?.ok_or_else(|| self.missing(field))
  }

  pub fn optional_season(&self) -> Result<Option<SeasonId>> {
    self.optional(Field::SeasonId, |v| {
      value::text(v).and_then(|s| SeasonId::parse(&s).ok())
    })
  }

  /// The record's season if it carries one, else `fallback`.
  pub fn season_or(&self, fallback: &SeasonId) -> Result<SeasonId> {
    Ok(self.optional_season()?.unwrap_or_else(|| fallback.clone()))
  }

  // ── Stat groups ─────────────────────────────────────────────────────────

  pub fn counts(&self) -> Result<StatCounts> {
    Ok(StatCounts {
      points:    self.count(Field::Points)?,
      rebounds:  self.count(Field::Rebounds)?,
      assists:   self.count(Field::Assists)?,
      steals:    self.count(Field::Steals)?,
      blocks:    self.count(Field::Blocks)?,
      turnovers: self.count(Field::Turnovers)?,
      fgm:       self.count(Field::FieldGoalsMade)?,
      fga:       self.count(Field::FieldGoalsAttempted)?,
      fg3m:      self.count(Field::ThreesMade)?,
      fg3a:      self.count(Field::ThreesAttempted)?,
      ftm:       self.count(Field::FreeThrowsMade)?,
      fta:       self.count(Field::FreeThrowsAttempted)?,
    })
  }

  pub fn shooting(&self) -> Result<Shooting> {
    Ok(Shooting {
      fg_pct:  self.pct(Field::FieldGoalPct)?,
      fg3_pct: self.pct(Field::ThreePct)?,
      ft_pct:  self.pct(Field::FreeThrowPct)?,
    })
  }
}

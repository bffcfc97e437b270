//! Coercion of loosely-typed JSON values into canonical scalars.
//!
//! Every function returns `None` when the value cannot be read as the target
//! type; the caller decides whether that is an error or an absent field.

use courtside_core::entity::Pct;
use serde_json::Value;

/// Text content, trimmed. Empty strings read as absent.
pub fn text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => {
      let t = s.trim();
      (!t.is_empty()).then(|| t.to_string())
    }
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Strip thousands separators, currency symbols, and whitespace.
fn numeric_text(s: &str) -> String {
  s.chars()
    .filter(|c| !matches!(c, ',' | '$' | '_') && !c.is_whitespace())
    .collect()
}

pub fn float(v: &Value) -> Option<f64> {
  let f: f64 = match v {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => numeric_text(s).parse().ok()?,
    _ => return None,
  };
  f.is_finite().then_some(f)
}

/// Whole numbers. Floats with a fractional part are rejected rather than
/// truncated.
pub fn integer(v: &Value) -> Option<i64> {
  if let Value::Number(n) = v
    && let Some(i) = n.as_i64()
  {
    return Some(i);
  }
  let f = float(v)?;
  (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

pub fn boolean(v: &Value) -> Option<bool> {
  match v {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => match n.as_i64() {
      Some(1) => Some(true),
      Some(0) => Some(false),
      _ => None,
    },
    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "1" | "y" | "yes" | "true" | "active" => Some(true),
      "0" | "n" | "no" | "false" | "inactive" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

/// Minutes played, from a number or a `MM:SS` clock string.
pub fn minutes(v: &Value) -> Option<f64> {
  if let Value::String(s) = v
    && let Some((mm, ss)) = s.trim().split_once(':')
  {
    let mm: f64 = mm.parse().ok()?;
    let ss: f64 = ss.parse().ok()?;
    if mm < 0.0 || !(0.0..60.0).contains(&ss) {
      return None;
    }
    return Some(mm + ss / 60.0);
  }
  float(v).filter(|m| *m >= 0.0)
}

/// Whole-dollar amounts such as `45640084`, `"$45,640,084"`, or
/// `"45640084.00"`.
pub fn money(v: &Value) -> Option<i64> {
  let f = float(v)?;
  (f >= 0.0 && f.fract() == 0.0).then_some(f as i64)
}

/// A percentage as a fraction in `[0, 1]`.
///
/// Values in `[0, 1]` are taken as already-normalized fractions. Values in
/// `(1, 100]` are whole-number percentages and are scaled once. Anything else
/// is rejected. A `%` suffix forces percent interpretation.
pub fn pct(v: &Value) -> Option<Pct> {
  let (raw, forced_percent) = match v {
    Value::String(s) if s.trim().ends_with('%') => {
      (s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?, true)
    }
    other => (float(other)?, false),
  };
  let fraction = if forced_percent || raw > 1.0 { raw / 100.0 } else { raw };
  Pct::new(fraction).ok()
}

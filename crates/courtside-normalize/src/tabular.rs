//! Decoding response bodies into [`RawRecord`]s.
//!
//! Two shapes are accepted:
//!
//! - the provider's tabular form, `{"resultSets": [{"headers": [..],
//!   "rowSet": [[..], ..]}]}` (or a single `"resultSet"` object), where each
//!   row is zipped with the headers;
//! - a plain JSON array of objects, as served by secondary sources.
//!
//! An envelope that is not one of these is an [`Error::UnexpectedShape`].
//! Inside a good envelope, a row that cannot be decoded lands in
//! [`Normalized::rejected`] as [`Error::MalformedRow`] and its neighbours
//! still decode. An empty row set is a legitimate "no data" answer.

use courtside_core::record::RawRecord;
use serde_json::{Map, Value};

use crate::{Error, Normalized, Result};

/// Decode `body`, taking the first result set when there are several.
pub fn records_from_json(body: &Value) -> Result<Normalized<RawRecord>> {
  records_from_named_set(body, None)
}

/// Decode `body`, taking the result set called `name` if given.
pub fn records_from_named_set(
  body: &Value,
  name: Option<&str>,
) -> Result<Normalized<RawRecord>> {
  match body {
    Value::Array(items) => Ok(partition(items.iter().enumerate().map(object_record))),
    Value::Object(obj) => match select_set(obj, name)? {
      Some(set) => zip_set(set),
      None => Ok(Normalized::default()),
    },
    Value::Null => Ok(Normalized::default()),
    other => Err(Error::UnexpectedShape(format!(
      "expected object or array, got {}",
      kind(other)
    ))),
  }
}

fn partition(rows: impl Iterator<Item = Result<RawRecord>>) -> Normalized<RawRecord> {
  let mut out = Normalized::default();
  for row in rows {
    match row {
      Ok(record) => out.records.push(record),
      Err(e) => out.rejected.push(e),
    }
  }
  out
}

fn select_set<'a>(
  obj: &'a Map<String, Value>,
  name: Option<&str>,
) -> Result<Option<&'a Map<String, Value>>> {
  let sets: Vec<&Map<String, Value>> = match (obj.get("resultSets"), obj.get("resultSet")) {
    (Some(Value::Array(sets)), _) => sets.iter().filter_map(Value::as_object).collect(),
    (Some(Value::Object(set)), _) | (None, Some(Value::Object(set))) => vec![set],
    (None, Some(Value::Array(sets))) => sets.iter().filter_map(Value::as_object).collect(),
    (Some(Value::Null), _) | (None, Some(Value::Null)) => return Ok(None),
    (None, None) if obj.contains_key("headers") => vec![obj],
    _ => {
      return Err(Error::UnexpectedShape(
        "object without resultSets/resultSet".to_string(),
      ));
    }
  };

  let Some(name) = name else {
    return Ok(sets.into_iter().next());
  };
  sets
    .into_iter()
    .find(|s| s.get("name").and_then(Value::as_str) == Some(name))
    .map(Some)
    .ok_or_else(|| Error::UnexpectedShape(format!("no result set named {name:?}")))
}

fn zip_set(set: &Map<String, Value>) -> Result<Normalized<RawRecord>> {
  let headers: Vec<&str> = match set.get("headers") {
    Some(Value::Array(h)) => h
      .iter()
      .map(|v| {
        v.as_str()
          .ok_or_else(|| Error::UnexpectedShape(format!("non-string header {v}")))
      })
      .collect::<Result<_>>()?,
    _ => return Err(Error::UnexpectedShape("result set without headers".to_string())),
  };

  let rows = match set.get("rowSet") {
    Some(Value::Array(rows)) => rows,
    Some(Value::Null) | None => return Ok(Normalized::default()),
    Some(other) => {
      return Err(Error::UnexpectedShape(format!("rowSet is {}", kind(other))));
    }
  };

  Ok(partition(rows.iter().enumerate().map(|(index, row)| {
    let cells = row.as_array().ok_or_else(|| Error::MalformedRow {
      index,
      reason: format!("row is {}", kind(row)),
    })?;
    if cells.len() != headers.len() {
      return Err(Error::MalformedRow {
        index,
        reason: format!("{} cells for {} headers", cells.len(), headers.len()),
      });
    }
    let map: Map<String, Value> = headers
      .iter()
      .zip(cells)
      .map(|(h, c)| ((*h).to_string(), c.clone()))
      .collect();
    Ok(RawRecord::from(map))
  })))
}

fn object_record((index, item): (usize, &Value)) -> Result<RawRecord> {
  item
    .as_object()
    .cloned()
    .map(RawRecord::from)
    .ok_or_else(|| Error::MalformedRow {
      index,
      reason: format!("array item is {}", kind(item)),
    })
}

fn kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn result_sets_zip_headers() {
    let body = json!({
      "resultSets": [{
        "name": "PlayerGameLog",
        "headers": ["Game_ID", "PTS"],
        "rowSet": [["0022400001", 30], ["0022400002", 25]]
      }]
    });
    let out = records_from_json(&body).unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(out.rejected.is_empty());
    assert_eq!(out.records[1].get("PTS"), Some(&json!(25)));
  }

  #[test]
  fn named_set_is_selected() {
    let body = json!({
      "resultSets": [
        { "name": "A", "headers": ["X"], "rowSet": [[1]] },
        { "name": "B", "headers": ["X"], "rowSet": [[2], [3]] }
      ]
    });
    let out = records_from_named_set(&body, Some("B")).unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(records_from_named_set(&body, Some("C")).is_err());
  }

  #[test]
  fn single_result_set_object() {
    let body = json!({
      "resultSet": { "headers": ["TEAM_ID"], "rowSet": [[1610612747]] }
    });
    assert_eq!(records_from_json(&body).unwrap().records.len(), 1);
  }

  #[test]
  fn empty_row_set_is_not_an_error() {
    let body = json!({ "resultSets": [{ "headers": ["X"], "rowSet": [] }] });
    assert!(records_from_json(&body).unwrap().records.is_empty());
    assert!(records_from_json(&json!([])).unwrap().records.is_empty());
  }

  #[test]
  fn plain_array_of_objects() {
    let body = json!([{ "Player": "LeBron James", "Salary": "$48,728,845" }]);
    let out = records_from_json(&body).unwrap();
    assert_eq!(out.records[0].get("Player"), Some(&json!("LeBron James")));
  }

  #[test]
  fn short_row_mid_page_spares_its_neighbours() {
    let body = json!({
      "resultSets": [{
        "headers": ["Game_ID", "PTS"],
        "rowSet": [["0022400001", 30], ["0022400002"], ["0022400003", 18]]
      }]
    });
    let out = records_from_json(&body).unwrap();
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[1].get("Game_ID"), Some(&json!("0022400003")));
    assert!(matches!(
      out.rejected.as_slice(),
      [Error::MalformedRow { index: 1, .. }]
    ));
  }

  #[test]
  fn non_array_row_is_rejected_alone() {
    let body = json!({ "resultSets": [{ "headers": ["A"], "rowSet": [[1], "x", [2]] }] });
    let out = records_from_json(&body).unwrap();
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.rejected.len(), 1);
  }

  #[test]
  fn non_object_array_item_is_rejected_alone() {
    let body = json!([{ "Player": "A" }, 7, { "Player": "B" }]);
    let out = records_from_json(&body).unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(matches!(
      out.rejected.as_slice(),
      [Error::MalformedRow { index: 1, .. }]
    ));
  }

  #[test]
  fn broken_envelope_is_rejected() {
    assert!(matches!(
      records_from_json(&json!("oops")),
      Err(Error::UnexpectedShape(_))
    ));
    assert!(matches!(
      records_from_json(&json!({ "resultSets": [{ "rowSet": [[1]] }] })),
      Err(Error::UnexpectedShape(_))
    ));
    assert!(matches!(
      records_from_json(&json!({ "resultSets": [{ "headers": ["A"], "rowSet": 3 }] })),
      Err(Error::UnexpectedShape(_))
    ));
  }
}

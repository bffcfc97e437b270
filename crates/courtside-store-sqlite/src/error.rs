//! Error type for `courtside-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] courtside_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Every pooled connection is checked out.
  #[error("connection pool exhausted ({size} connections in use)")]
  PoolExhausted { size: usize },

  #[error("pool size must be at least 1")]
  EmptyPool,

  /// The database does not provide a table the store depends on.
  #[error("required table {0:?} is missing")]
  MissingTable(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Whether `e` concerns only the row being written.
///
/// Constraint and type violations are row-level: the row is skipped and the
/// surrounding transaction carries on. Anything else (I/O, locking, a closed
/// connection) is transaction-level and aborts the batch.
pub fn is_row_level(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(err, _) => matches!(
      err.code,
      ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig
    ),
    rusqlite::Error::ToSqlConversionFailure(_)
    | rusqlite::Error::IntegralValueOutOfRange(..) => true,
    _ => false,
  }
}

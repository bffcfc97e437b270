//! A bounded pool of SQLite connections.
//!
//! The pool is created once and handed to the store; there is no global
//! connection state. [`Pool::acquire`] never waits: when every connection is
//! checked out it returns [`Error::PoolExhausted`] at once. The returned
//! [`PooledConnection`] puts its connection back when dropped.

use std::{
  ops::Deref,
  path::Path,
  sync::{Arc, Mutex, PoisonError},
};

use rusqlite::OpenFlags;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_rusqlite::Connection;

use crate::{Error, Result, schema::CONNECTION_PRAGMAS};

#[derive(Clone)]
pub struct Pool {
  idle:    Arc<Mutex<Vec<Connection>>>,
  permits: Arc<Semaphore>,
  size:    usize,
}

impl Pool {
  /// Open `size` connections to the database file at `path`.
  pub async fn open(path: impl AsRef<Path>, size: usize) -> Result<Self> {
    if size == 0 {
      return Err(Error::EmptyPool);
    }
    let mut conns = Vec::with_capacity(size);
    for _ in 0..size {
      conns.push(prepare(Connection::open(path.as_ref()).await?).await?);
    }
    Ok(Self::from_connections(conns))
  }

  /// Open `size` connections to one private in-memory database.
  ///
  /// The connections share a uniquely named shared-cache database, which
  /// lives as long as any of them stays open.
  pub async fn open_in_memory(size: usize) -> Result<Self> {
    if size == 0 {
      return Err(Error::EmptyPool);
    }
    let uri = format!(
      "file:courtside-{}?mode=memory&cache=shared",
      uuid::Uuid::new_v4().simple()
    );
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
      | OpenFlags::SQLITE_OPEN_CREATE
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let mut conns = Vec::with_capacity(size);
    for _ in 0..size {
      conns.push(prepare(Connection::open_with_flags(&uri, flags).await?).await?);
    }
    Ok(Self::from_connections(conns))
  }

  fn from_connections(conns: Vec<Connection>) -> Self {
    let size = conns.len();
    Self {
      idle: Arc::new(Mutex::new(conns)),
      permits: Arc::new(Semaphore::new(size)),
      size,
    }
  }

  pub fn size(&self) -> usize { self.size }

  /// Connections not currently checked out.
  pub fn available(&self) -> usize { self.permits.available_permits() }

  /// Check out a connection, failing immediately if none is free.
  pub fn acquire(&self) -> Result<PooledConnection> {
    let permit = Arc::clone(&self.permits)
      .try_acquire_owned()
      .map_err(|_| Error::PoolExhausted { size: self.size })?;
    let conn = self
      .idle
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .pop()
      .ok_or(Error::PoolExhausted { size: self.size })?;
    Ok(PooledConnection {
      conn,
      idle: Arc::clone(&self.idle),
      _permit: permit,
    })
  }
}

async fn prepare(conn: Connection) -> Result<Connection> {
  conn
    .call(|conn| {
      conn.execute_batch(CONNECTION_PRAGMAS)?;
      Ok(())
    })
    .await?;
  Ok(conn)
}

/// A checked-out connection. Returned to the pool on drop.
pub struct PooledConnection {
  conn:    Connection,
  idle:    Arc<Mutex<Vec<Connection>>>,
  // Released after `drop` has pushed the connection back.
  _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
  type Target = Connection;

  fn deref(&self) -> &Connection { &self.conn }
}

impl Drop for PooledConnection {
  fn drop(&mut self) {
    // Handles are reference-counted; the clone keeps the same connection.
    self
      .idle
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(self.conn.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn exhaustion_fails_immediately() {
    let pool = Pool::open_in_memory(2).await.unwrap();
    let a = pool.acquire().unwrap();
    let _b = pool.acquire().unwrap();
    assert_eq!(pool.available(), 0);
    assert!(matches!(pool.acquire(), Err(Error::PoolExhausted { size: 2 })));

    drop(a);
    assert_eq!(pool.available(), 1);
    assert!(pool.acquire().is_ok());
  }

  #[tokio::test]
  async fn zero_sized_pool_is_rejected() {
    assert!(matches!(Pool::open_in_memory(0).await, Err(Error::EmptyPool)));
  }

  #[tokio::test]
  async fn connections_share_one_in_memory_database() {
    let pool = Pool::open_in_memory(2).await.unwrap();
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    a.call(|c| {
      c.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")?;
      Ok(())
    })
    .await
    .unwrap();
    let x: i64 = b
      .call(|c| Ok(c.query_row("SELECT x FROM t", [], |r| r.get(0))?))
      .await
      .unwrap();
    assert_eq!(x, 7);
  }
}

//! SQLite backend for the Courtside statistics store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated threads
//! without blocking the async runtime. Connections come from a small bounded
//! [`pool::Pool`]; running out of connections is an immediate error rather
//! than a wait.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod pool;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

//! Core types and trait definitions for the Courtside statistics collector.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the persisted entity types, the stage-tagged records that flow between
//! normalization and persistence, the reference resolver, the value-metric
//! calculator, and the [`store::StatsStore`] abstraction.

pub mod entity;
pub mod error;
pub mod metrics;
pub mod record;
pub mod resolve;
pub mod season;
pub mod stage;
pub mod store;

pub use error::{Error, Result};

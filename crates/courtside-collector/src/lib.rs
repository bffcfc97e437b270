//! Collection pipeline for Courtside.
//!
//! Fetches from the upstream [`source::StatsSource`] with retries
//! ([`retry`]), paces the work ([`pace`], [`schedule`]), normalizes and
//! resolves what comes back, and upserts it through a
//! [`courtside_core::store::StatsStore`]. The [`orchestrator`] drives the
//! stages in dependency order.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pace;
pub mod report;
pub mod retry;
pub mod schedule;
pub mod source;

pub use config::CollectorConfig;
pub use error::{Error, FetchError, Result};
pub use orchestrator::Orchestrator;
pub use report::{RunSummary, StageReport};
pub use source::{HttpSource, Page, Request, StatsSource};

//! SmartFind Core
//!
//! Domain types and the pure decision logic of the SmartFind agent.
//!
//! This crate contains:
//! - Domain types: scraped job listings and their fingerprints
//! - Parser: turns rendered table-row text into listings
//! - Ledger: remembers which listings were already surfaced
//! - Blackout: the set of dates that must never be claimed
//! - Policy: decides whether a listing is claimed, notified or skipped
//! - Monitor: login-failure and heartbeat bookkeeping
//!
//! Nothing in here performs I/O; the runner feeds it page text and the
//! current time.

pub mod blackout;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod monitor;
pub mod parser;
pub mod policy;

pub use error::PolicyError;

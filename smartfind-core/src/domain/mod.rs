//! Core domain types
//!
//! A listing is built fresh from page text on every scan and dropped at the
//! end of the cycle. Only its fingerprint outlives the scan.

pub mod listing;

pub use listing::{Fingerprint, JobListing, ListingDate, TimeRange};

//! Error types for policy configuration

use thiserror::Error;

/// Errors raised while interpreting date-based policy settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A date did not match `MM/DD/YYYY`
    #[error("invalid date '{0}', expected MM/DD/YYYY")]
    InvalidDate(String),

    /// A range whose end falls before its start
    #[error("date range {start} - {end} ends before it starts")]
    InvertedRange { start: String, end: String },
}

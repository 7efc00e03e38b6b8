//! Known-jobs ledger
//!
//! Remembers which listings were already surfaced so each opportunity is
//! announced once. Seeing the board empty wipes the memory: anything that
//! shows up afterwards is news again, even if it looks identical.

use std::collections::HashSet;

use crate::domain::Fingerprint;
use crate::parser::is_board_empty;

/// Process-lifetime set of already-reported fingerprints
#[derive(Debug, Default, Clone)]
pub struct KnownJobsLedger {
    known: HashSet<Fingerprint>,
}

impl KnownJobsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the fingerprint has not been reported since the last reset
    pub fn is_new(&self, fingerprint: &Fingerprint) -> bool {
        !self.known.contains(fingerprint)
    }

    /// Marks a fingerprint as reported
    pub fn record(&mut self, fingerprint: Fingerprint) {
        self.known.insert(fingerprint);
    }

    /// Clears the ledger when the board text shows the empty marker
    ///
    /// Returns whether the board was empty.
    pub fn reset_if_board_empty(&mut self, board_text: &str) -> bool {
        if is_board_empty(board_text) {
            self.known.clear();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

//! Identifier sequencing for sites without a discoverable index
//!
//! A site's addressing scheme is walked one candidate at a time. The
//! sequencer is pure: given the current position, a scheme and a direction it
//! yields the next position or reports that the space is exhausted. It never
//! knows whether an identifier actually exists; that is the controller's job.
//!
//! # Schemes
//!
//! - `Numeric`: a fixed-width counter within `[min, max]`, e.g. `abc00123`
//! - `Dated`: a date plus an ordinal that rolls the date by one day once the
//!   per-date maximum is passed, e.g. `20240115_003`

mod scheme;

pub use scheme::IdScheme;

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors raised when an identifier does not fit a scheme
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Identifier '{id}' does not match the {scheme} scheme")]
    Unparseable { id: String, scheme: &'static str },

    #[error("Identifier '{0}' is outside the configured range")]
    OutOfRange(String),
}

/// Direction of traversal through an identifier space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Ascending identifiers (newer items on most sites)
    #[default]
    Forward,
    /// Descending identifiers
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// A position within an identifier space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    Numeric(u64),
    Dated { date: NaiveDate, ordinal: u32 },
}

/// Outcome of advancing a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The next candidate position
    Next(Cursor),
    /// No further identifiers exist in this direction
    Exhausted,
}

impl Step {
    /// Returns the next cursor, if any
    pub fn cursor(self) -> Option<Cursor> {
        match self {
            Self::Next(cursor) => Some(cursor),
            Self::Exhausted => None,
        }
    }
}

//! Ledger search, grading, conflict resolution and statistical post-filter.
//!
//! For each staff the search walks outward one virtual line at a time, above
//! (indices -1, -2, ...) and below (+1, +2, ...) the staff:
//!
//! - candidate sticks whose middle point falls in the virtual line box are
//!   positioned against a reference ordinate (the staff line for |index| == 1,
//!   an accepted ledger of the previous line otherwise);
//! - the [`LedgerSuite`] grades them against the target ordinate one
//!   interline further out;
//! - overlapping hypotheses on the line are resolved through the system's
//!   interpretation graph ([`reduce_ledgers`]);
//! - a line with no accepted ledger ends the walk on that side.
//!
//! [`stats`] holds the sheet-wide outlier pass run once every system has
//! been searched.

mod builder;
mod params;
mod reduce;
pub mod stats;
mod suite;

pub use builder::{CandidatePool, LedgersBuilder, StickStatus, StickVerdict, YReference};
pub use params::{CheckWeights, LedgerParams};
pub use reduce::reduce_ledgers;
pub use stats::StatsParams;
pub use suite::{
    convex_ends, LedgerSuite, StickContext, Suites, TOO_BENDED, TOO_CONCAVE, TOO_SHIFTED,
    TOO_SHORT, TOO_THICK, TOO_THIN,
};

use crate::sheet::GeometryError;
use std::fmt;

/// Failure while building the ledgers of one system.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerError {
    Geometry(GeometryError),
    MissingSuite { interline: i32 },
    UnknownStaff { staff: u32 },
    NoStaff,
    /// The work of one system panicked.
    Panicked { message: String },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Geometry(err) => write!(f, "malformed staff geometry: {err}"),
            LedgerError::MissingSuite { interline } => {
                write!(f, "no ledger check suite for interline {interline}")
            }
            LedgerError::UnknownStaff { staff } => write!(f, "unknown staff#{staff}"),
            LedgerError::NoStaff => f.write_str("sheet has no staff"),
            LedgerError::Panicked { message } => {
                write!(f, "system processing panicked: {message}")
            }
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Geometry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeometryError> for LedgerError {
    fn from(err: GeometryError) -> Self {
        LedgerError::Geometry(err)
    }
}

//! Ledger-line detection for optical music recognition.
//!
//! Input is a staff-free binary page plus the staff/system model produced
//! upstream (staff lines, interlines, good beams). Output is the set of
//! ledgers registered in each staff, indexed by signed line position, and a
//! serializable [`LedgerReport`] of every stage.
//!
//! Pipeline
//! - [`runs`]: horizontal runs, filtered away from staff lines, stacked into
//!   sections and dispatched to systems.
//! - [`sticks`]: thin, straight horizontal candidates grown from long cores.
//! - [`ledger`]: virtual-line search around each staff, grading through a
//!   weighted [`check`] suite and conflict resolution in the system's
//!   interpretation graph ([`sig`]).
//! - [`ledger::stats`]: sheet-wide outlier discard followed by a partial
//!   rebuild, driven by [`detector`].

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod image;
pub mod sheet;
pub mod types;

// Pipeline internals, public for tools and tests.
pub mod check;
pub mod config;
pub mod ledger;
pub mod runs;
pub mod sig;
pub mod sticks;

// --- High-level re-exports -------------------------------------------------

pub use crate::detector::{DetectorParams, LedgerDetector, StickEvaluation};
pub use crate::diagnostics::LedgerReport;
pub use crate::ledger::LedgerError;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use ledger_detector::prelude::*;
///
/// # fn main() {
/// let mut image = OwnedImage::blank(400, 300);
/// image.fill_rect(100, 79, 141, 82);
/// let staff = Staff::regular(1, 20, 20.0, 380.0, 100.0, 5);
/// let mut sheet = Sheet::new(Scale::new(20, 2.0), vec![SystemInfo::new(1, 20, 380, vec![staff])]);
///
/// let report = LedgerDetector::default().process(&mut sheet, &image.as_view());
/// println!("ledgers={} latency_ms={:.3}", report.ledger_count(), report.timings.total_ms);
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageU8, ImageView, OwnedImage};
    pub use crate::sheet::{Scale, Sheet, Staff, SystemInfo};
    pub use crate::{DetectorParams, LedgerDetector, LedgerReport};
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    // Stage runners.
    pub use crate::detector::{
        build_suites, first_pass, post_filter_and_rebuild, FirstPassOutput, SystemState,
    };
    pub use crate::runs::{
        build_run_table, dispatch_sections, filter_runs, purge_beam_sections, SectionFactory,
    };
    pub use crate::sticks::{purge_beam_overlaps, StickFactory};

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        InputDescriptor, LedgerDescriptor, LineReport, PostFilterStage, RunStage, StaffLedgers,
        StageTiming, SystemLedgerStage, TimingBreakdown,
    };
}

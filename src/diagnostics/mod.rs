//! Serializable diagnostics of a ledger detection run.
//!
//! [`LedgerReport`] is returned by the detector: run extraction counters,
//! one [`SystemLedgerStage`] per system with per-line lookup counters, the
//! statistical [`PostFilterStage`], the final ledgers per staff and stage
//! timings.

pub mod ledgers;
pub mod post_filter;
pub mod report;
pub mod timing;

pub use ledgers::{LineReport, RunStage, SystemLedgerStage};
pub use post_filter::PostFilterStage;
pub use report::{InputDescriptor, LedgerDescriptor, LedgerReport, StaffLedgers};
pub use timing::{StageTiming, TimingBreakdown};

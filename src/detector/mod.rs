//! Ledger detector orchestrating the two-pass pipeline.
//!
//! Overview
//! - First pass: extract runs from the staff-free image, drop those hugging
//!   a staff, stack them into sections and dispatch sections to systems.
//!   Each system then builds its candidate sticks and walks its staves
//!   outward line by line (see [`crate::ledger`]).
//! - Barrier: every system must be done before the statistical pass.
//! - Post-filter: sheet-wide delta/height statistics flag outliers; the
//!   affected staff sides are searched again from the innermost discarded
//!   line.
//!
//! Modules
//! - [`params`]: configuration types used by the detector and the demo tool.
//! - `passes`: [`first_pass`] and [`post_filter_and_rebuild`].
//! - `pipeline`: the [`LedgerDetector`] facade.

pub mod params;
mod passes;
mod pipeline;

pub use params::DetectorParams;
pub use passes::{build_suites, first_pass, post_filter_and_rebuild, FirstPassOutput, SystemState};
pub use pipeline::{LedgerDetector, StickEvaluation};

//! Run/section stage.
//!
//! Turns the staff-free image into per-system lists of sections usable as
//! ledger material:
//!
//! 1. [`build_run_table`] extracts horizontal foreground runs.
//! 2. [`filter_runs`] drops runs hugging or inside a staff.
//! 3. [`SectionFactory::build`] stacks runs with zero shift tolerance.
//! 4. [`dispatch_sections`] partitions sections by system.
//! 5. [`purge_beam_sections`] removes sections touching good beams.

mod dispatch;
mod filter;
mod options;
mod run;
mod section;

pub use dispatch::{dispatch_sections, purge_beam_sections};
pub use filter::filter_runs;
pub use options::RunFilterOptions;
pub use run::{build_run_table, Run, RunTable};
pub use section::{Section, SectionFactory, SectionId};

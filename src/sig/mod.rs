//! Symbolic interpretation graph (SIG).
//!
//! Each system owns one graph. Detection stages add graded interpretations
//! as vertices and record mutual exclusions between competitors; the graph
//! then resolves a set of exclusions through an injected
//! [`ExclusionReducer`], keeping the better graded side of every conflict.
//!
//! The ledger pipeline uses it for three things: reading the good beams of a
//! system, registering ledger hypotheses, and resolving overlaps on one
//! virtual line.

mod graph;
mod inter;
mod reducer;

pub use graph::{Exclusion, ExclusionCause, SIGraph};
pub use inter::{BeamInter, Inter, InterId, LedgerInter, GOOD_GRADE};
pub use reducer::{ExclusionReducer, GradeReducer};

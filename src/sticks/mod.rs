//! Candidate stick stage: sections of one system become straight
//! horizontal filaments, minus those lying on a good beam.

mod factory;
mod filament;

pub use factory::{purge_beam_overlaps, StickFactory, StickOptions};
pub use filament::{StickId, StraightFilament};

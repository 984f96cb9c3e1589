use super::ledgers::LineReport;
use crate::ledger::stats::{LedgerBands, LedgerSample};
use serde::Serialize;

/// Outcome of the sheet-wide statistical pass and the rebuilds it caused.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilterStage {
    pub enabled: bool,
    pub population: usize,
    pub bands: LedgerBands,
    pub discarded: Vec<LedgerSample>,
    /// Ids of the systems searched again.
    pub rebuilt_systems: Vec<u32>,
    pub lines: Vec<LineReport>,
    pub errors: Vec<String>,
    pub elapsed_ms: f64,
}

use super::timing::TimingBreakdown;
use serde::Serialize;

/// Counters of one virtual-line lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReport {
    pub staff: u32,
    pub index: i32,
    /// Free sticks whose middle point fell in the virtual line box.
    pub candidates: usize,
    /// Candidates with no reference ordinate.
    pub orphans: usize,
    /// Candidates failing a hard check band.
    pub rejected: usize,
    /// Candidates graded below the suite threshold.
    pub weak: usize,
    /// Hypotheses deleted by conflict resolution.
    pub deleted: usize,
    pub accepted: usize,
}

impl LineReport {
    pub fn new(staff: u32, index: i32) -> Self {
        Self {
            staff,
            index,
            ..Self::default()
        }
    }
}

/// Run and section extraction over the whole sheet.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStage {
    pub runs: usize,
    pub kept_runs: usize,
    pub sections: usize,
    pub elapsed_ms: f64,
}

/// Ledger building of one system.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLedgerStage {
    pub system: u32,
    pub sections: usize,
    pub beam_sections: usize,
    pub sticks: usize,
    pub beam_sticks: usize,
    pub lines: Vec<LineReport>,
    pub ledgers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timings: TimingBreakdown,
}

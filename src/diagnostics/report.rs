use super::ledgers::{RunStage, SystemLedgerStage};
use super::post_filter::PostFilterStage;
use super::timing::TimingBreakdown;
use crate::sheet::Sheet;
use crate::sig::InterId;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub systems: usize,
    pub staves: usize,
}

/// Final ledger of a staff.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDescriptor {
    pub index: i32,
    pub inter: InterId,
    pub start: [f32; 2],
    pub stop: [f32; 2],
    pub thickness: f32,
    pub grade: f32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLedgers {
    pub system: u32,
    pub staff: u32,
    pub ledgers: Vec<LedgerDescriptor>,
}

impl StaffLedgers {
    /// Snapshot of the accepted ledgers of every staff.
    pub fn collect(sheet: &Sheet) -> Vec<StaffLedgers> {
        sheet
            .systems
            .iter()
            .flat_map(|system| {
                system.staves.iter().map(move |staff| StaffLedgers {
                    system: system.id,
                    staff: staff.id,
                    ledgers: staff
                        .ledger_lines()
                        .iter()
                        .filter_map(|line| {
                            let ledger = system.sig.ledger(line.inter)?;
                            Some(LedgerDescriptor {
                                index: line.index,
                                inter: line.inter,
                                start: line.start,
                                stop: line.stop,
                                thickness: ledger.thickness,
                                grade: ledger.grade(),
                            })
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

/// Everything [`LedgerDetector::process`](crate::LedgerDetector::process) found.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    pub input: InputDescriptor,
    pub runs: RunStage,
    pub systems: Vec<SystemLedgerStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_filter: Option<PostFilterStage>,
    pub staves: Vec<StaffLedgers>,
    pub timings: TimingBreakdown,
}

impl LedgerReport {
    pub fn ledger_count(&self) -> usize {
        self.staves.iter().map(|s| s.ledgers.len()).sum()
    }

    pub fn staff(&self, staff: u32) -> Option<&StaffLedgers> {
        self.staves.iter().find(|s| s.staff == staff)
    }
}

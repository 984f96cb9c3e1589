//! [`LedgerDetector`]: one call from a staff-free image and a sheet model to
//! ledgers registered in every staff.
//!
//! ```no_run
//! use ledger_detector::image::OwnedImage;
//! use ledger_detector::sheet::{Scale, Sheet, Staff, SystemInfo};
//! use ledger_detector::{DetectorParams, LedgerDetector};
//!
//! # fn example(image: OwnedImage) {
//! let staff = Staff::regular(1, 20, 50.0, 950.0, 200.0, 5);
//! let mut sheet = Sheet::new(
//!     Scale::new(20, 2.0),
//!     vec![SystemInfo::new(1, 50, 950, vec![staff])],
//! );
//! let detector = LedgerDetector::new(DetectorParams::default());
//! let report = detector.process(&mut sheet, &image.as_view());
//! println!("ledgers={}", report.ledger_count());
//! # }
//! ```

use super::params::DetectorParams;
use super::passes::{build_suites, first_pass, post_filter_and_rebuild};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{InputDescriptor, LedgerReport, StaffLedgers, TimingBreakdown};
use crate::image::ImageView;
use crate::ledger::{LedgerError, LedgersBuilder, StickVerdict};
use crate::sheet::{Sheet, Staff};
use crate::sticks::StraightFilament;
use log::debug;
use serde::Serialize;
use std::time::Instant;

/// Grading of an arbitrary stick against its closest staff.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StickEvaluation {
    pub system: u32,
    pub staff: u32,
    pub index: i32,
    pub verdict: StickVerdict,
}

/// Ledger detector running both passes over a sheet.
#[derive(Clone, Debug, Default)]
pub struct LedgerDetector {
    params: DetectorParams,
}

impl LedgerDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn set_params(&mut self, params: DetectorParams) {
        self.params = params;
    }

    /// Detect ledgers in every system of `sheet` and report the stages.
    pub fn process<I>(&self, sheet: &mut Sheet, image: &I) -> LedgerReport
    where
        I: ImageView + Sync,
    {
        let total_start = Instant::now();
        let input = InputDescriptor {
            width: image.width(),
            height: image.height(),
            systems: sheet.systems.len(),
            staves: sheet.staves().count(),
        };

        let mut first = first_pass(sheet, image, &self.params);
        let first_ms = first.elapsed_ms;
        let post = post_filter_and_rebuild(sheet, image, &mut first, &self.params);

        let mut timings = TimingBreakdown::default();
        timings.push("runs", first.runs.elapsed_ms);
        timings.push("firstPass", first_ms);
        timings.push("postFilter", post.elapsed_ms);
        timings.total_ms = elapsed_ms(total_start);

        let report = LedgerReport {
            input,
            runs: first.runs,
            systems: first.systems.into_iter().map(|s| s.stage).collect(),
            post_filter: post.enabled.then_some(post),
            staves: StaffLedgers::collect(sheet),
            timings,
        };
        debug!(
            "LedgerDetector::process ledgers={} latency_ms={:.3}",
            report.ledger_count(),
            report.timings.total_ms
        );
        report
    }

    /// Grade `stick` on the virtual line of its closest staff, using the
    /// ledgers currently registered in that staff as references.
    pub fn evaluate_stick<I: ImageView>(
        &self,
        sheet: &Sheet,
        image: &I,
        stick: &StraightFilament,
    ) -> Result<StickEvaluation, LedgerError> {
        let middle = stick.middle();
        let staff = sheet.closest_staff(middle).ok_or(LedgerError::NoStaff)?;
        let (si, _) = sheet
            .locate_staff(staff.id)
            .ok_or(LedgerError::UnknownStaff { staff: staff.id })?;
        let system = &sheet.systems[si];
        let index = Staff::stick_line_index(staff.pitch_position_of(middle));
        let suites = build_suites(sheet, &self.params);
        let builder = LedgersBuilder::new(image, &sheet.scale, &self.params.ledgers, &suites);
        let verdict = builder.evaluate(staff, &system.sig, index, stick)?;
        Ok(StickEvaluation {
            system: system.id,
            staff: staff.id,
            index,
            verdict,
        })
    }
}

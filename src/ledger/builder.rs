use super::params::LedgerParams;
use super::reduce::reduce_ledgers;
use super::suite::{StickContext, Suites};
use super::LedgerError;
use crate::check::{GradeImpacts, Rejection};
use crate::diagnostics::LineReport;
use crate::image::ImageView;
use crate::sheet::{GrandStaffRole, Scale, Staff, SystemInfo};
use crate::sig::{Inter, InterId, LedgerInter, SIGraph};
use crate::sticks::{StickId, StraightFilament};
use log::{debug, info, trace};
use serde::Serialize;

/// Availability of a candidate stick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickStatus {
    Free,
    /// Discarded by the statistical pass, never retried.
    Banned,
}

/// Candidate sticks of one system.
///
/// Every staff searches the whole pool, so one stick may back a ledger in
/// two staves. Only banned sticks are withheld.
#[derive(Clone, Debug, Default)]
pub struct CandidatePool {
    sticks: Vec<StraightFilament>,
    status: Vec<StickStatus>,
}

impl CandidatePool {
    pub fn new(mut sticks: Vec<StraightFilament>) -> Self {
        sticks.sort_by_key(|s| s.id);
        let status = vec![StickStatus::Free; sticks.len()];
        Self { sticks, status }
    }

    fn slot(&self, id: StickId) -> Option<usize> {
        self.sticks.binary_search_by_key(&id, |s| s.id).ok()
    }

    pub fn sticks(&self) -> &[StraightFilament] {
        &self.sticks
    }

    /// Sticks still open to the search.
    pub fn available(&self) -> impl Iterator<Item = &StraightFilament> {
        self.sticks
            .iter()
            .zip(&self.status)
            .filter_map(|(stick, status)| (*status == StickStatus::Free).then_some(stick))
    }

    pub fn status(&self, id: StickId) -> Option<StickStatus> {
        self.slot(id).map(|i| self.status[i])
    }

    pub fn ban(&mut self, id: StickId) {
        if let Some(i) = self.slot(id) {
            self.status[i] = StickStatus::Banned;
        }
    }
}

/// Reference ordinate of a candidate stick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YReference {
    pub y: f32,
    /// Ledger of the previous line used as reference, `None` for the staff line.
    pub ledger: Option<InterId>,
}

/// Outcome of grading one stick on its closest virtual line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum StickVerdict {
    InsideStaff,
    Orphan,
    Rejected(Rejection),
    Graded { y_target: f32, impacts: GradeImpacts },
}

/// Incremental ledger search for the staves of one system.
pub struct LedgersBuilder<'a, I: ImageView> {
    image: &'a I,
    scale: &'a Scale,
    params: &'a LedgerParams,
    suites: &'a Suites,
    min_abscissa_overlap: i32,
}

impl<'a, I: ImageView> LedgersBuilder<'a, I> {
    pub fn new(image: &'a I, scale: &'a Scale, params: &'a LedgerParams, suites: &'a Suites) -> Self {
        Self {
            image,
            scale,
            params,
            suites,
            min_abscissa_overlap: scale.to_pixels(params.min_abscissa_overlap),
        }
    }

    /// Search every staff of `system`, above then below, and refresh the
    /// rendered ledger lines. Staff geometry is validated first so that a
    /// malformed staff fails the system before any ledger is registered.
    pub fn build_ledgers(
        &self,
        system: &mut SystemInfo,
        pool: &CandidatePool,
    ) -> Result<Vec<LineReport>, LedgerError> {
        for staff in &system.staves {
            staff.validate()?;
            self.suites.suite(staff.interline, false)?;
        }
        let mut reports = Vec::new();
        for staff_idx in 0..system.staves.len() {
            debug!("LedgersBuilder::build_ledgers staff#{}", system.staves[staff_idx].id);
            reports.extend(self.search_side(system, staff_idx, -1, pool)?);
            reports.extend(self.search_side(system, staff_idx, 1, pool)?);
        }
        let SystemInfo { staves, sig, .. } = system;
        for staff in staves.iter_mut() {
            staff.refresh_ledger_lines(sig);
        }
        Ok(reports)
    }

    /// Walk one side of a staff outward starting at index `from`, stopping
    /// at the first line without any accepted ledger.
    ///
    /// In a grand staff the upper staff stops below at +1 and the lower
    /// staff does not search above.
    pub fn search_side(
        &self,
        system: &mut SystemInfo,
        staff_idx: usize,
        from: i32,
        pool: &CandidatePool,
    ) -> Result<Vec<LineReport>, LedgerError> {
        let staff = system
            .staves
            .get(staff_idx)
            .ok_or(LedgerError::UnknownStaff {
                staff: staff_idx as u32,
            })?;
        let sign = from.signum();
        if sign == 0 {
            return Ok(Vec::new());
        }
        let limit = match (staff.grand_staff, sign) {
            (Some(GrandStaffRole::Lower), -1) => 0,
            (Some(GrandStaffRole::Upper), 1) => 1,
            _ => i32::MAX,
        };

        let mut reports = Vec::new();
        let mut index = from;
        while index.abs() <= limit {
            let report = self.lookup_line(system, staff_idx, index, pool)?;
            let accepted = report.accepted;
            reports.push(report);
            if accepted == 0 {
                break;
            }
            index += sign;
        }
        Ok(reports)
    }

    /// Look for ledgers on one virtual line of a staff, register the
    /// survivors in the staff ledger map and return the line statistics.
    pub fn lookup_line(
        &self,
        system: &mut SystemInfo,
        staff_idx: usize,
        index: i32,
        pool: &CandidatePool,
    ) -> Result<LineReport, LedgerError> {
        let SystemInfo { staves, sig, .. } = system;
        let staff = staves.get(staff_idx).ok_or(LedgerError::UnknownStaff {
            staff: staff_idx as u32,
        })?;
        let interline = staff.interline;
        let specific = self.scale.specific(interline);
        let y_margin = specific.to_pixels(self.params.ledger_margin_y);
        let min_wide = specific.to_pixels(self.params.min_wide_ledger_length);
        let virtual_box = staff
            .side_line(index)?
            .bounds()
            .translate(0, index * interline)
            .grow(0, 2 * y_margin);
        debug!(
            "LedgersBuilder::lookup_line staff#{} index={} box={:?}",
            staff.id, index, virtual_box
        );

        let mut report = LineReport::new(staff.id, index);
        let mut ledgers: Vec<InterId> = Vec::new();
        for stick in pool.available() {
            if !virtual_box.contains(stick.middle()) {
                continue;
            }
            report.candidates += 1;
            if stick.vip {
                info!("LedgersBuilder::lookup_line VIP {:?} at {}", stick.id, index);
            }

            let Some(reference) = self.y_reference(staff, sig, index, stick)? else {
                report.orphans += 1;
                if stick.vip {
                    info!("LedgersBuilder::lookup_line VIP {:?} orphan", stick.id);
                } else {
                    trace!("LedgersBuilder::lookup_line {:?} orphan", stick.id);
                }
                continue;
            };
            let wide = reference
                .ledger
                .and_then(|id| sig.ledger(id))
                .is_some_and(|l| l.width() >= min_wide);
            let suite = self.suites.suite(interline, wide)?;
            let y_target = reference.y + index.signum() as f32 * interline as f32;
            let context = StickContext::new(stick, self.image, y_target, interline, self.scale);
            let impacts = match suite.evaluate(&context) {
                Ok(impacts) => impacts,
                Err(rejection) => {
                    report.rejected += 1;
                    trace!("LedgersBuilder::lookup_line {:?} {}", stick.id, rejection);
                    continue;
                }
            };
            if stick.vip {
                info!(
                    "LedgersBuilder::lookup_line VIP staff#{} at {} {}",
                    staff.id, index, impacts
                );
            }
            if !suite.accepts(&impacts) {
                report.weak += 1;
                continue;
            }
            let id = sig.add_vertex(Inter::Ledger(LedgerInter::new(stick, index, impacts)));
            ledgers.push(id);
        }
        if !ledgers.is_empty() {
            let deleted = reduce_ledgers(sig, &mut ledgers);
            report.deleted = deleted.len();
            if !deleted.is_empty() {
                debug!(
                    "LedgersBuilder::lookup_line staff#{} index={} deletions={}",
                    staff.id,
                    index,
                    deleted.len()
                );
            }
        }

        let staff_id = staff.id;
        let staff = &mut staves[staff_idx];
        for &id in &ledgers {
            staff.add_ledger(index, id);
            if let Some(ledger) = sig.ledger_mut(id) {
                ledger.staff = Some(staff_id);
                if ledger.vip {
                    info!(
                        "LedgersBuilder::lookup_line VIP {:?} in staff#{} at {} {}",
                        id, staff_id, index, ledger.impacts
                    );
                }
            }
        }
        report.accepted = ledgers.len();
        debug!(
            "LedgersBuilder::lookup_line staff#{} index={} accepted={}",
            staff_id, index, report.accepted
        );
        Ok(report)
    }

    /// Ordinate from which the target line of `stick` is derived.
    ///
    /// Next to the staff this is the staff line under the stick middle.
    /// Further out it is the center line of the first accepted ledger of the
    /// previous line overlapping the stick by more than the minimum abscissa
    /// overlap, extended past its ends when needed. `None` marks an orphan.
    pub fn y_reference(
        &self,
        staff: &Staff,
        sig: &SIGraph,
        index: i32,
        stick: &StraightFilament,
    ) -> Result<Option<YReference>, LedgerError> {
        let x_mid = stick.middle()[0];
        let prev = index - index.signum();
        if prev == 0 {
            let line = staff.side_line(index)?;
            return Ok(Some(YReference {
                y: line.y_at(x_mid),
                ledger: None,
            }));
        }
        let found = staff.ledgers(prev).iter().find_map(|&id| {
            let ledger = sig.ledger(id)?;
            (ledger.bounds.x_overlap(&stick.bounds) > self.min_abscissa_overlap).then_some(
                YReference {
                    y: ledger.y_at(x_mid),
                    ledger: Some(id),
                },
            )
        });
        Ok(found)
    }

    /// Grade `stick` as a ledger of `staff` at `index`, without registering
    /// anything.
    pub fn evaluate(
        &self,
        staff: &Staff,
        sig: &SIGraph,
        index: i32,
        stick: &StraightFilament,
    ) -> Result<StickVerdict, LedgerError> {
        if index == 0 {
            return Ok(StickVerdict::InsideStaff);
        }
        let Some(reference) = self.y_reference(staff, sig, index, stick)? else {
            return Ok(StickVerdict::Orphan);
        };
        let min_wide = self
            .scale
            .specific(staff.interline)
            .to_pixels(self.params.min_wide_ledger_length);
        let wide = reference
            .ledger
            .and_then(|id| sig.ledger(id))
            .is_some_and(|l| l.width() >= min_wide);
        let suite = self.suites.suite(staff.interline, wide)?;
        let y_target = reference.y + index.signum() as f32 * staff.interline as f32;
        let context = StickContext::new(stick, self.image, y_target, staff.interline, self.scale);
        Ok(match suite.evaluate(&context) {
            Ok(impacts) => StickVerdict::Graded { y_target, impacts },
            Err(rejection) => StickVerdict::Rejected(rejection),
        })
    }
}

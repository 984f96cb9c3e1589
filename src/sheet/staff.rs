use crate::sig::{InterId, SIGraph};
use crate::types::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest coordinate magnitude, in pixels, accepted in staff geometry.
pub const MAX_COORDINATE: f32 = 1.0e7;

/// Malformed staff geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    InvalidInterline { staff: u32, interline: i32 },
    MissingLines { staff: u32 },
    EmptyLine { staff: u32, line: usize },
    /// A point is not finite or lies beyond [`MAX_COORDINATE`].
    OutOfRange { staff: u32, line: usize },
    InvertedLines { staff: u32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidInterline { staff, interline } => {
                write!(f, "staff#{staff} has invalid interline {interline}")
            }
            GeometryError::MissingLines { staff } => write!(f, "staff#{staff} has no lines"),
            GeometryError::EmptyLine { staff, line } => {
                write!(f, "staff#{staff} line {line} has no points")
            }
            GeometryError::OutOfRange { staff, line } => {
                write!(f, "staff#{staff} line {line} has a coordinate out of range")
            }
            GeometryError::InvertedLines { staff } => {
                write!(f, "staff#{staff} first line lies below its last line")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// One staff line as a polyline sorted by abscissa.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaffLine {
    pub points: Vec<[f32; 2]>,
}

impl StaffLine {
    pub fn new(mut points: Vec<[f32; 2]>) -> Self {
        points.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));
        Self { points }
    }

    /// Straight horizontal line from `left` to `right` at ordinate `y`.
    pub fn horizontal(left: f32, right: f32, y: f32) -> Self {
        Self::new(vec![[left, y], [right, y]])
    }

    pub fn left(&self) -> f32 {
        self.points.first().map_or(0.0, |p| p[0])
    }

    pub fn right(&self) -> f32 {
        self.points.last().map_or(0.0, |p| p[0])
    }

    /// Ordinate at `x`, linearly interpolated, extended by the end segments.
    pub fn y_at(&self, x: f32) -> f32 {
        match self.points.len() {
            0 => 0.0,
            1 => self.points[0][1],
            n => {
                let seg = self
                    .points
                    .windows(2)
                    .position(|w| x <= w[1][0])
                    .unwrap_or(n - 2);
                let (a, b) = (self.points[seg], self.points[seg + 1]);
                let dx = b[0] - a[0];
                if dx.abs() < f32::EPSILON {
                    a[1]
                } else {
                    a[1] + (x - a[0]) * (b[1] - a[1]) / dx
                }
            }
        }
    }

    /// Pixel box of the line, at least one pixel high.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::default();
        }
        let (mut y0, mut y1) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in &self.points {
            y0 = y0.min(p[1]);
            y1 = y1.max(p[1]);
        }
        // Float to int casts saturate, the differences must too.
        let x = self.left().floor() as i32;
        let y = y0.round() as i32;
        let right = self.right().ceil() as i32;
        let bottom = y1.round() as i32;
        Rect::new(
            x,
            y,
            right.saturating_sub(x).saturating_add(1),
            bottom.saturating_sub(y).saturating_add(1),
        )
    }

    fn in_range(&self) -> bool {
        self.points
            .iter()
            .flatten()
            .all(|v| v.is_finite() && v.abs() <= MAX_COORDINATE)
    }
}

/// Role of a staff inside a merged grand staff (piano-like part).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrandStaffRole {
    Upper,
    Lower,
}

/// Rendered ledger segment, recomputed from the final ledger map.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    pub index: i32,
    pub inter: InterId,
    pub start: [f32; 2],
    pub stop: [f32; 2],
}

/// A music staff with its accepted ledgers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: u32,
    /// Staff-specific interline in pixels.
    pub interline: i32,
    /// Lines from top to bottom.
    pub lines: Vec<StaffLine>,
    #[serde(default)]
    pub grand_staff: Option<GrandStaffRole>,
    #[serde(skip)]
    ledger_map: BTreeMap<i32, Vec<InterId>>,
    #[serde(skip_deserializing)]
    ledger_lines: Vec<LedgerLine>,
}

impl Staff {
    pub fn new(id: u32, interline: i32, lines: Vec<StaffLine>) -> Self {
        Self {
            id,
            interline,
            lines,
            grand_staff: None,
            ledger_map: BTreeMap::new(),
            ledger_lines: Vec::new(),
        }
    }

    /// Regular staff of `count` horizontal lines, top line at `top`.
    pub fn regular(id: u32, interline: i32, left: f32, right: f32, top: f32, count: usize) -> Self {
        let lines = (0..count)
            .map(|i| StaffLine::horizontal(left, right, top + (i as i32 * interline) as f32))
            .collect();
        Self::new(id, interline, lines)
    }

    pub fn with_grand_staff(mut self, role: GrandStaffRole) -> Self {
        self.grand_staff = Some(role);
        self
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.interline <= 0 {
            return Err(GeometryError::InvalidInterline {
                staff: self.id,
                interline: self.interline,
            });
        }
        if self.lines.is_empty() {
            return Err(GeometryError::MissingLines { staff: self.id });
        }
        if let Some(line) = self.lines.iter().position(|l| l.points.is_empty()) {
            return Err(GeometryError::EmptyLine {
                staff: self.id,
                line,
            });
        }
        if let Some(line) = self.lines.iter().position(|l| !l.in_range()) {
            return Err(GeometryError::OutOfRange {
                staff: self.id,
                line,
            });
        }
        let (first, last) = (self.first_line()?, self.last_line()?);
        let x = 0.5 * (first.left() + first.right());
        if first.y_at(x) > last.y_at(x) {
            return Err(GeometryError::InvertedLines { staff: self.id });
        }
        Ok(())
    }

    pub fn first_line(&self) -> Result<&StaffLine, GeometryError> {
        self.lines
            .first()
            .ok_or(GeometryError::MissingLines { staff: self.id })
    }

    pub fn last_line(&self) -> Result<&StaffLine, GeometryError> {
        self.lines
            .last()
            .ok_or(GeometryError::MissingLines { staff: self.id })
    }

    /// Reference line for ledgers on the side of `index`.
    pub fn side_line(&self, index: i32) -> Result<&StaffLine, GeometryError> {
        if index < 0 {
            self.first_line()
        } else {
            self.last_line()
        }
    }

    pub fn left(&self) -> f32 {
        self.lines
            .iter()
            .map(StaffLine::left)
            .fold(f32::INFINITY, f32::min)
    }

    pub fn right(&self) -> f32 {
        self.lines
            .iter()
            .map(StaffLine::right)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Algebraic vertical distance: negative within the staff height,
    /// positive outside.
    pub fn distance_to(&self, point: [f32; 2]) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => {
                let top = first.y_at(point[0]);
                let bottom = last.y_at(point[0]);
                (top - point[1]).max(point[1] - bottom)
            }
            _ => f32::INFINITY,
        }
    }

    /// Pitch position: 0 on the middle line, +/-4 on the outer lines of a
    /// five-line staff, positive downward.
    pub fn pitch_position_of(&self, point: [f32; 2]) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) if self.lines.len() > 1 => {
                let top = first.y_at(point[0]);
                let bottom = last.y_at(point[0]);
                let n = (self.lines.len() - 1) as f32;
                n * (2.0 * point[1] - bottom - top) / (bottom - top)
            }
            _ => 0.0,
        }
    }

    /// Ledger line index for a pitch position (0 inside the staff). Halves
    /// are rounded to even, so pitch 7 maps to index 2.
    pub fn ledger_line_index(pitch_position: f32) -> i32 {
        let steps = (pitch_position.abs() / 2.0).round_ties_even() as i32 - 2;
        if steps <= 0 {
            0
        } else if pitch_position > 0.0 {
            steps
        } else {
            -steps
        }
    }

    /// Line index at which a loose stick is graded. The pitch is rounded
    /// first and the halving truncates, so pitch 7 maps to index 1: a stick
    /// between two virtual lines is graded on the inner one.
    pub fn stick_line_index(pitch_position: f32) -> i32 {
        let pitch = pitch_position.round_ties_even() as i32;
        if pitch.abs() <= 4 {
            0
        } else {
            pitch / 2 - 2 * pitch.signum()
        }
    }

    /// Pitch position of a ledger line index.
    pub fn ledger_pitch_position(index: i32) -> i32 {
        if index > 0 {
            4 + 2 * index
        } else {
            -4 + 2 * index
        }
    }

    pub fn add_ledger(&mut self, index: i32, inter: InterId) {
        self.ledger_map.entry(index).or_default().push(inter);
    }

    pub fn ledgers(&self, index: i32) -> &[InterId] {
        self.ledger_map.get(&index).map_or(&[], Vec::as_slice)
    }

    pub fn ledger_map(&self) -> &BTreeMap<i32, Vec<InterId>> {
        &self.ledger_map
    }

    pub fn ledger_count(&self) -> usize {
        self.ledger_map.values().map(Vec::len).sum()
    }

    /// Remove every ledger on the side of `from` whose index magnitude is at
    /// least `|from|`, returning them outward.
    pub fn take_ledgers_from(&mut self, from: i32) -> Vec<(i32, InterId)> {
        let sign = from.signum();
        let keys: Vec<i32> = self
            .ledger_map
            .keys()
            .copied()
            .filter(|k| k.signum() == sign && k.abs() >= from.abs())
            .collect();
        let mut taken = Vec::new();
        let mut ordered = keys;
        ordered.sort_by_key(|k| k.abs());
        for key in ordered {
            if let Some(ids) = self.ledger_map.remove(&key) {
                taken.extend(ids.into_iter().map(|id| (key, id)));
            }
        }
        taken
    }

    pub fn clear_ledgers(&mut self) -> Vec<InterId> {
        let ids = self.ledger_map.values().flatten().copied().collect();
        self.ledger_map.clear();
        self.ledger_lines.clear();
        ids
    }

    pub fn ledger_lines(&self) -> &[LedgerLine] {
        &self.ledger_lines
    }

    /// Recompute rendered ledger segments from the ledger map.
    pub fn refresh_ledger_lines(&mut self, sig: &SIGraph) {
        self.ledger_lines = self
            .ledger_map
            .iter()
            .flat_map(|(index, ids)| {
                ids.iter().filter_map(move |id| {
                    sig.ledger(*id).map(|l| LedgerLine {
                        index: *index,
                        inter: *id,
                        start: l.start,
                        stop: l.stop,
                    })
                })
            })
            .collect();
    }

    /// Closest ledger lying between `point` and the staff, on the side of
    /// `point`, whose abscissa range (widened by one interline) contains it.
    pub fn closest_ledger(&self, point: [f32; 2], sig: &SIGraph) -> Option<(i32, InterId)> {
        let pitch = self.pitch_position_of(point);
        if pitch.abs() <= 4.0 {
            return None;
        }
        let max_index = Self::ledger_line_index(pitch);
        let margin = self.interline;
        let mut best: Option<((i32, InterId), f32)> = None;
        for (index, ids) in &self.ledger_map {
            if index.signum() != max_index.signum() || index.abs() > max_index.abs() + 1 {
                continue;
            }
            for id in ids {
                let Some(ledger) = sig.ledger(*id) else {
                    continue;
                };
                if !ledger.bounds.grow(margin, 0).x_embraces(point[0]) {
                    continue;
                }
                let c = ledger.center();
                let d = (c[0] - point[0]).hypot(c[1] - point[1]);
                if best.as_ref().map_or(true, |(_, bd)| d < *bd) {
                    best = Some(((*index, *id), d));
                }
            }
        }
        best.map(|(found, _)| found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::GradeImpacts;
    use crate::runs::{Section, SectionId};
    use crate::sig::{Inter, LedgerInter};
    use crate::sticks::{StickId, StraightFilament};

    /// Register a 41 px, 3 px thick ledger centred on ordinate `y`.
    fn ledger(staff: &mut Staff, sig: &mut SIGraph, id: u32, x: i32, y: i32, index: i32) -> InterId {
        let section = Section {
            id: SectionId(id),
            bounds: Rect::new(x, y - 1, 41, 3),
            vip: false,
        };
        let stick = StraightFilament::from_sections(StickId(id), &[&section]).expect("stick");
        let impacts = GradeImpacts {
            suite: "Ledger",
            impacts: Vec::new(),
            grade: 0.8,
        };
        let inter = sig.add_vertex(Inter::Ledger(LedgerInter::new(&stick, index, impacts)));
        staff.add_ledger(index, inter);
        inter
    }

    #[test]
    fn distance_is_negative_inside_staff() {
        let staff = Staff::regular(1, 20, 0.0, 500.0, 100.0, 5);
        assert!(staff.distance_to([50.0, 140.0]) < 0.0);
        assert!((staff.distance_to([50.0, 80.0]) - 20.0).abs() < 1e-5);
        assert!((staff.distance_to([50.0, 190.0]) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_and_ledger_indices_agree() {
        let staff = Staff::regular(1, 20, 0.0, 500.0, 100.0, 5);
        assert!((staff.pitch_position_of([10.0, 140.0])).abs() < 1e-5);
        assert!((staff.pitch_position_of([10.0, 100.0]) + 4.0).abs() < 1e-5);
        // One interline above the top line.
        let pitch = staff.pitch_position_of([10.0, 80.0]);
        assert_eq!(Staff::ledger_line_index(pitch), -1);
        assert_eq!(Staff::ledger_line_index(9.0), 2);
        assert_eq!(Staff::ledger_line_index(5.0), 0);
        assert_eq!(Staff::ledger_line_index(-2.0), 0);
        assert_eq!(Staff::ledger_pitch_position(-1), -6);
        assert_eq!(Staff::ledger_pitch_position(2), 8);
    }

    #[test]
    fn polyline_interpolates_and_extrapolates() {
        let line = StaffLine::new(vec![[100.0, 10.0], [0.0, 0.0], [200.0, 10.0]]);
        assert!((line.y_at(50.0) - 5.0).abs() < 1e-5);
        assert!((line.y_at(150.0) - 10.0).abs() < 1e-5);
        assert!((line.y_at(-50.0) + 5.0).abs() < 1e-5);
        assert_eq!(line.bounds(), Rect::new(0, 0, 201, 11));
    }

    #[test]
    fn take_ledgers_from_only_touches_one_side() {
        let mut staff = Staff::regular(1, 20, 0.0, 500.0, 100.0, 5);
        staff.add_ledger(-1, InterId(0));
        staff.add_ledger(-2, InterId(1));
        staff.add_ledger(-3, InterId(2));
        staff.add_ledger(1, InterId(3));
        let taken = staff.take_ledgers_from(-2);
        assert_eq!(taken, vec![(-2, InterId(1)), (-3, InterId(2))]);
        assert_eq!(staff.ledgers(-1), &[InterId(0)]);
        assert_eq!(staff.ledgers(1), &[InterId(3)]);
        assert!(staff.ledgers(-3).is_empty());
    }

    #[test]
    fn validate_rejects_bad_geometry() {
        let staff = Staff::regular(7, 0, 0.0, 100.0, 10.0, 5);
        assert_eq!(
            staff.validate(),
            Err(GeometryError::InvalidInterline {
                staff: 7,
                interline: 0
            })
        );
        let staff = Staff::new(8, 20, vec![StaffLine::new(Vec::new())]);
        assert_eq!(
            staff.validate(),
            Err(GeometryError::EmptyLine { staff: 8, line: 0 })
        );
        let staff = Staff::regular(9, 20, -3.0e9, 3.0e9, 400.0, 5);
        assert_eq!(
            staff.validate(),
            Err(GeometryError::OutOfRange { staff: 9, line: 0 })
        );
        let mut staff = Staff::regular(10, 20, 0.0, 100.0, 10.0, 5);
        staff.lines[3].points[1][1] = f32::NAN;
        assert_eq!(
            staff.validate(),
            Err(GeometryError::OutOfRange { staff: 10, line: 3 })
        );
    }

    #[test]
    fn bounds_of_a_huge_line_saturate() {
        let line = StaffLine::horizontal(-3.0e9, 3.0e9, 400.0);
        let bounds = line.bounds();
        assert_eq!(bounds.x, i32::MIN);
        assert_eq!(bounds.w, i32::MAX);
        assert_eq!(bounds.h, 1);
    }

    #[test]
    fn stick_index_truncates_while_ledger_index_rounds() {
        assert_eq!(Staff::stick_line_index(7.0), 1);
        assert_eq!(Staff::stick_line_index(-7.0), -1);
        assert_eq!(Staff::ledger_line_index(7.0), 2);
        assert_eq!(Staff::ledger_line_index(-7.0), -2);
        assert_eq!(Staff::stick_line_index(-8.2), -2);
        assert_eq!(Staff::stick_line_index(4.4), 0);
        assert_eq!(Staff::stick_line_index(-1.0), 0);
    }

    #[test]
    fn closest_ledger_stays_on_the_point_side_and_near_its_line() {
        let mut staff = Staff::regular(1, 20, 0.0, 500.0, 100.0, 5);
        let mut sig = SIGraph::new();
        ledger(&mut staff, &mut sig, 0, 300, 80, -1);
        ledger(&mut staff, &mut sig, 1, 300, 60, -2);
        let far = ledger(&mut staff, &mut sig, 2, 100, 40, -3);
        let below = ledger(&mut staff, &mut sig, 3, 100, 200, 1);

        // Inside the staff.
        assert_eq!(staff.closest_ledger([120.0, 140.0], &sig), None);
        // Index -3 lies two lines beyond the -1 position of the point.
        assert_eq!(staff.closest_ledger([120.0, 75.0], &sig), None);
        // From a -2 position, index -3 is one line further and allowed.
        assert_eq!(staff.closest_ledger([120.0, 55.0], &sig), Some((-3, far)));
        // Abscissa range widened by one interline on each side.
        assert_eq!(staff.closest_ledger([81.0, 55.0], &sig), Some((-3, far)));
        assert_eq!(staff.closest_ledger([160.0, 55.0], &sig), Some((-3, far)));
        assert_eq!(staff.closest_ledger([79.0, 55.0], &sig), None);
        // Below the staff, the ledgers above are never considered.
        assert_eq!(staff.closest_ledger([120.0, 215.0], &sig), Some((1, below)));
        assert_eq!(staff.closest_ledger([320.0, 215.0], &sig), None);
        assert_eq!(staff.closest_ledger([320.0, 65.0], &sig).map(|(i, _)| i), Some(-2));
    }
}

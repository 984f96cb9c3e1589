use super::staff::Staff;
use crate::sig::{BeamInter, Inter, InterId, SIGraph};

/// One system: a horizontal band of staves sharing an interpretation graph.
#[derive(Clone, Debug)]
pub struct SystemInfo {
    pub id: u32,
    /// Horizontal span `[left, right]` in pixels.
    pub left: i32,
    pub right: i32,
    pub staves: Vec<Staff>,
    pub sig: SIGraph,
}

impl SystemInfo {
    pub fn new(id: u32, left: i32, right: i32, staves: Vec<Staff>) -> Self {
        Self {
            id,
            left,
            right,
            staves,
            sig: SIGraph::new(),
        }
    }

    pub fn add_beam(&mut self, beam: BeamInter) -> InterId {
        self.sig.add_vertex(Inter::Beam(beam))
    }

    pub fn contains_abscissa(&self, x: f32) -> bool {
        x >= self.left as f32 && x <= self.right as f32
    }

    /// Ordinate range from the first line of the first staff to the last
    /// line of the last staff, widened by `margin` pixels.
    pub fn vertical_range(&self, margin: f32) -> Option<(f32, f32)> {
        let x = 0.5 * (self.left + self.right) as f32;
        let mut top = f32::INFINITY;
        let mut bottom = f32::NEG_INFINITY;
        for staff in &self.staves {
            if let (Some(first), Some(last)) = (staff.lines.first(), staff.lines.last()) {
                top = top.min(first.y_at(x));
                bottom = bottom.max(last.y_at(x));
            }
        }
        (top <= bottom).then_some((top - margin, bottom + margin))
    }

    pub fn max_interline(&self) -> i32 {
        self.staves.iter().map(|s| s.interline).max().unwrap_or(0)
    }

    /// Good beams and hooks, sorted by left abscissa.
    pub fn good_beams(&self) -> Vec<&BeamInter> {
        let mut beams: Vec<&BeamInter> = self
            .sig
            .inters(|i| matches!(i, Inter::Beam(b) if b.is_good()))
            .into_iter()
            .filter_map(|id| self.sig.inter(id).and_then(Inter::as_beam))
            .collect();
        beams.sort_by_key(|b| b.bounds().x);
        beams
    }

    pub fn staff_index(&self, staff_id: u32) -> Option<usize> {
        self.staves.iter().position(|s| s.id == staff_id)
    }

    /// Remove every ledger from staves and graph.
    pub fn clear_ledgers(&mut self) {
        for staff in &mut self.staves {
            for id in staff.clear_ledgers() {
                self.sig.remove(id);
            }
        }
        for id in self.sig.inters(|i| matches!(i, Inter::Ledger(_))) {
            self.sig.remove(id);
        }
    }
}

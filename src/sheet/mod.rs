//! Staff, system and scale model consumed by the ledger pipeline.
//!
//! The model is produced upstream (staff detection, beam detection); this
//! module only exposes the geometry the pipeline queries and the per-staff
//! ledger map the pipeline fills. [`SheetModel`] is its serializable form,
//! used by the demo tool to load staves and beams from JSON.

mod scale;
mod staff;
mod system;

pub use scale::{InterlineScale, Scale};
pub use staff::{GeometryError, GrandStaffRole, LedgerLine, Staff, StaffLine};
pub use system::SystemInfo;

use crate::sig::BeamInter;
use serde::Deserialize;
use std::collections::BTreeSet;

/// A processed page: scale and systems.
#[derive(Clone, Debug)]
pub struct Sheet {
    pub scale: Scale,
    pub systems: Vec<SystemInfo>,
}

impl Sheet {
    pub fn new(scale: Scale, systems: Vec<SystemInfo>) -> Self {
        Self { scale, systems }
    }

    pub fn staves(&self) -> impl Iterator<Item = &Staff> {
        self.systems.iter().flat_map(|s| s.staves.iter())
    }

    /// Distinct staff-specific interline values present in the sheet.
    pub fn distinct_interlines(&self) -> BTreeSet<i32> {
        self.staves().map(|s| s.interline).collect()
    }

    /// Staff closest to `point` by algebraic vertical distance.
    pub fn closest_staff(&self, point: [f32; 2]) -> Option<&Staff> {
        self.staves()
            .filter(|s| !s.lines.is_empty())
            .min_by(|a, b| {
                a.distance_to(point)
                    .partial_cmp(&b.distance_to(point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Locate a staff as `(system index, staff index)`.
    pub fn locate_staff(&self, staff_id: u32) -> Option<(usize, usize)> {
        self.systems
            .iter()
            .enumerate()
            .find_map(|(si, sys)| sys.staff_index(staff_id).map(|i| (si, i)))
    }

    pub fn ledger_count(&self) -> usize {
        self.staves().map(Staff::ledger_count).sum()
    }
}

/// JSON description of a sheet.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetModel {
    pub scale: Scale,
    pub systems: Vec<SystemModel>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModel {
    pub id: u32,
    pub left: i32,
    pub right: i32,
    pub staves: Vec<Staff>,
    #[serde(default)]
    pub beams: Vec<BeamInter>,
}

impl SheetModel {
    pub fn into_sheet(self) -> Sheet {
        let systems = self
            .systems
            .into_iter()
            .map(|model| {
                let mut staves = model.staves;
                for line in staves.iter_mut().flat_map(|s| s.lines.iter_mut()) {
                    *line = StaffLine::new(std::mem::take(&mut line.points));
                }
                let mut system = SystemInfo::new(model.id, model.left, model.right, staves);
                for beam in model.beams {
                    system.add_beam(beam);
                }
                system
            })
            .collect();
        Sheet::new(self.scale, systems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_model_parses_from_json() {
        let json = r#"{
            "scale": { "interline": 20, "lineThickness": 2.0 },
            "systems": [{
                "id": 1, "left": 0, "right": 800,
                "staves": [{ "id": 1, "interline": 20,
                    "lines": [{ "points": [[800, 100], [0, 100]] }, { "points": [[0, 180], [800, 180]] }],
                    "grandStaff": "upper" }],
                "beams": [{ "area": { "points": [[10, 10], [50, 10], [50, 16], [10, 16]] }, "grade": 0.8 }]
            }]
        }"#;
        let model: SheetModel = serde_json::from_str(json).expect("valid model");
        let sheet = model.into_sheet();
        assert_eq!(sheet.systems.len(), 1);
        let staff = &sheet.systems[0].staves[0];
        assert_eq!(staff.grand_staff, Some(GrandStaffRole::Upper));
        assert_eq!(staff.lines[0].points[0], [0.0, 100.0]);
        assert_eq!(sheet.systems[0].good_beams().len(), 1);
        assert_eq!(sheet.distinct_interlines().into_iter().collect::<Vec<_>>(), vec![20]);
    }
}
